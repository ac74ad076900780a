//! 会话存储
//!
//! 每个聊天一把 `tokio::sync::Mutex`，处理一个事件期间一直持有，
//! 所以同一会话内的事件按到达顺序串行执行，不同会话互不阻塞

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::infrastructure::ChatKey;
use crate::models::Session;

#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<ChatKey, Arc<Mutex<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得会话句柄，首次接触时创建
    pub fn session(&self, chat: ChatKey) -> Arc<Mutex<Session>> {
        self.sessions.entry(chat).or_default().clone()
    }

    /// 会话当前内容的副本
    pub async fn snapshot(&self, chat: ChatKey) -> Session {
        let handle = self.session(chat);
        let session = handle.lock().await;
        session.clone()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
