//! 集成测试用的替身：记录所有出站消息的通道、可编排的生成器

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use org_admin_bot::error::{ChannelError, GeneratorError};
use org_admin_bot::infrastructure::{
    ChatKey, ConversationChannel, InMemoryRepository, Keyboard, OutboundDocument,
};
use org_admin_bot::models::{BlobRef, QuestionCount};
use org_admin_bot::{Config, ConversationFlow, QuestionGenerator};

/// 一条出站记录
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text {
        chat: ChatKey,
        text: String,
        keyboard: Keyboard,
    },
    Document {
        chat: ChatKey,
        document: OutboundDocument,
        caption: String,
    },
    Edit {
        chat: ChatKey,
        message_id: i32,
        text: String,
    },
    CallbackAnswer(String),
}

#[derive(Debug)]
struct NotFound(String);

impl std::fmt::Display for NotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "blob {} not found", self.0)
    }
}

impl std::error::Error for NotFound {}

/// 记录型通道
#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<Outbound>>,
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_stored_documents: AtomicBool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个可下载的文件
    pub fn put_blob(&self, blob_ref: &str, bytes: impl Into<Vec<u8>>) {
        self.blobs
            .lock()
            .unwrap()
            .insert(blob_ref.to_string(), bytes.into());
    }

    /// 让重发已存储文件失败
    pub fn fail_stored_documents(&self) {
        self.fail_stored_documents.store(true, Ordering::SeqCst);
    }

    /// 取出并清空已记录的消息
    pub fn take(&self) -> Vec<Outbound> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    /// 取出并只保留文本（含编辑）
    pub fn take_texts(&self) -> Vec<String> {
        self.take()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Text { text, .. } | Outbound::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, outbound: Outbound) {
        self.sent.lock().unwrap().push(outbound);
    }
}

#[async_trait]
impl ConversationChannel for RecordingChannel {
    async fn send_text(
        &self,
        chat: ChatKey,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<(), ChannelError> {
        self.record(Outbound::Text {
            chat,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn send_document(
        &self,
        chat: ChatKey,
        document: OutboundDocument,
        caption: &str,
    ) -> Result<(), ChannelError> {
        if let OutboundDocument::Stored(blob_ref) = &document {
            if self.fail_stored_documents.load(Ordering::SeqCst) {
                return Err(ChannelError::send(chat, NotFound(blob_ref.to_string())));
            }
        }
        self.record(Outbound::Document {
            chat,
            document,
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn edit_text(
        &self,
        chat: ChatKey,
        message_id: i32,
        text: &str,
    ) -> Result<(), ChannelError> {
        self.record(Outbound::Edit {
            chat,
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), ChannelError> {
        self.record(Outbound::CallbackAnswer(callback_id.to_string()));
        Ok(())
    }

    async fn fetch_blob(&self, blob_ref: &BlobRef) -> Result<Vec<u8>, ChannelError> {
        self.blobs
            .lock()
            .unwrap()
            .get(blob_ref.as_str())
            .cloned()
            .ok_or_else(|| {
                ChannelError::download(blob_ref.as_str(), NotFound(blob_ref.to_string()))
            })
    }
}

/// 可编排的生成器
pub struct ScriptedGenerator {
    configured: bool,
    fail: AtomicBool,
    calls: AtomicUsize,
    last_input: Mutex<Option<(String, QuestionCount)>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            configured: true,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            last_input: Mutex::new(None),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_input(&self) -> Option<(String, QuestionCount)> {
        self.last_input.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuestionGenerator for ScriptedGenerator {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate(&self, text: &str, count: QuestionCount) -> Result<String, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = Some((text.to_string(), count));

        if !self.configured {
            return Err(GeneratorError::NotConfigured);
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(GeneratorError::EmptyContent {
                model: "scripted".to_string(),
            });
        }

        let questions: Vec<String> = (1..=count.get())
            .map(|i| {
                format!("{i}. Питання {i}\nA) так\nB) ні\nC) можливо\nD) не знаю\nПравильна відповідь: A")
            })
            .collect();
        Ok(questions.join("\n\n"))
    }
}

/// 测试环境
pub struct Harness {
    pub flow: ConversationFlow,
    pub repo: Arc<InMemoryRepository>,
    pub channel: Arc<RecordingChannel>,
    pub generator: Arc<ScriptedGenerator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_generator(ScriptedGenerator::new())
    }

    pub fn with_generator(generator: ScriptedGenerator) -> Self {
        Self::with_config(generator, &Config::default())
    }

    pub fn with_config(generator: ScriptedGenerator, config: &Config) -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        let channel = Arc::new(RecordingChannel::new());
        let generator = Arc::new(generator);
        let flow = ConversationFlow::new(repo.clone(), generator.clone(), channel.clone(), config);
        Self {
            flow,
            repo,
            channel,
            generator,
        }
    }
}
