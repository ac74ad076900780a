//! 会话通道抽象
//!
//! 核心逻辑只认识这里的类型，不依赖具体聊天平台

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::models::BlobRef;

/// 聊天标识
pub type ChatKey = i64;

/// 入站事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// `/start` 命令
    Start,
    /// 普通文本
    Text(String),
    /// 收到文件
    Document {
        blob_ref: BlobRef,
        display_name: String,
    },
    /// 内联按钮回调
    Callback {
        callback_id: String,
        data: String,
        /// 按钮所在消息，用于原地编辑
        message_id: Option<i32>,
    },
}

/// 内联按钮
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: &'static str,
    pub data: String,
}

/// 出站消息附带的键盘
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// 不改变当前键盘
    Keep,
    /// 移除回复键盘
    Remove,
    /// 回复键盘（按行）
    Reply {
        rows: Vec<Vec<&'static str>>,
        one_time: bool,
    },
    /// 内联键盘（按行）
    Inline(Vec<Vec<InlineButton>>),
}

/// 出站文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundDocument {
    /// 重新发送已存储的文件
    Stored(BlobRef),
    /// 新生成的文件内容
    Generated { file_name: String, bytes: Vec<u8> },
}

/// 会话通道
///
/// 职责：
/// - 发送文本、文档，编辑消息，应答回调
/// - 按句柄下载已上传文件的内容
#[async_trait]
pub trait ConversationChannel: Send + Sync {
    async fn send_text(
        &self,
        chat: ChatKey,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<(), ChannelError>;

    async fn send_document(
        &self,
        chat: ChatKey,
        document: OutboundDocument,
        caption: &str,
    ) -> Result<(), ChannelError>;

    async fn edit_text(
        &self,
        chat: ChatKey,
        message_id: i32,
        text: &str,
    ) -> Result<(), ChannelError>;

    async fn answer_callback(&self, callback_id: &str) -> Result<(), ChannelError>;

    /// 下载文件原始字节
    async fn fetch_blob(&self, blob_ref: &BlobRef) -> Result<Vec<u8>, ChannelError>;
}
