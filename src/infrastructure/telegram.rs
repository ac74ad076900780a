//! Telegram 通道 - 基础设施层
//!
//! 唯一持有 `Bot` 的模块，把 teloxide 的类型转换成 `InboundEvent`，
//! 把 `Keyboard` / `OutboundDocument` 转换成 Bot API 请求

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile,
    KeyboardButton, KeyboardMarkup, KeyboardRemove, MessageId, ReplyMarkup,
};
use tracing::debug;

use crate::error::ChannelError;
use crate::infrastructure::channel::{
    ChatKey, ConversationChannel, InboundEvent, Keyboard, OutboundDocument,
};
use crate::models::BlobRef;

/// Telegram 通道
#[derive(Clone)]
pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    pub fn new(token: &str) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }

    /// 获取底层 Bot（用于启动轮询）
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

/// 把普通消息转换为入站事件
///
/// 不支持的消息类型（贴纸、位置等）返回 `None`
pub fn message_to_event(msg: &Message) -> Option<(ChatKey, InboundEvent)> {
    let chat = msg.chat.id.0;

    if let Some(text) = msg.text() {
        if is_start_command(text) {
            return Some((chat, InboundEvent::Start));
        }
        return Some((chat, InboundEvent::Text(text.to_string())));
    }

    if let Some(doc) = msg.document() {
        let display_name = doc
            .file_name
            .clone()
            .unwrap_or_else(|| "document".to_string());
        return Some((
            chat,
            InboundEvent::Document {
                blob_ref: BlobRef(doc.file.id.0.clone()),
                display_name,
            },
        ));
    }

    None
}

/// 把回调查询转换为入站事件
pub fn callback_to_event(query: &CallbackQuery) -> Option<(ChatKey, InboundEvent)> {
    let data = query.data.clone()?;
    let (chat, message_id) = match query.message.as_ref() {
        Some(message) => (message.chat().id.0, Some(message.id().0)),
        // 私聊中用户 ID 与聊天 ID 相同
        None => (query.from.id.0 as i64, None),
    };

    Some((
        chat,
        InboundEvent::Callback {
            callback_id: query.id.0.clone(),
            data,
            message_id,
        },
    ))
}

/// `/start`、`/start payload`、`/start@bot_name`
fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    let command = command.split('@').next().unwrap_or_default();
    command == "/start"
}

fn to_reply_markup(keyboard: Keyboard) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::Keep => None,
        Keyboard::Remove => Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
        Keyboard::Reply { rows, one_time } => {
            let buttons: Vec<Vec<KeyboardButton>> = rows
                .into_iter()
                .map(|row| row.into_iter().map(KeyboardButton::new).collect())
                .collect();
            let mut markup = KeyboardMarkup::new(buttons).resize_keyboard();
            if one_time {
                markup = markup.one_time_keyboard();
            }
            Some(ReplyMarkup::Keyboard(markup))
        }
        Keyboard::Inline(rows) => {
            let buttons: Vec<Vec<InlineKeyboardButton>> = rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|b| InlineKeyboardButton::callback(b.label, b.data))
                        .collect()
                })
                .collect();
            Some(ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(buttons)))
        }
    }
}

#[async_trait]
impl ConversationChannel for TelegramChannel {
    async fn send_text(
        &self,
        chat: ChatKey,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<(), ChannelError> {
        let mut request = self.bot.send_message(ChatId(chat), text);
        if let Some(markup) = to_reply_markup(keyboard) {
            request = request.reply_markup(markup);
        }
        request.await.map_err(|e| ChannelError::send(chat, e))?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat: ChatKey,
        document: OutboundDocument,
        caption: &str,
    ) -> Result<(), ChannelError> {
        let file = match document {
            OutboundDocument::Stored(blob_ref) => InputFile::file_id(FileId(blob_ref.0)),
            OutboundDocument::Generated { file_name, bytes } => {
                InputFile::memory(bytes).file_name(file_name)
            }
        };
        self.bot
            .send_document(ChatId(chat), file)
            .caption(caption)
            .await
            .map_err(|e| ChannelError::send(chat, e))?;
        Ok(())
    }

    async fn edit_text(
        &self,
        chat: ChatKey,
        message_id: i32,
        text: &str,
    ) -> Result<(), ChannelError> {
        self.bot
            .edit_message_text(ChatId(chat), MessageId(message_id), text)
            .await
            .map_err(|e| ChannelError::send(chat, e))?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), ChannelError> {
        self.bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()))
            .await
            .map_err(|e| ChannelError::send(0, e))?;
        Ok(())
    }

    async fn fetch_blob(&self, blob_ref: &BlobRef) -> Result<Vec<u8>, ChannelError> {
        let file = self
            .bot
            .get_file(FileId(blob_ref.0.clone()))
            .await
            .map_err(|e| ChannelError::download(blob_ref.as_str(), e))?;

        let mut buf = Vec::new();
        self.bot
            .download_file(&file.path, &mut buf)
            .await
            .map_err(|e| ChannelError::download(blob_ref.as_str(), e))?;

        debug!("已下载文件 {} ({} 字节)", blob_ref, buf.len());
        Ok(buf)
    }
}
