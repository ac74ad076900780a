//! 基础设施层（Infrastructure Layer）
//!
//! 持有稀缺资源（数据库连接池、Telegram Bot），只通过 trait 暴露能力：
//! - `OrgFileRepository` - 组织与文件的存取
//! - `ConversationChannel` - 收发消息、下载文件

pub mod channel;
pub mod memory_repository;
pub mod pg_repository;
pub mod repository;
pub mod telegram;

pub use channel::{
    ChatKey, ConversationChannel, InboundEvent, InlineButton, Keyboard, OutboundDocument,
};
pub use memory_repository::InMemoryRepository;
pub use pg_repository::PgRepository;
pub use repository::OrgFileRepository;
pub use telegram::TelegramChannel;
