//! 流程层（Workflow）
//!
//! 定义"一次对话"如何推进：状态、转移表、按钮文本、会话存储

pub mod conversation;
pub mod keyboards;
pub mod messages;
pub mod routing;
pub mod session_store;

pub use conversation::ConversationFlow;
pub use keyboards::MenuCommand;
pub use routing::{route, Action};
pub use session_store::SessionStore;
