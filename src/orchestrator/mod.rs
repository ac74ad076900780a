//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 管理应用生命周期，是整个系统的"指挥中心"。
//!
//! ### `app` - 应用生命周期
//! - 初始化（配置校验、数据库、Bot、能力注入）
//! - 长轮询，把每个更新交给 `ConversationFlow`
//!
//! ### `health` - 存活检查
//! - `/` 和 `/health` 返回固定文本
//!
//! ## 层次关系
//!
//! ```text
//! app (Telegram 更新)
//!     ↓
//! workflow::ConversationFlow (单个事件)
//!     ↓
//! services (能力层：catalog / generation / llm / decoder)
//!     ↓
//! infrastructure (基础设施：PgRepository / TelegramChannel)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层创建连接池和 Bot
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度，不做具体业务判断

pub mod app;
pub mod health;

pub use app::App;
