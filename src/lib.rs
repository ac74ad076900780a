//! # Org Admin Bot
//!
//! 教育机构管理员的 Telegram 对话机器人：组织登录、学习材料与测试的
//! 单槽文件目录，以及基于材料的 AI 出题
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（连接池、Bot），只暴露能力
//! - `OrgFileRepository` - 组织与文件存取（`PgRepository` / `InMemoryRepository`）
//! - `ConversationChannel` - 收发消息、下载文件（`TelegramChannel`）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心对话顺序
//! - `FileCatalog` - 每组织每类一个文件的配额
//! - `TestGenerationPipeline` - 材料 → 测试文件
//! - `LlmService` - LLM 出题能力
//! - `TextDecoder` - UTF-8 / Windows-1251 / Latin-1 解码
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次对话"如何推进
//! - `route` - 纯函数状态转移表
//! - `ConversationFlow` - 执行动作、转换错误
//! - `SessionStore` - 每个聊天一把锁
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 初始化、长轮询
//! - `orchestrator/health` - 存活检查 HTTP 服务
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ConversationChannel, InboundEvent, OrgFileRepository};
pub use models::{DialogState, Session};
pub use orchestrator::App;
pub use services::QuestionGenerator;
pub use workflow::ConversationFlow;
