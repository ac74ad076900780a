/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化日志
///
/// `RUST_LOG` 优先；否则本 crate 用 `info`（详细模式下 `debug`），依赖库用 `warn`
pub fn init(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("org_admin_bot={level},warn")));

    // 重复初始化（例如测试中）直接忽略
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息（不输出任何密钥）
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 组织管理机器人");
    if config.uses_memory_store() {
        info!("🗄 存储: 内存（重启后数据丢失）");
    } else {
        info!("🗄 存储: PostgreSQL (最大连接数 {})", config.db_max_connections);
    }
    if config.llm_api_key.trim().is_empty() {
        info!("🤖 AI 出题: 未配置");
    } else {
        info!("🤖 AI 出题: {} @ {}", config.llm_model_name, config.llm_api_base_url);
    }
    info!("🌐 健康检查端口: {}", config.http_port);
    info!("{}", "=".repeat(60));
}

/// 记录程序退出信息
pub fn log_shutdown() {
    info!("\n{}", "─".repeat(60));
    info!("👋 轮询已停止，程序退出");
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
