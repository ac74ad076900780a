//! 存活检查 HTTP 服务
//!
//! 与机器人是否就绪无关，只要进程在就返回固定文本

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tracing::info;

pub const HEALTH_BODY: &str = "Bot is running!";

async fn health() -> &'static str {
    HEALTH_BODY
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
}

/// 在 `0.0.0.0:port` 上提供存活检查
pub async fn serve(port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("无法监听 {addr}"))?;
    info!("🌐 HTTP 服务已启动，端口 {}", port);

    axum::serve(listener, router())
        .await
        .context("HTTP 服务异常退出")
}
