//! 应用生命周期 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：校验配置、连接数据库并建表、创建 Bot 和各项能力
//! 2. **启动存活检查**：在轮询之前启动 HTTP 服务
//! 3. **长轮询**：把 Telegram 更新转换成入站事件交给 `ConversationFlow`
//! 4. **资源管理**：持有连接池，退出时关闭
//!
//! 数据库不可达或建表失败是唯一的致命错误，发生在进入事件循环之前

use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::prelude::*;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::telegram::{callback_to_event, message_to_event};
use crate::infrastructure::{InMemoryRepository, OrgFileRepository, PgRepository, TelegramChannel};
use crate::orchestrator::health;
use crate::services::LlmService;
use crate::utils::logging::{log_shutdown, log_startup};
use crate::workflow::ConversationFlow;

/// 应用主结构
pub struct App {
    config: Config,
    channel: TelegramChannel,
    flow: Arc<ConversationFlow>,
    pg: Option<PgRepository>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let (repo, pg) = prepare(&config).await.context("启动失败")?;

        let channel = TelegramChannel::new(&config.bot_token);
        let generator = Arc::new(LlmService::new(&config));
        let flow = Arc::new(ConversationFlow::new(
            repo,
            generator,
            Arc::new(channel.clone()),
            &config,
        ));

        Ok(Self {
            config,
            channel,
            flow,
            pg,
        })
    }

    /// 运行应用：启动存活检查，然后长轮询直到 Ctrl-C
    pub async fn run(self) -> Result<()> {
        let port = self.config.http_port;
        tokio::spawn(async move {
            if let Err(e) = health::serve(port).await {
                error!("❌ HTTP 服务错误: {:#}", e);
            }
        });

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(on_message))
            .branch(Update::filter_callback_query().endpoint(on_callback));

        info!("🤖 机器人开始轮询...");
        Dispatcher::builder(self.channel.bot().clone(), handler)
            .dependencies(dptree::deps![self.flow.clone()])
            .default_handler(|_| async {})
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        if let Some(pg) = &self.pg {
            pg.close().await;
        }
        log_shutdown();
        Ok(())
    }
}

/// 校验配置，再按配置选择仓库：内存或 PostgreSQL（连接并建表）
async fn prepare(
    config: &Config,
) -> AppResult<(Arc<dyn OrgFileRepository>, Option<PgRepository>)> {
    config.validate()?;
    log_startup(config);

    if config.uses_memory_store() {
        info!("🗄 使用内存仓库");
        return Ok((Arc::new(InMemoryRepository::new()), None));
    }

    let pg = PgRepository::connect(&config.database_url, config.db_max_connections).await?;
    pg.setup_schema().await?;
    info!("✅ 数据库连接成功");
    Ok((Arc::new(pg.clone()), Some(pg)))
}

async fn on_message(msg: Message, flow: Arc<ConversationFlow>) -> ResponseResult<()> {
    match message_to_event(&msg) {
        Some((chat, event)) => flow.handle(chat, event).await,
        None => debug!("[chat {}] 忽略不支持的消息类型", msg.chat.id.0),
    }
    respond(())
}

async fn on_callback(query: CallbackQuery, flow: Arc<ConversationFlow>) -> ResponseResult<()> {
    if let Some((chat, event)) = callback_to_event(&query) {
        flow.handle(chat, event).await;
    }
    respond(())
}
