//! AdhkarBot Telegram Bot
//!
//! Main application entry point

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use teloxide::prelude::*;
use tracing::{info, warn};
use url::Url;

use AdhkarBot::{
    config::{BotMode, Settings},
    content::ContentCatalog,
    database::SettingsStore,
    handlers::create_handler,
    i18n::I18n,
    services::{AppContext, TelegramGateway},
    utils::logging,
    web::{self, WebState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("Loading configuration")?;
    settings.validate()?;

    // Initialize logging; the guard flushes file output on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", AdhkarBot::info());

    info!("Connecting to database...");
    let store = SettingsStore::connect(&settings).await?;

    info!("Loading translations...");
    let i18n = I18n::load(&settings.i18n).await?;

    info!("Loading content catalogue...");
    let content = Arc::new(ContentCatalog::load(&settings.content).await?);
    info!(entries = content.total_entries(), "Content catalogue loaded");

    let bot = Bot::new(&settings.bot.token);
    let me = bot.get_me().await.context("Fetching bot identity")?;
    let username = me.user.username.clone().unwrap_or_default();
    info!(bot = %username, "Bot identity confirmed");

    let gateway = Arc::new(TelegramGateway::new(bot.clone()));
    let ctx = Arc::new(AppContext::new(
        settings.clone(),
        store.clone(),
        content,
        gateway,
        Arc::new(bot.clone()),
        i18n,
        username,
    ));

    info!("Starting scheduler...");
    let jobs = ctx.scheduler.reschedule().await?;
    ctx.scheduler.start();
    info!(jobs = jobs, "Scheduler running");

    match settings.bot.mode {
        BotMode::Polling => run_polling(bot, Arc::clone(&ctx)).await?,
        BotMode::Webhook => run_webhook(bot, me, Arc::clone(&ctx), &settings).await?,
    }

    info!("Shutting down...");
    ctx.scheduler.shutdown().await;
    store.close().await;
    info!("AdhkarBot has been shut down.");

    Ok(())
}

async fn run_polling(bot: Bot, ctx: Arc<AppContext>) -> anyhow::Result<()> {
    bot.delete_webhook().await.context("Removing webhook before polling")?;
    info!("Starting bot with polling mode...");

    Dispatcher::builder(bot, create_handler())
        .dependencies(dptree::deps![ctx])
        .default_handler(|upd| async move {
            tracing::debug!("Unhandled update: {:?}", upd.kind);
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn run_webhook(bot: Bot, me: teloxide::types::Me, ctx: Arc<AppContext>, settings: &Settings) -> anyhow::Result<()> {
    match settings.expected_webhook_url() {
        Some(target) => match Url::parse(&target) {
            Ok(url) => {
                if let Err(e) = bot.set_webhook(url).await {
                    warn!(error = %e, "Could not register webhook; use /setwebhook");
                } else {
                    info!("Webhook registered");
                }
            }
            Err(e) => warn!(error = %e, "Configured webhook URL is invalid"),
        },
        None => warn!("No webhook URL configured; use /setwebhook?url=<base>"),
    }

    let host = settings.server.host.parse().context("Invalid server host")?;
    let addr = SocketAddr::new(host, settings.port());
    info!(port = settings.port(), port_source = ?settings.server.port_source, "Starting bot with webhook mode...");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for shutdown signal");
        }
    };
    web::serve(WebState::new(bot, me, ctx), addr, shutdown).await?;
    Ok(())
}
