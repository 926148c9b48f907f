use anyhow::Result;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;

use course_assistant::bot;
use course_assistant::config::BotConfig;
use course_assistant::db;
use course_assistant::dialogue::UserSession;
use course_assistant::localization::init_localization;
use course_assistant::logging::init_tracing;
use course_assistant::support::SupportDesk;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;

    // Initialize logging
    init_tracing(config.log_format);

    info!("Starting Course Assistant Telegram Bot");

    init_localization()?;

    let pool = db::connect(&config.database_url, config.max_connections).await?;
    db::init_database_schema(&pool).await?;

    let bot = Bot::new(config.bot_token.clone());
    let desk = SupportDesk::new(ChatId(config.support_chat_id));

    info!(support_chat_id = config.support_chat_id, "Bot initialized, starting dispatcher");

    Dispatcher::builder(bot, bot::schema())
        .dependencies(dptree::deps![
            InMemStorage::<UserSession>::new(),
            Arc::new(pool),
            Arc::new(desk),
            Arc::new(config)
        ])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
