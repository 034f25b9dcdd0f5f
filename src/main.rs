mod alerts;
mod analysis;
mod config;
mod data;
mod db;
mod errors;
mod models;
mod scanner;
mod types;

use crate::alerts::telegram::TelegramDispatcher;
use crate::analysis::SignalPipeline;
use crate::data::rest::RestDataProvider;
use crate::db::AlertStore;

#[tokio::main]
async fn main() {
    // Early stderr line so hosted logs capture something even if tracing fails
    eprintln!("[alpha_scout] binary started, setting up logging...");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("alpha_scout scanner starting");

    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    let db_pool = match db::init_db(std::path::Path::new("data")) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!("database init error: {e}");
            std::process::exit(1);
        }
    };

    let provider = RestDataProvider::new(
        &cfg.data_api_base_url,
        &cfg.data_api_key,
        cfg.history_days,
        std::time::Duration::from_secs(cfg.symbol_pause_secs),
    );
    let dispatcher = TelegramDispatcher::new(&cfg.telegram_bot_token, &cfg.telegram_chat_id);
    let pipeline = SignalPipeline::from_config(&cfg);
    let store = AlertStore::new(db_pool);

    tracing::info!(
        watchlist = ?cfg.watchlist,
        days_to_expiry = cfg.days_to_expiry,
        num_paths = cfg.num_paths,
        "configuration loaded"
    );

    scanner::run_scanner(cfg, provider, pipeline, store, dispatcher).await;
}
