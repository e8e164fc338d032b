//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run.
//! No business logic here.

use chrono::Utc;
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wow_sync::adapters::battlenet::BattlenetGateway;
use wow_sync::adapters::persistence::SqliteStore;
use wow_sync::domain::WeeklyActivityAnalyzer;
use wow_sync::ports::{GameDataGateway, ProgressStore, UserStore};
use wow_sync::shared::config::AppConfig;
use wow_sync::usecases::{reset_status, RefreshConfig, RefreshService, ResetScheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!("no .env found"),
    }

    let cfg = AppConfig::load().unwrap_or_default();
    let data_path = PathBuf::from(cfg.data_dir_or_default());
    info!(path = %data_path.display(), "data directory");

    // --- Persistence (users + weekly snapshots share one database) ---
    let store = Arc::new(
        SqliteStore::connect(&data_path)
            .await
            .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
    );
    let users: Arc<dyn UserStore> = Arc::clone(&store) as Arc<dyn UserStore>;
    let progress: Arc<dyn ProgressStore> = Arc::clone(&store) as Arc<dyn ProgressStore>;

    // --- Battle.net gateway ---
    let base_url = cfg.api_base_url_or_default();
    let namespace = cfg.api_namespace_or_default();
    info!(%base_url, %namespace, "Battle.net gateway configured");
    let gateway: Arc<dyn GameDataGateway> =
        Arc::new(BattlenetGateway::new(base_url, namespace));

    // --- Services ---
    let refresh_config = RefreshConfig {
        interval: Duration::from_secs(cfg.refresh_interval_minutes_or_default() * 60),
        batch_size: cfg.batch_size_or_default(),
        batch_delay: Duration::from_millis(cfg.batch_delay_ms_or_default()),
    };
    let refresh = Arc::new(RefreshService::new(
        users,
        gateway,
        progress,
        WeeklyActivityAnalyzer::with_default_catalog(),
        refresh_config,
    ));
    let scheduler = Arc::new(ResetScheduler::new(
        Arc::clone(&refresh),
        Duration::from_secs(cfg.reset_check_secs_or_default()),
        Utc::now(),
    ));

    let status = reset_status(Utc::now());
    info!(
        last_reset = %status.last_reset,
        next_reset = %status.next_reset,
        remaining = %status.time_until_reset,
        "weekly reset clock"
    );

    Arc::clone(&refresh).start().await;
    Arc::clone(&scheduler).start().await;

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    scheduler.stop().await;
    refresh.stop().await;

    let stats = refresh.stats().await;
    info!(
        runs = stats.completed_runs,
        succeeded = stats.successful_refreshes,
        failed = stats.failed_refreshes,
        "final refresh stats"
    );

    Ok(())
}
