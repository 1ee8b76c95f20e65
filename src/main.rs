mod api;
mod config;
mod db;
mod error;
mod research;
mod scorer;
mod state;
mod types;
mod youtube;

use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, CHANNEL_CAPACITY};
use crate::db::writer::SnapshotWriter;
use crate::error::Result;
use crate::research::NicheRefresher;
use crate::state::CategoryCache;
use crate::youtube::YouTubeClient;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let options = SqliteConnectOptions::new()
        .filename(&cfg.db_path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready at {}", cfg.db_path);

    // --- Shared state ---
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(LatencyStats::new());
    let cache = CategoryCache::new();
    let youtube = YouTubeClient::new(&cfg, Arc::clone(&latency), Arc::clone(&health))?;

    // --- Snapshot writer ---
    let (snapshot_tx, snapshot_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let writer = SnapshotWriter::new(pool.clone(), snapshot_rx, Arc::clone(&health));
    tokio::spawn(async move { writer.run().await });

    // --- Background niche research (hourly, only with a default key) ---
    if let Some(refresher) = NicheRefresher::new(
        &cfg,
        youtube.clone(),
        Arc::clone(&cache),
        snapshot_tx.clone(),
        Arc::clone(&health),
    ) {
        tokio::spawn(async move { refresher.run().await });
    }

    // --- HTTP API server ---
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let api_state = ApiState {
        cfg: Arc::new(cfg),
        youtube: Arc::new(youtube),
        cache,
        pool,
        snapshot_tx,
        health,
        latency,
    };
    let app = router(api_state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
