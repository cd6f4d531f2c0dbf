//!
//! Realtime charging-station status synchronization service.
//! Reads configuration from TOML file (~/.config/nobil-sync/config.toml).

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use nobil_sync::stream::Connection;
use nobil_sync::supervisor::{self, Supervisor};
use nobil_sync::{default_config_path, AppConfig, StatusStore, StreamClient};

#[tokio::main]
async fn main() -> ExitCode {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var("NOBIL_SYNC_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());
    let config = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            init_tracing(&cfg.logging.level);
            info!("configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            init_tracing("info");
            error!("failed to load config: {}. Using defaults.", e);
            AppConfig::default()
        }
    };

    info!("starting status synchronization service");

    // ── Connect upstream (fatal on failure, nothing starts) ────
    let (client, handle) = match StreamClient::connect(&config.stream_url()).await {
        Ok(connected) => connected,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let connection: Arc<dyn Connection> = Arc::new(handle);

    let store = StatusStore::new();

    // ── Supervised activities ──────────────────────────────────
    let mut sup = Supervisor::new();
    let shutdown = sup.shutdown_signal();

    sup.spawn("stream", client.run(store.clone(), shutdown.clone()));
    sup.spawn(
        "keepalive",
        nobil_sync::tasks::keepalive::run(
            connection.clone(),
            config.keepalive.interval(),
            shutdown.clone(),
        ),
    );
    sup.spawn(
        "persistence",
        nobil_sync::tasks::persistence::run(
            store.clone(),
            config.storage.dir.clone(),
            config.persistence.warmup(),
            config.persistence.interval(),
            shutdown.clone(),
        ),
    );
    sup.spawn(
        "server",
        nobil_sync::server::run(
            config.server.clone(),
            config.storage.dir.clone(),
            shutdown.clone(),
        ),
    );
    if config.stations.refresh {
        sup.spawn(
            "stations",
            nobil_sync::tasks::stations::run(
                config.datadump_url(),
                config.storage.dir.clone(),
                config.stations.interval(),
                shutdown.clone(),
            ),
        );
    }

    tokio::spawn(supervisor::listen_for_signals(shutdown));

    // First completion, success or failure, ends the whole service.
    match sup.run(Some(connection)).await {
        Ok(()) => {
            info!("service stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("service stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}
