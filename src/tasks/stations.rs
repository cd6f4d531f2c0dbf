//! Station-metadata refresh task
//!
//! Fetches the vendor's bulk datadump (station positions and metadata) and
//! writes it to `stations.json` next to the persisted statuses. Disabled by
//! default; the realtime stream carries no positions, so the map client can
//! live with a stale copy. When enabled it refreshes immediately and then
//! once per interval. A failed fetch or write is logged and the cycle
//! skipped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::domain::SyncResult;
use crate::supervisor::ShutdownSignal;

pub const STATIONS_FILE: &str = "stations.json";

/// Run the refresh loop until shutdown is broadcast
pub async fn run(
    datadump_url: String,
    storage_dir: PathBuf,
    period: Duration,
    shutdown: ShutdownSignal,
) -> SyncResult<()> {
    info!(
        dir = %storage_dir.display(),
        interval_secs = period.as_secs(),
        "stations refresh task started"
    );

    let client = reqwest::Client::new();
    // first tick fires immediately
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match refresh(&client, &datadump_url, &storage_dir).await {
                    Ok(bytes) => info!(bytes, "wrote {}", STATIONS_FILE),
                    Err(e) => error!(error = %e, "stations refresh failed, skipping cycle"),
                }
            }
            _ = shutdown.wait() => {
                info!("stations refresh task shutting down");
                return Ok(());
            }
        }
    }
}

async fn refresh(client: &reqwest::Client, url: &str, dir: &Path) -> SyncResult<usize> {
    let response = client.get(url).send().await?.error_for_status()?;
    let body = response.bytes().await?;

    tokio::fs::create_dir_all(dir).await?;
    let target = dir.join(STATIONS_FILE);
    let staging = dir.join(format!("{}.tmp", STATIONS_FILE));
    tokio::fs::write(&staging, &body).await?;
    tokio::fs::rename(&staging, &target).await?;

    Ok(body.len())
}
