//! Persistence task
//!
//! After an initial warm-up delay, periodically serializes the status store
//! to `statuses.json` in the storage directory. The file is written to a
//! temporary sibling and renamed into place, so the snapshot server never
//! serves a torn write. A failed cycle is logged and skipped; the next tick
//! tries again with a fresh snapshot.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::domain::{StationStatus, SyncResult};
use crate::store::StatusStore;
use crate::supervisor::ShutdownSignal;

pub const STATUSES_FILE: &str = "statuses.json";

/// Run the persistence loop until shutdown is broadcast
pub async fn run(
    store: StatusStore,
    storage_dir: PathBuf,
    warmup: Duration,
    period: Duration,
    shutdown: ShutdownSignal,
) -> SyncResult<()> {
    info!(
        dir = %storage_dir.display(),
        warmup_secs = warmup.as_secs(),
        interval_secs = period.as_secs(),
        "persistence task started"
    );

    // first write at warm-up, then one per interval
    let mut ticker = interval_at(Instant::now() + warmup, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = store.snapshot().await;
                match write_snapshot(&storage_dir, &snapshot).await {
                    Ok(()) => info!(stations = snapshot.len(), "wrote {}", STATUSES_FILE),
                    Err(e) => error!(error = %e, "snapshot write failed, skipping cycle"),
                }
            }
            _ = shutdown.wait() => {
                info!("persistence task shutting down");
                return Ok(());
            }
        }
    }
}

/// Serialize one snapshot to `<dir>/statuses.json`, atomically
pub async fn write_snapshot(dir: &Path, snapshot: &[StationStatus]) -> SyncResult<()> {
    tokio::fs::create_dir_all(dir).await?;

    let body = serde_json::to_vec(snapshot)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let target = dir.join(STATUSES_FILE);
    let staging = dir.join(format!("{}.tmp", STATUSES_FILE));

    tokio::fs::write(&staging, &body).await?;
    tokio::fs::rename(&staging, &target).await?;
    Ok(())
}
