//! Service errors

use thiserror::Error;

/// Errors surfaced by the synchronization service
#[derive(Debug, Error)]
pub enum SyncError {
    /// Could not establish the upstream connection (startup-only, fatal)
    #[error("could not connect to stream: {0}")]
    Connect(#[source] tokio_tungstenite::tungstenite::Error),

    /// Malformed frame payload (fatal to the read loop)
    #[error("failed to decode frame: {0}")]
    Decode(#[from] serde_json::Error),

    /// Transport error on the established stream (fatal)
    #[error("stream error: {0}")]
    Stream(#[source] tokio_tungstenite::tungstenite::Error),

    /// Liveness probe could not be sent (fatal, same domain as a stream error)
    #[error("keepalive failed: {0}")]
    Keepalive(#[source] tokio_tungstenite::tungstenite::Error),

    /// Snapshot could not be written (non-fatal per cycle; fatal only if the
    /// task itself aborts)
    #[error("failed to persist snapshot: {0}")]
    Persistence(#[from] std::io::Error),

    /// Vendor datadump could not be fetched (non-fatal per cycle)
    #[error("datadump fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Snapshot server could not bind or serve
    #[error("snapshot server error: {0}")]
    Http(String),

    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// A supervised task panicked or was aborted
    #[error("task failed: {0}")]
    Task(String),
}

/// Result type for service operations
pub type SyncResult<T> = Result<T, SyncError>;
