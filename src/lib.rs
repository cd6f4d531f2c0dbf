//! # Nobil status synchronization service
//!
//! Ingests the vendor's realtime charging-station status stream, keeps the
//! canonical in-memory view of every station's connector states, persists
//! that view on a timer, and re-serves the persisted JSON over HTTP to the
//! map client.
//!
//! ## Architecture
//!
//! - **domain**: status entities, wire codecs and the error taxonomy
//! - **store**: the canonical id-to-status mapping (single writer, copying
//!   readers, no deletes)
//! - **stream**: WebSocket client and frame protocol for the realtime feed
//! - **tasks**: periodic background work (keepalive, persistence, optional
//!   station-metadata refresh)
//! - **server**: the snapshot HTTP server with single-origin CORS
//! - **supervisor**: fail-fast supervision and shutdown broadcast

pub mod config;
pub mod domain;
pub mod server;
pub mod store;
pub mod stream;
pub mod supervisor;
pub mod tasks;

pub use config::{default_config_path, AppConfig};
pub use domain::{Connector, ConnectorCounts, ConnectorStatus, StationStatus, SyncError, SyncResult};
pub use store::{StatusStore, UpsertOutcome};
pub use stream::{Connection, ConnectionHandle, StreamClient};
pub use supervisor::{ShutdownSignal, Supervisor};
