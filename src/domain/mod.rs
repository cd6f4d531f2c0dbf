//! Core domain types for the status synchronization service

pub mod error;
pub mod status;

pub use error::{SyncError, SyncResult};
pub use status::{Connector, ConnectorCounts, ConnectorStatus, StationStatus};
