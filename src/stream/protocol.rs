//! Wire protocol for the vendor's realtime stream
//!
//! Every text frame is a JSON object tagged by a `type` field. The stream
//! opens with exactly one full snapshot, followed by zero or more
//! single-station updates. Anything else is a protocol violation and is
//! surfaced as a typed decode error.

use serde::{Deserialize, Serialize};

use crate::domain::StationStatus;

/// One decoded stream frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum StreamMessage {
    /// Complete current status set, sent once at stream start
    #[serde(rename = "snapshot:init")]
    SnapshotInit(Vec<StationStatus>),
    /// Replacement status for a single station
    #[serde(rename = "status:update")]
    StatusUpdate(StationStatus),
}

impl StreamMessage {
    /// Decode a text frame payload
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
