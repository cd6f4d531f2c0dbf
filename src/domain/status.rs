//! Station status domain entities
//!
//! Field names and status codes follow the vendor's realtime protocol:
//! statuses travel as integer codes, connectors carry `uuid`/`error`/
//! `timestamp` keys.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Status of a connector (or a station's provider-reported aggregate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum ConnectorStatus {
    Available,
    Unknown,
    Occupied,
    Error,
}

impl ConnectorStatus {
    /// Vendor wire code for this status
    pub fn code(self) -> i8 {
        match self {
            Self::Available => 0,
            Self::Unknown => -1,
            Self::Occupied => 1,
            Self::Error => 2,
        }
    }
}

impl Default for ConnectorStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl std::fmt::Display for ConnectorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "Available"),
            Self::Unknown => write!(f, "Unknown"),
            Self::Occupied => write!(f, "Occupied"),
            Self::Error => write!(f, "Error"),
        }
    }
}

impl TryFrom<i8> for ConnectorStatus {
    type Error = String;

    fn try_from(code: i8) -> Result<Self, String> {
        match code {
            0 => Ok(ConnectorStatus::Available),
            -1 => Ok(ConnectorStatus::Unknown),
            1 => Ok(ConnectorStatus::Occupied),
            2 => Ok(ConnectorStatus::Error),
            other => Err(format!("unknown status code: {}", other)),
        }
    }
}

impl From<ConnectorStatus> for i8 {
    fn from(status: ConnectorStatus) -> i8 {
        status.code()
    }
}

/// One physical charging connector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    /// Stable vendor-assigned identifier
    #[serde(rename = "uuid")]
    pub id: String,
    pub status: ConnectorStatus,
    /// Vendor error code, meaningful only when status is Error
    #[serde(rename = "error")]
    pub error_code: i32,
    /// Provider-reported time of the last status change (unix millis)
    #[serde(rename = "timestamp")]
    pub observed_at: i64,
}

impl Connector {
    /// Provider-reported change time as a UTC timestamp, when in range
    pub fn observed_at_time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.observed_at).single()
    }
}

/// Latest known status of one station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationStatus {
    /// Stable vendor-assigned identifier, used as the store key
    #[serde(rename = "uuid")]
    pub id: String,
    /// Provider-reported aggregate for the whole station
    pub status: ConnectorStatus,
    /// Provider-ordered connectors; order carries no meaning beyond display
    pub connectors: Vec<Connector>,
}

/// Connector tally across a set of stations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectorCounts {
    pub available: usize,
    pub occupied: usize,
    pub error: usize,
    pub unknown: usize,
    pub total: usize,
}

impl ConnectorCounts {
    /// Tally connectors over an iterator of stations
    pub fn tally<'a>(stations: impl IntoIterator<Item = &'a StationStatus>) -> Self {
        let mut counts = Self::default();
        for station in stations {
            for connector in &station.connectors {
                match connector.status {
                    ConnectorStatus::Available => counts.available += 1,
                    ConnectorStatus::Occupied => counts.occupied += 1,
                    ConnectorStatus::Error => counts.error += 1,
                    ConnectorStatus::Unknown => counts.unknown += 1,
                }
                counts.total += 1;
            }
        }
        counts
    }
}

impl std::fmt::Display for ConnectorCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "available: {}  occupied: {}  error: {}  unknown: {}  total: {}",
            self.available, self.occupied, self.error, self.unknown, self.total
        )
    }
}
