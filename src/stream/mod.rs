//! Vendor realtime stream: wire protocol and WebSocket client

pub mod client;
pub mod protocol;

pub use client::{Connection, ConnectionHandle, StreamClient};
pub use protocol::StreamMessage;
