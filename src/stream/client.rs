//! WebSocket client for the vendor's realtime status stream

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::domain::{SyncError, SyncResult};
use crate::store::{StatusStore, UpsertOutcome};
use crate::supervisor::ShutdownSignal;

use super::protocol::StreamMessage;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Writer half of the stream connection, shared between the keepalive task
/// and the supervisor's teardown
#[async_trait]
pub trait Connection: Send + Sync {
    /// Send a transport-level liveness probe
    async fn ping(&self) -> SyncResult<()>;
    /// Send a close frame if the connection is still open
    async fn close(&self) -> SyncResult<()>;
}

/// Handle to the live upstream connection
#[derive(Clone)]
pub struct ConnectionHandle {
    writer: Arc<Mutex<WsSink>>,
}

#[async_trait]
impl Connection for ConnectionHandle {
    async fn ping(&self) -> SyncResult<()> {
        let mut writer = self.writer.lock().await;
        writer
            .send(Message::Ping(Vec::new()))
            .await
            .map_err(SyncError::Keepalive)
    }

    async fn close(&self) -> SyncResult<()> {
        let mut writer = self.writer.lock().await;
        writer
            .send(Message::Close(None))
            .await
            .map_err(SyncError::Stream)
    }
}

/// Client for the vendor's realtime stream
///
/// Owns the reader half of the connection. One connection attempt, no
/// retries: a failure here is fatal to the whole service.
pub struct StreamClient {
    reader: WsSource,
}

impl StreamClient {
    /// Connect to the stream endpoint. Returns the client (reader half)
    /// and a shareable handle to the writer half.
    pub async fn connect(url: &str) -> SyncResult<(Self, ConnectionHandle)> {
        let (ws, response) = connect_async(url).await.map_err(SyncError::Connect)?;
        info!(status = %response.status(), "connected to status stream");

        let (writer, reader) = ws.split();
        let handle = ConnectionHandle {
            writer: Arc::new(Mutex::new(writer)),
        };
        Ok((Self { reader }, handle))
    }

    /// Read loop: applies every inbound frame to the store, in arrival
    /// order, until the stream closes, a frame fails to decode, or the
    /// supervisor broadcasts shutdown.
    pub async fn run(mut self, store: StatusStore, shutdown: ShutdownSignal) -> SyncResult<()> {
        loop {
            tokio::select! {
                _ = shutdown.wait() => {
                    info!("stream client shutting down");
                    return Ok(());
                }
                frame = self.reader.next() => match frame {
                    None => {
                        info!("stream ended");
                        return Ok(());
                    }
                    Some(Err(e)) => return Err(SyncError::Stream(e)),
                    Some(Ok(Message::Text(text))) => {
                        apply_frame(&text, &store).await?;
                    }
                    Some(Ok(Message::Ping(_))) => debug!("< ping"),
                    Some(Ok(Message::Pong(_))) => debug!("< pong"),
                    Some(Ok(Message::Close(frame))) => {
                        match frame {
                            Some(f) => info!(code = %f.code, reason = %f.reason, "stream closed by peer"),
                            None => info!("stream closed by peer"),
                        }
                        return Ok(());
                    }
                    Some(Ok(Message::Binary(data))) => {
                        warn!(len = data.len(), "ignoring unexpected binary frame");
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

/// Decode one text frame and apply it to the store
async fn apply_frame(text: &str, store: &StatusStore) -> SyncResult<()> {
    match StreamMessage::decode(text)? {
        StreamMessage::SnapshotInit(stations) => {
            let count = stations.len();
            store.bulk_load(stations).await;
            info!(stations = count, "snapshot loaded");
        }
        StreamMessage::StatusUpdate(station) => {
            let id = station.id.clone();
            if store.upsert(station).await == UpsertOutcome::Inserted {
                warn!(station = %id, "update for unknown station, inserted");
            }
        }
    }
    info!("< {}", store.counts().await);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConnectorStatus;

    const SNAPSHOT: &str = r#"{
        "type": "snapshot:init",
        "data": [
            {"uuid": "A", "status": 0, "connectors": [
                {"uuid": "a1", "status": 0, "error": 0, "timestamp": 1},
                {"uuid": "a2", "status": 1, "error": 0, "timestamp": 1}
            ]},
            {"uuid": "B", "status": 0, "connectors": [
                {"uuid": "b1", "status": 0, "error": 0, "timestamp": 1},
                {"uuid": "b2", "status": 0, "error": 0, "timestamp": 1}
            ]}
        ]
    }"#;

    const UPDATE_A: &str = r#"{
        "type": "status:update",
        "data": {"uuid": "A", "status": 1, "connectors": [
            {"uuid": "a1", "status": 1, "error": 0, "timestamp": 2},
            {"uuid": "a2", "status": 1, "error": 0, "timestamp": 2}
        ]}
    }"#;

    #[tokio::test]
    async fn test_snapshot_then_update_aggregates() {
        let store = StatusStore::new();

        apply_frame(SNAPSHOT, &store).await.unwrap();
        let counts = store.counts().await;
        assert_eq!(
            (counts.available, counts.occupied, counts.error, counts.unknown, counts.total),
            (3, 1, 0, 0, 4)
        );

        apply_frame(UPDATE_A, &store).await.unwrap();
        let counts = store.counts().await;
        assert_eq!((counts.available, counts.occupied), (2, 2));
    }

    #[tokio::test]
    async fn test_update_for_unknown_station_is_inserted() {
        let store = StatusStore::new();
        apply_frame(SNAPSHOT, &store).await.unwrap();

        let update_c = r#"{
            "type": "status:update",
            "data": {"uuid": "C", "status": 2, "connectors": [
                {"uuid": "c1", "status": 2, "error": 3, "timestamp": 5}
            ]}
        }"#;
        apply_frame(update_c, &store).await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 3);
        let c = snapshot.iter().find(|s| s.id == "C").unwrap();
        assert_eq!(c.connectors[0].status, ConnectorStatus::Error);
        // siblings untouched
        let b = snapshot.iter().find(|s| s.id == "B").unwrap();
        assert_eq!(b.connectors.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_frame_is_fatal() {
        let store = StatusStore::new();
        let err = apply_frame("{\"type\": \"nope\"}", &store).await.unwrap_err();
        assert!(matches!(err, SyncError::Decode(_)));
    }
}
