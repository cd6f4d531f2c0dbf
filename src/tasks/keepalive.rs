//! Keepalive task
//!
//! Sends one transport-level ping per interval over the live connection, so
//! the peer and any intermediaries keep the idle stream open. A failed probe
//! is treated like a stream failure: the task ends and the supervisor tears
//! the service down.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::domain::SyncResult;
use crate::stream::Connection;
use crate::supervisor::ShutdownSignal;

/// Run the keepalive loop until the probe fails or shutdown is broadcast
pub async fn run(
    connection: Arc<dyn Connection>,
    period: Duration,
    shutdown: ShutdownSignal,
) -> SyncResult<()> {
    info!(interval_secs = period.as_secs(), "keepalive task started");

    // first probe one full interval after start, not immediately
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                debug!("> ping");
                connection.ping().await?;
            }
            _ = shutdown.wait() => {
                info!("keepalive task shutting down");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SyncError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_tungstenite::tungstenite;

    struct MockConnection {
        pings: AtomicUsize,
        fail_after: Option<usize>,
    }

    impl MockConnection {
        fn new(fail_after: Option<usize>) -> Arc<Self> {
            Arc::new(Self {
                pings: AtomicUsize::new(0),
                fail_after,
            })
        }
    }

    #[async_trait]
    impl Connection for MockConnection {
        async fn ping(&self) -> SyncResult<()> {
            let sent = self.pings.fetch_add(1, Ordering::SeqCst) + 1;
            match self.fail_after {
                Some(limit) if sent > limit => Err(SyncError::Keepalive(
                    tungstenite::Error::ConnectionClosed,
                )),
                _ => Ok(()),
            }
        }

        async fn close(&self) -> SyncResult<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_probe_per_interval() {
        let connection = MockConnection::new(None);
        let shutdown = ShutdownSignal::new();
        let task = tokio::spawn(run(
            connection.clone(),
            Duration::from_secs(10),
            shutdown.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(connection.pings.load(Ordering::SeqCst), 3);

        shutdown.trigger();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_probes_after_shutdown() {
        let connection = MockConnection::new(None);
        let shutdown = ShutdownSignal::new();
        let task = tokio::spawn(run(
            connection.clone(),
            Duration::from_secs(10),
            shutdown.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(15)).await;
        shutdown.trigger();
        task.await.unwrap().unwrap();

        let sent = connection.pings.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(connection.pings.load(Ordering::SeqCst), sent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_probe_is_fatal() {
        let connection = MockConnection::new(Some(2));
        let shutdown = ShutdownSignal::new();
        let task = tokio::spawn(run(
            connection.clone(),
            Duration::from_secs(10),
            shutdown,
        ));

        tokio::time::sleep(Duration::from_secs(40)).await;
        let result = task.await.unwrap();
        assert!(matches!(result, Err(SyncError::Keepalive(_))));
    }
}
