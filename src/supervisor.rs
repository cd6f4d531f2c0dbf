//! Task supervision and shutdown coordination
//!
//! All four activities (stream read loop, keepalive, persistence, snapshot
//! server) run as supervised tasks. The policy is fail-fast on first
//! completion: the moment any task ends, successfully or not, the supervisor
//! broadcasts shutdown, waits (bounded) for the siblings to acknowledge,
//! closes the upstream connection, and surfaces the first task's result as
//! the service outcome. There is no restart and no partial-degradation mode.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::domain::{SyncError, SyncResult};
use crate::stream::Connection;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Shutdown signal that can be cloned and shared across tasks
#[derive(Clone)]
pub struct ShutdownSignal {
    sender: broadcast::Sender<()>,
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            sender,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Trigger shutdown. Idempotent.
    pub fn trigger(&self) {
        if !self.triggered.swap(true, Ordering::SeqCst) {
            info!("shutdown triggered");
            let _ = self.sender.send(());
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Resolve when shutdown is (or already was) triggered
    pub async fn wait(&self) {
        let mut rx = self.sender.subscribe();
        // the flag covers a trigger that fired before this subscription
        if self.triggered.load(Ordering::SeqCst) {
            return;
        }
        let _ = rx.recv().await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Listen for SIGTERM/SIGINT and feed them into the shutdown broadcast, so
/// operator stop follows the same teardown path as fail-fast
pub async fn listen_for_signals(shutdown: ShutdownSignal) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to install SIGINT handler");
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        info!("received ctrl-c");
    }

    shutdown.trigger();
}

/// Supervisor for the service's concurrent activities
pub struct Supervisor {
    shutdown: ShutdownSignal,
    tasks: JoinSet<(&'static str, SyncResult<()>)>,
    drain_timeout: Duration,
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            shutdown: ShutdownSignal::new(),
            tasks: JoinSet::new(),
            drain_timeout: DRAIN_TIMEOUT,
        }
    }

    /// Shutdown signal handed to every supervised task
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Spawn a named activity under supervision
    pub fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = SyncResult<()>> + Send + 'static,
    {
        self.tasks.spawn(async move { (name, task.await) });
    }

    /// Run until the first task completes, then tear everything down.
    /// Returns the first completion's result.
    pub async fn run(mut self, connection: Option<Arc<dyn Connection>>) -> SyncResult<()> {
        let first = match self.tasks.join_next().await {
            Some(joined) => joined,
            None => return Ok(()),
        };

        let outcome = match first {
            Ok((name, Ok(()))) => {
                info!(task = name, "task finished, shutting down service");
                Ok(())
            }
            Ok((name, Err(e))) => {
                error!(task = name, error = %e, "task failed, shutting down service");
                Err(e)
            }
            Err(e) => {
                error!(error = %e, "task panicked, shutting down service");
                Err(SyncError::Task(e.to_string()))
            }
        };

        self.shutdown.trigger();

        let tasks = &mut self.tasks;
        let drained = timeout(self.drain_timeout, async {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((name, Ok(()))) => debug!(task = name, "task exited"),
                    Ok((name, Err(e))) => {
                        warn!(task = name, error = %e, "task exited with error during shutdown")
                    }
                    Err(e) => warn!(error = %e, "task panicked during shutdown"),
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!("shutdown drain timed out, aborting remaining tasks");
            self.tasks.abort_all();
        }

        if let Some(conn) = connection {
            match conn.close().await {
                Ok(()) => info!("upstream connection closed"),
                Err(e) => debug!(error = %e, "failed to close upstream connection"),
            }
        }

        outcome
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
