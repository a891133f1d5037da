//! Background task that drains the offline queue when connectivity returns
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use courier_infra::sync::{ConnectivityMonitor, OfflineQueue, ReplayWorker, ReplayWorkerConfig};
//!
//! # async fn example(replayer: Arc<dyn courier_infra::sync::ActionReplayer>) -> courier_domain::EngineResult<()> {
//! let queue = Arc::new(OfflineQueue::open("courier-queue.json").await?);
//! let connectivity = ConnectivityMonitor::new(false);
//! let mut worker = ReplayWorker::new(queue, replayer, connectivity.clone(), ReplayWorkerConfig::default());
//!
//! worker.start()?;
//! connectivity.set_online(true); // queued actions replay now
//! worker.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use courier_domain::EngineResult;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::connectivity::ConnectivityMonitor;
use super::errors::QueueError;
use super::offline_queue::{ActionReplayer, OfflineQueue};

/// Configuration for the replay worker
#[derive(Debug, Clone)]
pub struct ReplayWorkerConfig {
    /// Join timeout when stopping
    pub join_timeout: Duration,
    /// Drain once at start when already online
    pub drain_on_start: bool,
}

impl Default for ReplayWorkerConfig {
    fn default() -> Self {
        Self { join_timeout: Duration::from_secs(5), drain_on_start: true }
    }
}

/// Replay worker with explicit lifecycle management
pub struct ReplayWorker {
    queue: Arc<OfflineQueue>,
    replayer: Arc<dyn ActionReplayer>,
    connectivity: ConnectivityMonitor,
    config: ReplayWorkerConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl ReplayWorker {
    pub fn new(
        queue: Arc<OfflineQueue>,
        replayer: Arc<dyn ActionReplayer>,
        connectivity: ConnectivityMonitor,
        config: ReplayWorkerConfig,
    ) -> Self {
        Self {
            queue,
            replayer,
            connectivity,
            config,
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Spawn the background task
    ///
    /// Must be called inside a tokio runtime.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> EngineResult<()> {
        if self.is_running() {
            return Err(QueueError::WorkerState("already running".into()).into());
        }

        self.cancellation = CancellationToken::new();

        // Subscribe before spawning so an edge between now and the first poll
        // is not lost.
        let changes = self.connectivity.subscribe();
        let initial_drain = self.config.drain_on_start && self.connectivity.is_online();
        let queue = Arc::clone(&self.queue);
        let replayer = Arc::clone(&self.replayer);
        let cancel = self.cancellation.clone();

        self.task_handle = Some(tokio::spawn(async move {
            Self::run_loop(queue, replayer, changes, initial_drain, cancel).await;
        }));
        info!("replay worker started");
        Ok(())
    }

    /// Cancel the task and wait for it to finish
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> EngineResult<()> {
        let Some(handle) = self.task_handle.take() else {
            return Err(QueueError::WorkerState("not running".into()).into());
        };

        self.cancellation.cancel();
        match tokio::time::timeout(self.config.join_timeout, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(error = %e, "replay task panicked");
                return Err(QueueError::WorkerState("task panicked".into()).into());
            }
            Err(_) => {
                warn!("replay task did not finish within the join timeout");
                return Err(QueueError::WorkerState("join timed out".into()).into());
            }
        }

        info!("replay worker stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    async fn run_loop(
        queue: Arc<OfflineQueue>,
        replayer: Arc<dyn ActionReplayer>,
        mut changes: watch::Receiver<bool>,
        initial_drain: bool,
        cancel: CancellationToken,
    ) {
        if initial_drain {
            Self::drain(&queue, replayer.as_ref(), &cancel).await;
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("replay loop cancelled");
                    break;
                }
                changed = changes.changed() => {
                    if changed.is_err() {
                        debug!("connectivity monitor dropped, replay loop exiting");
                        break;
                    }
                    let online = *changes.borrow_and_update();
                    if online {
                        Self::drain(&queue, replayer.as_ref(), &cancel).await;
                    }
                }
            }
        }
    }

    async fn drain(queue: &OfflineQueue, replayer: &dyn ActionReplayer, cancel: &CancellationToken) {
        tokio::select! {
            _ = cancel.cancelled() => {}
            result = queue.drain(replayer) => match result {
                Ok(report) if report.skipped => debug!("drain already running elsewhere"),
                Ok(report) => debug!(succeeded = report.succeeded, remaining = report.remaining, "replay pass finished"),
                Err(e) => error!(error = %e, "replay pass failed"),
            },
        }
    }
}

impl Drop for ReplayWorker {
    fn drop(&mut self) {
        if self.task_handle.is_some() {
            self.cancellation.cancel();
        }
    }
}
