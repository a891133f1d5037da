//! Durable FIFO of mutating actions deferred while offline
//!
//! Every change is written to disk before the call that made it returns, so
//! the queue survives a restart at any point. Items leave the queue only after
//! a confirmed successful replay.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use courier_domain::{
    ActionKind, ActionPayload, ApiResponse, DrainReport, EngineResult, OfflineQueueItem,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::errors::QueueError;
use super::persistence::{QueueFile, QueueRecord};

/// Sends a queued item to the backend
#[async_trait]
pub trait ActionReplayer: Send + Sync {
    async fn replay(&self, item: &OfflineQueueItem) -> EngineResult<ApiResponse>;
}

/// Offline action queue backed by a JSON file
pub struct OfflineQueue {
    file: QueueFile,
    /// Held across every persist so file order always equals memory order
    state: Mutex<Vec<QueueRecord>>,
    drain_lock: Mutex<()>,
}

impl OfflineQueue {
    /// Open the queue at `path`, loading whatever a previous run left behind
    pub async fn open(path: impl Into<PathBuf>) -> EngineResult<Self> {
        let file = QueueFile::new(path);
        let records = file.load().await?;
        let known = records.iter().filter(|r| r.as_item().is_some()).count();
        info!(
            path = %file.path().display(),
            pending = known,
            unrecognized = records.len() - known,
            "offline queue opened"
        );

        Ok(Self { file, state: Mutex::new(records), drain_lock: Mutex::new(()) })
    }

    /// Append an action and persist it before returning
    #[instrument(skip(self, payload), fields(kind = %action_kind, endpoint = %payload.endpoint))]
    pub async fn enqueue(
        &self,
        action_kind: ActionKind,
        payload: ActionPayload,
    ) -> EngineResult<OfflineQueueItem> {
        let now = Utc::now();
        let item = OfflineQueueItem {
            id: format!("{}-{:08x}", now.timestamp_millis(), rand::random::<u32>()),
            action_kind,
            payload,
            enqueued_at: now,
        };

        let mut state = self.state.lock().await;
        state.push(QueueRecord::Known(item.clone()));
        if let Err(err) = self.file.save(&state).await {
            state.pop();
            return Err(err.into());
        }

        info!(id = %item.id, queued = state.len(), "action queued for replay");
        Ok(item)
    }

    /// Replay queued items oldest first, stopping at the first failure
    ///
    /// Returns immediately with `skipped = true` when another drain is
    /// already running. Unrecognized records stay in place and are not
    /// attempted.
    #[instrument(skip(self, replayer))]
    pub async fn drain(&self, replayer: &dyn ActionReplayer) -> EngineResult<DrainReport> {
        let Ok(_guard) = self.drain_lock.try_lock() else {
            debug!("drain already in progress");
            return Ok(DrainReport::skipped(self.len().await));
        };

        let mut report = DrainReport::default();
        loop {
            let next = {
                let state = self.state.lock().await;
                state.iter().find_map(QueueRecord::as_item).cloned()
            };
            let Some(item) = next else { break };

            match replayer.replay(&item).await {
                Ok(_) => {
                    self.remove(&item.id).await?;
                    report.succeeded += 1;
                    debug!(id = %item.id, "replayed queued action");
                }
                Err(err) => {
                    warn!(id = %item.id, error = %err, "replay failed, stopping drain");
                    report.failed = 1;
                    break;
                }
            }
        }

        report.remaining = self.len().await;
        if report.succeeded > 0 || report.failed > 0 {
            info!(
                succeeded = report.succeeded,
                failed = report.failed,
                remaining = report.remaining,
                "offline queue drained"
            );
        }
        Ok(report)
    }

    /// Snapshot of replayable items in queue order
    pub async fn pending(&self) -> Vec<OfflineQueueItem> {
        self.state.lock().await.iter().filter_map(QueueRecord::as_item).cloned().collect()
    }

    /// Number of replayable items
    pub async fn len(&self) -> usize {
        self.state.lock().await.iter().filter(|r| r.as_item().is_some()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop one record by id, recognized or not
    pub async fn discard(&self, id: &str) -> EngineResult<()> {
        self.remove(id).await?;
        info!(id, "queued action discarded");
        Ok(())
    }

    /// Drop every record, including unrecognized ones
    pub async fn clear(&self) -> EngineResult<()> {
        let mut state = self.state.lock().await;
        let previous = std::mem::take(&mut *state);
        if let Err(err) = self.file.save(&state).await {
            *state = previous;
            return Err(err.into());
        }
        info!("offline queue cleared");
        Ok(())
    }

    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }

    async fn remove(&self, id: &str) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        let index = state
            .iter()
            .position(|r| r.id() == Some(id))
            .ok_or_else(|| QueueError::ItemNotFound(id.to_string()))?;

        let record = state.remove(index);
        if let Err(err) = self.file.save(&state).await {
            state.insert(index, record);
            return Err(err);
        }
        Ok(())
    }
}

impl std::fmt::Debug for OfflineQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineQueue").field("path", &self.file.path()).finish_non_exhaustive()
    }
}
