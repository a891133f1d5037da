//! On-disk format of the offline queue
//!
//! The queue file is a plain JSON array of item objects. Records whose
//! `actionKind` this build does not understand are carried through load and
//! save untouched so a newer writer's items survive an older reader.

use std::path::{Path, PathBuf};

use courier_domain::OfflineQueueItem;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use super::errors::{QueueError, QueueResult};

/// One element of the queue file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueueRecord {
    Known(OfflineQueueItem),
    /// Kept verbatim, never replayed
    Unknown(Value),
}

impl QueueRecord {
    pub fn as_item(&self) -> Option<&OfflineQueueItem> {
        match self {
            Self::Known(item) => Some(item),
            Self::Unknown(_) => None,
        }
    }

    /// The `id` field, when the record has one
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Known(item) => Some(&item.id),
            Self::Unknown(value) => value.get("id").and_then(Value::as_str),
        }
    }
}

/// Reads and atomically rewrites the queue file
#[derive(Debug, Clone)]
pub struct QueueFile {
    path: PathBuf,
}

impl QueueFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record; a missing or empty file is an empty queue
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> QueueResult<Vec<QueueRecord>> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("queue file does not exist yet");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let value: Value = serde_json::from_slice(&data)
            .map_err(|e| QueueError::corrupted(self.path.display().to_string(), e.to_string()))?;
        let Value::Array(entries) = value else {
            return Err(QueueError::corrupted(
                self.path.display().to_string(),
                "expected a JSON array of queue items",
            ));
        };

        let records: Vec<QueueRecord> = entries
            .into_iter()
            .map(|entry| match serde_json::from_value::<OfflineQueueItem>(entry.clone()) {
                Ok(item) => QueueRecord::Known(item),
                Err(err) => {
                    let id = entry.get("id").and_then(serde_json::Value::as_str).unwrap_or("<none>");
                    warn!(
                        id,
                        error = %err,
                        "unrecognized queue record, keeping it without replaying"
                    );
                    QueueRecord::Unknown(entry)
                }
            })
            .collect();

        debug!(count = records.len(), "loaded offline queue");
        Ok(records)
    }

    /// Replace the file contents with `records`
    ///
    /// Writes to a sibling temp file, syncs it, then renames over the target.
    #[instrument(skip(self, records), fields(path = %self.path.display(), count = records.len()))]
    pub async fn save(&self, records: &[QueueRecord]) -> QueueResult<()> {
        let data = serde_json::to_vec_pretty(records)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file =
            fs::OpenOptions::new().write(true).create(true).truncate(true).open(&temp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;
        debug!(bytes = data.len(), "persisted offline queue");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use courier_domain::{ActionKind, ActionPayload};
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn item(id: &str) -> OfflineQueueItem {
        OfflineQueueItem {
            id: id.into(),
            action_kind: ActionKind::Create,
            payload: ActionPayload::new("/notes", Some(json!({"text": id}))),
            enqueued_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let file = QueueFile::new(dir.path().join("absent.json"));
        assert!(file.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_preserves_order() {
        let dir = TempDir::new().unwrap();
        let file = QueueFile::new(dir.path().join("nested/queue.json"));
        let records = vec![QueueRecord::Known(item("a")), QueueRecord::Known(item("b"))];

        file.save(&records).await.unwrap();
        let loaded = file.load().await.unwrap();

        assert_eq!(loaded, records);
        assert!(!dir.path().join("nested/queue.tmp").exists());
    }

    #[tokio::test]
    async fn unknown_records_survive_a_rewrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("queue.json");
        let foreign = json!({
            "id": "1-ff",
            "actionKind": "archive",
            "payload": {"endpoint": "/x"},
            "enqueuedAt": "2024-10-19T01:06:40Z"
        });
        let raw = json!([foreign, serde_json::to_value(item("a")).unwrap()]);
        std::fs::write(&path, raw.to_string()).unwrap();

        let file = QueueFile::new(&path);
        let loaded = file.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded[0].as_item().is_none());
        assert_eq!(loaded[0].id(), Some("1-ff"));
        assert_eq!(loaded[1].id(), Some("a"));

        file.save(&loaded).await.unwrap();
        let on_disk: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk[0], foreign);
    }

    #[tokio::test]
    async fn non_array_content_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("queue.json");
        std::fs::write(&path, r#"{"items": []}"#).unwrap();

        let err = QueueFile::new(&path).load().await.unwrap_err();
        assert!(matches!(err, QueueError::Corrupted { .. }));
    }
}
