//! Offline sync queue.
//!
//! Entry and customer mutations made while offline are parked here and
//! replayed against the remote API once connectivity returns. The queue
//! is a single JSON file next to the app's other local data; a missing
//! or corrupt file degrades to an empty queue rather than blocking the
//! user.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueAction {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: String,
    pub action: QueueAction,
    pub data: Value,
    /// Enqueue time, epoch milliseconds.
    pub timestamp: i64,
    #[serde(default)]
    pub retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_retry: Option<i64>,
}

/// Outcome of one [`SyncQueue::process`] drain.
#[derive(Debug, Serialize)]
pub struct ProcessSummary {
    pub success: bool,
    pub processed: usize,
    /// `(item id, error message)` per failed item.
    pub errors: Vec<(String, String)>,
    pub remaining: usize,
}

pub struct SyncQueue {
    path: PathBuf,
}

impl SyncQueue {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read all pending items. Missing or unparseable files yield an
    /// empty queue.
    pub fn load(&self) -> Vec<QueueItem> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(err) => {
                warn!(error = %err, path = %self.path.display(), "Corrupt sync queue file, starting empty");
                Vec::new()
            }
        }
    }

    fn save(&self, items: &[QueueItem]) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| format!("create queue dir: {e}"))?;
        }
        let text =
            serde_json::to_string_pretty(items).map_err(|e| format!("serialize queue: {e}"))?;
        std::fs::write(&self.path, text).map_err(|e| format!("write queue: {e}"))
    }

    /// Park a mutation for later replay.
    pub fn add(&self, action: QueueAction, data: Value) -> Result<QueueItem, String> {
        let item = QueueItem {
            id: Uuid::new_v4().to_string(),
            action,
            data,
            timestamp: Utc::now().timestamp_millis(),
            retries: 0,
            last_retry: None,
        };
        let mut items = self.load();
        items.push(item.clone());
        self.save(&items)?;
        info!(id = %item.id, pending = items.len(), "Queued offline mutation");
        Ok(item)
    }

    /// Drop an item after a successful sync.
    pub fn remove(&self, id: &str) -> Result<Vec<QueueItem>, String> {
        let mut items = self.load();
        items.retain(|item| item.id != id);
        self.save(&items)?;
        Ok(items)
    }

    /// Record a failed replay attempt.
    pub fn increment_retry(&self, id: &str) -> Result<(), String> {
        let mut items = self.load();
        if let Some(item) = items.iter_mut().find(|item| item.id == id) {
            item.retries += 1;
            item.last_retry = Some(Utc::now().timestamp_millis());
        }
        self.save(&items)
    }

    pub fn pending_count(&self) -> usize {
        self.load().len()
    }

    /// Remove the queue file entirely.
    pub fn clear(&self) -> Result<(), String> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(format!("clear queue: {err}")),
        }
    }

    /// Replay every pending item through `handler`. Successes are
    /// removed from the queue; failures stay with their retry count
    /// bumped.
    pub fn process<F>(&self, mut handler: F) -> Result<ProcessSummary, String>
    where
        F: FnMut(&QueueItem) -> Result<(), String>,
    {
        let items = self.load();
        if items.is_empty() {
            return Ok(ProcessSummary {
                success: true,
                processed: 0,
                errors: Vec::new(),
                remaining: 0,
            });
        }

        let mut processed = 0;
        let mut errors = Vec::new();

        for item in &items {
            match handler(item) {
                Ok(()) => {
                    self.remove(&item.id)?;
                    processed += 1;
                }
                Err(err) => {
                    warn!(id = %item.id, error = %err, "Sync replay failed");
                    self.increment_retry(&item.id)?;
                    errors.push((item.id.clone(), err));
                }
            }
        }

        let remaining = self.pending_count();
        info!(processed, remaining, "Sync queue drained");
        Ok(ProcessSummary {
            success: errors.is_empty(),
            processed,
            errors,
            remaining,
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn queue_in(dir: &tempfile::TempDir) -> SyncQueue {
        SyncQueue::new(dir.path().join("sync-queue.json"))
    }

    #[test]
    fn test_missing_file_is_empty_queue() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(&dir);
        assert!(queue.load().is_empty());
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_corrupt_file_is_empty_queue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync-queue.json");
        std::fs::write(&path, "not json{").unwrap();
        assert!(SyncQueue::new(&path).load().is_empty());
    }

    #[test]
    fn test_add_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(&dir);

        let item = queue
            .add(QueueAction::Create, json!({"name": "Amit"}))
            .unwrap();
        let loaded = queue.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], item);
        assert_eq!(loaded[0].retries, 0);
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(&dir);

        let a = queue.add(QueueAction::Create, json!({"n": 1})).unwrap();
        let b = queue.add(QueueAction::Delete, json!({"n": 2})).unwrap();

        let left = queue.remove(&a.id).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, b.id);
    }

    #[test]
    fn test_increment_retry() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(&dir);

        let item = queue.add(QueueAction::Update, json!({})).unwrap();
        queue.increment_retry(&item.id).unwrap();
        queue.increment_retry(&item.id).unwrap();

        let loaded = queue.load();
        assert_eq!(loaded[0].retries, 2);
        assert!(loaded[0].last_retry.is_some());
    }

    #[test]
    fn test_process_drains_successes() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(&dir);
        queue.add(QueueAction::Create, json!({"n": 1})).unwrap();
        queue.add(QueueAction::Create, json!({"n": 2})).unwrap();

        let summary = queue.process(|_| Ok(())).unwrap();
        assert!(summary.success);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.remaining, 0);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_process_keeps_failures_with_retry() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(&dir);
        queue.add(QueueAction::Create, json!({"ok": true})).unwrap();
        queue
            .add(QueueAction::Delete, json!({"ok": false}))
            .unwrap();

        let summary = queue
            .process(|item| {
                if item.action == QueueAction::Delete {
                    Err("offline".to_string())
                } else {
                    Ok(())
                }
            })
            .unwrap();

        assert!(!summary.success);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.remaining, 1);

        let left = queue.load();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].retries, 1);
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(&dir);
        queue.add(QueueAction::Create, json!({})).unwrap();
        queue.clear().unwrap();
        assert_eq!(queue.pending_count(), 0);
        // Clearing an already-missing file is fine.
        queue.clear().unwrap();
    }

    #[test]
    fn test_empty_process_summary() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(&dir);
        let summary = queue.process(|_| Ok(())).unwrap();
        assert!(summary.success);
        assert_eq!(summary.processed, 0);
    }
}
