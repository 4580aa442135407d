// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result store — durable, capped history of completed operations.
//
// Entries are persisted as one JSON list. Output locations are stored
// relative to the document root, never absolute: absolute paths are unstable
// across reinstalls and container moves, so they are normalized on write and
// re-rooted on read. Records whose backing file disappeared are dropped at
// load time and the file is rewritten once without them.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use falzwerk_core::types::{OperationMetrics, RecordId, ResultRecord};

/// On-disk projection of a `ResultRecord`: identical fields, but the output
/// location is a path relative to the document root.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    id: RecordId,
    relative_path: PathBuf,
    source_name: String,
    metrics: OperationMetrics,
    created_at: DateTime<Utc>,
}

/// Durable record store for completed operations, independent of any single
/// queue's lifetime. Newest entries sit at the front; the store is capped
/// and evicts oldest-first.
pub struct ResultStore {
    /// Path of the JSON file backing this store.
    path: PathBuf,
    /// Document root that relative paths are resolved against.
    root: PathBuf,
    cap: usize,
    entries: Vec<ResultRecord>,
}

impl ResultStore {
    /// Open the store at `path`, loading synchronously and reconciling
    /// against the filesystem. A missing or unreadable file means an empty
    /// history; stale entries (backing file gone) are dropped and the store
    /// is rewritten once if any were dropped.
    pub fn open(path: PathBuf, root: PathBuf, cap: usize) -> Self {
        let (mut entries, dropped) = load_entries(&path, &root);

        // A lowered cap applies to existing stores too.
        let over_cap = entries.len().saturating_sub(cap);
        entries.truncate(cap);

        let store = Self {
            path,
            root,
            cap,
            entries,
        };
        if dropped > 0 || over_cap > 0 {
            info!(dropped, over_cap, "pruned history entries, rewriting store");
            store.persist();
        }
        store
    }

    /// Records in memory, newest first.
    pub fn entries(&self) -> &[ResultRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert at the front, truncate to the cap, persist.
    pub fn add_entry(&mut self, record: ResultRecord) {
        debug!(id = %record.id, path = %record.output_path.display(), "history entry added");
        self.entries.insert(0, record);
        self.entries.truncate(self.cap);
        self.persist();
    }

    /// Remove the record with `id`, deleting its backing output. A failed
    /// file deletion is non-fatal.
    pub fn delete_entry(&mut self, id: RecordId) {
        self.delete_entries(&[id]);
    }

    /// Remove every record whose id appears in `ids`, deleting their backing
    /// outputs.
    pub fn delete_entries(&mut self, ids: &[RecordId]) {
        self.entries.retain(|record| {
            if ids.contains(&record.id) {
                remove_output(&record.output_path);
                false
            } else {
                true
            }
        });
        self.persist();
    }

    /// Delete all backing outputs and the entire record set.
    pub fn clear_all(&mut self) {
        for record in &self.entries {
            remove_output(&record.output_path);
        }
        self.entries.clear();
        self.persist();
    }

    /// Write the current entries, path-relative, to the backing file.
    /// Persistence failures are logged and swallowed: in-memory state stays
    /// authoritative for the session.
    fn persist(&self) {
        let stored: Vec<StoredRecord> = self
            .entries
            .iter()
            .map(|record| to_stored(record, &self.root))
            .collect();

        let result = serde_json::to_string_pretty(&stored)
            .map_err(|err| err.to_string())
            .and_then(|json| {
                std::fs::write(&self.path, json).map_err(|err| err.to_string())
            });

        if let Err(err) = result {
            warn!(path = %self.path.display(), %err, "failed to persist history");
        }
    }
}

/// Read and reconcile the store file. Returns the surviving records (newest
/// first) and how many stale entries were dropped.
fn load_entries(path: &Path, root: &Path) -> (Vec<ResultRecord>, usize) {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(_) => return (Vec::new(), 0),
    };

    let stored: Vec<StoredRecord> = match serde_json::from_str(&data) {
        Ok(stored) => stored,
        Err(err) => {
            warn!(path = %path.display(), %err, "corrupt history file, starting empty");
            return (Vec::new(), 0);
        }
    };

    let total = stored.len();
    let entries: Vec<ResultRecord> = stored
        .into_iter()
        .map(|record| from_stored(record, root))
        .filter(|record| record.output_path.exists())
        .collect();

    let dropped = total - entries.len();
    (entries, dropped)
}

fn to_stored(record: &ResultRecord, root: &Path) -> StoredRecord {
    // Outputs should live under the root; anything else is stored as-is and
    // resolved unchanged on read.
    let relative_path = record
        .output_path
        .strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| record.output_path.clone());

    StoredRecord {
        id: record.id,
        relative_path,
        source_name: record.source_name.clone(),
        metrics: record.metrics,
        created_at: record.created_at,
    }
}

fn from_stored(record: StoredRecord, root: &Path) -> ResultRecord {
    let output_path = if record.relative_path.is_absolute() {
        record.relative_path
    } else {
        root.join(record.relative_path)
    };

    ResultRecord {
        id: record.id,
        output_path,
        source_name: record.source_name,
        metrics: record.metrics,
        created_at: record.created_at,
    }
}

/// Delete the backing output (file or part directory). Failure is ignored.
fn remove_output(path: &Path) {
    let result = if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    if let Err(err) = result {
        debug!(path = %path.display(), %err, "could not delete output, ignoring");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_file(root: &Path, name: &str) -> ResultRecord {
        let path = root.join(name);
        std::fs::write(&path, b"%PDF-1.5 output").expect("write output");
        ResultRecord::new(
            path,
            name.to_owned(),
            OperationMetrics::Compression {
                original_bytes: 2000,
                compressed_bytes: 800,
                duration_ms: 12,
            },
        )
    }

    fn open_store(dir: &Path, cap: usize) -> ResultStore {
        ResultStore::open(dir.join("history.json"), dir.to_path_buf(), cap)
    }

    #[test]
    fn round_trip_preserves_ids_and_metrics() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = open_store(dir.path(), 50);

        let records: Vec<ResultRecord> = (0..3)
            .map(|i| record_with_file(dir.path(), &format!("out{i}.pdf")))
            .collect();
        for record in &records {
            store.add_entry(record.clone());
        }

        let reloaded = open_store(dir.path(), 50);
        assert_eq!(reloaded.len(), 3);
        // Newest first: insertion order reversed.
        assert_eq!(reloaded.entries()[0].id, records[2].id);
        assert_eq!(reloaded.entries()[2].id, records[0].id);
        assert_eq!(reloaded.entries()[0].metrics, records[2].metrics);
        assert_eq!(reloaded.entries()[0].output_path, records[2].output_path);
    }

    #[test]
    fn stored_paths_are_relative_to_the_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = open_store(dir.path(), 50);
        store.add_entry(record_with_file(dir.path(), "out.pdf"));

        let json = std::fs::read_to_string(dir.path().join("history.json")).expect("read store");
        assert!(json.contains("\"out.pdf\""));
        assert!(!json.contains(&dir.path().display().to_string()));
    }

    #[test]
    fn missing_backing_file_is_dropped_and_store_rewritten() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = open_store(dir.path(), 50);
        let keep = record_with_file(dir.path(), "keep.pdf");
        let stale = record_with_file(dir.path(), "stale.pdf");
        store.add_entry(keep.clone());
        store.add_entry(stale.clone());

        std::fs::remove_file(dir.path().join("stale.pdf")).expect("delete backing file");

        let reloaded = open_store(dir.path(), 50);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.entries()[0].id, keep.id);

        // The rewrite removed the stale entry permanently: recreating the
        // file does not bring the record back.
        std::fs::write(dir.path().join("stale.pdf"), b"back").expect("recreate");
        let again = open_store(dir.path(), 50);
        assert_eq!(again.len(), 1);
    }

    #[test]
    fn cap_eviction_retains_newest_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = open_store(dir.path(), 3);

        let records: Vec<ResultRecord> = (0..5)
            .map(|i| record_with_file(dir.path(), &format!("out{i}.pdf")))
            .collect();
        for record in &records {
            store.add_entry(record.clone());
        }

        assert_eq!(store.len(), 3);
        let ids: Vec<RecordId> = store.entries().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![records[4].id, records[3].id, records[2].id]);
    }

    #[test]
    fn lowered_cap_prunes_an_oversized_store_at_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = open_store(dir.path(), 50);
        let records: Vec<ResultRecord> = (0..5)
            .map(|i| record_with_file(dir.path(), &format!("out{i}.pdf")))
            .collect();
        for record in &records {
            store.add_entry(record.clone());
        }

        let reopened = open_store(dir.path(), 2);
        assert_eq!(reopened.len(), 2);
        let ids: Vec<RecordId> = reopened.entries().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![records[4].id, records[3].id]);

        // The prune was written back.
        let again = open_store(dir.path(), 50);
        assert_eq!(again.len(), 2);
    }

    #[test]
    fn delete_entry_removes_backing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = open_store(dir.path(), 50);
        let record = record_with_file(dir.path(), "out.pdf");
        store.add_entry(record.clone());

        store.delete_entry(record.id);
        assert!(store.is_empty());
        assert!(!dir.path().join("out.pdf").exists());

        // Deleting again is harmless.
        store.delete_entry(record.id);
    }

    #[test]
    fn clear_all_removes_records_and_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = open_store(dir.path(), 50);
        for i in 0..3 {
            store.add_entry(record_with_file(dir.path(), &format!("out{i}.pdf")));
        }

        store.clear_all();
        assert!(store.is_empty());
        for i in 0..3 {
            assert!(!dir.path().join(format!("out{i}.pdf")).exists());
        }
        assert!(open_store(dir.path(), 50).is_empty());
    }

    #[test]
    fn corrupt_store_file_reads_as_empty_history() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("history.json"), b"{not json!").expect("write garbage");

        let store = open_store(dir.path(), 50);
        assert!(store.is_empty());
    }

    #[test]
    fn entries_reroot_against_a_moved_document_root() {
        let old_root = tempfile::tempdir().expect("old root");
        let mut store = open_store(old_root.path(), 50);
        store.add_entry(record_with_file(old_root.path(), "out.pdf"));

        // Simulate a container move: same store file and backing file under
        // a new root.
        let new_root = tempfile::tempdir().expect("new root");
        std::fs::copy(
            old_root.path().join("history.json"),
            new_root.path().join("history.json"),
        )
        .expect("copy store");
        std::fs::copy(
            old_root.path().join("out.pdf"),
            new_root.path().join("out.pdf"),
        )
        .expect("copy output");

        let moved = ResultStore::open(
            new_root.path().join("history.json"),
            new_root.path().to_path_buf(),
            50,
        );
        assert_eq!(moved.len(), 1);
        assert_eq!(
            moved.entries()[0].output_path,
            new_root.path().join("out.pdf")
        );
    }
}
