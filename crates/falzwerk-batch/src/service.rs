// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — wires an orchestrator, a processor, and a history store
// into one facade per operation. The compression and split services are two
// configurations of the same design.
//
// The history store is `Send` but mutated from the control flow only, so a
// plain `Mutex` is enough; there is never more than one in-flight write.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::info;

use falzwerk_core::data_dir;
use falzwerk_core::error::Result;
use falzwerk_core::processor::DocumentProcessor;
use falzwerk_core::types::{
    BatchSettings, CompressionQuality, RecordId, ResultRecord, SourceDocument, SplitMode,
};
use falzwerk_core::AppConfig;
use falzwerk_document::{CompressProcessor, SplitProcessor};

use crate::history::ResultStore;
use crate::orchestrator::{BatchOrchestrator, BatchSnapshot};

const CONFIG_FILE: &str = "config.json";

/// One batch service: orchestrator plus durable history for one operation.
pub struct BatchService {
    orchestrator: BatchOrchestrator,
    history: Mutex<ResultStore>,
}

impl BatchService {
    /// The compression service, writing outputs under `compressed/` and
    /// history to `compression_history.json`.
    pub fn compression(config: &AppConfig) -> Self {
        Self::with_parts(
            Arc::new(CompressProcessor),
            data_dir::data_subdir("compressed"),
            data_dir::data_dir().join("compression_history.json"),
            data_dir::data_dir(),
            config.history_cap,
        )
    }

    /// The split service, writing outputs under `split/` and history to
    /// `split_history.json`.
    pub fn split(config: &AppConfig) -> Self {
        Self::with_parts(
            Arc::new(SplitProcessor),
            data_dir::data_subdir("split"),
            data_dir::data_dir().join("split_history.json"),
            data_dir::data_dir(),
            config.history_cap,
        )
    }

    /// Assemble a service from explicit parts (used by tests and by callers
    /// with non-default layouts).
    pub fn with_parts(
        processor: Arc<dyn DocumentProcessor>,
        output_dir: PathBuf,
        history_path: PathBuf,
        document_root: PathBuf,
        history_cap: usize,
    ) -> Self {
        Self {
            orchestrator: BatchOrchestrator::new(processor, output_dir),
            history: Mutex::new(ResultStore::open(history_path, document_root, history_cap)),
        }
    }

    // -- Batch execution ------------------------------------------------------

    /// Run a batch and hydrate every produced record into the history store.
    pub async fn start_batch(
        &self,
        documents: Vec<SourceDocument>,
        settings: BatchSettings,
    ) -> Result<Vec<ResultRecord>> {
        let records = self.orchestrator.start_batch(documents, settings).await?;
        self.hydrate(&records);
        Ok(records)
    }

    /// Resume the active batch; newly produced records are hydrated into the
    /// history store.
    pub async fn resume_batch(&self) -> Result<Vec<ResultRecord>> {
        let already_stored: Vec<RecordId> = {
            let history = self.history.lock().expect("history lock poisoned");
            history.entries().iter().map(|r| r.id).collect()
        };

        let records = self.orchestrator.resume_batch().await?;
        let fresh: Vec<ResultRecord> = records
            .iter()
            .filter(|record| !already_stored.contains(&record.id))
            .cloned()
            .collect();
        self.hydrate(&fresh);
        Ok(records)
    }

    fn hydrate(&self, records: &[ResultRecord]) {
        if records.is_empty() {
            return;
        }
        let mut history = self.history.lock().expect("history lock poisoned");
        for record in records {
            history.add_entry(record.clone());
        }
        info!(count = records.len(), "batch records hydrated into history");
    }

    // -- Batch control --------------------------------------------------------

    pub fn cancel_batch(&self) {
        self.orchestrator.cancel_batch();
    }

    pub fn pause_batch(&self) -> bool {
        self.orchestrator.pause_batch()
    }

    pub fn skip_current_item(&self) -> bool {
        self.orchestrator.skip_current_item()
    }

    pub fn clear_queue(&self) {
        self.orchestrator.clear_queue();
    }

    pub fn snapshot(&self) -> Option<BatchSnapshot> {
        self.orchestrator.snapshot()
    }

    /// Aggregate results of the active batch, in input order.
    pub fn batch_results(&self) -> Vec<ResultRecord> {
        self.orchestrator.results()
    }

    // -- History --------------------------------------------------------------

    /// Stored records, newest first.
    pub fn history(&self) -> Vec<ResultRecord> {
        let history = self.history.lock().expect("history lock poisoned");
        history.entries().to_vec()
    }

    pub fn delete_history_entry(&self, id: RecordId) {
        let mut history = self.history.lock().expect("history lock poisoned");
        history.delete_entry(id);
    }

    pub fn delete_history_entries(&self, ids: &[RecordId]) {
        let mut history = self.history.lock().expect("history lock poisoned");
        history.delete_entries(ids);
    }

    pub fn clear_history(&self) {
        let mut history = self.history.lock().expect("history lock poisoned");
        history.clear_all();
    }
}

/// Convenience settings constructors mirroring the two service variants.
pub fn compression_settings(quality: CompressionQuality) -> BatchSettings {
    BatchSettings::Compress { quality }
}

pub fn split_settings(mode: SplitMode) -> BatchSettings {
    BatchSettings::Split { mode }
}

// -- Config persistence -------------------------------------------------------

/// Load the persisted app config, or defaults when missing or unreadable.
pub fn load_config() -> AppConfig {
    let path = data_dir::data_dir().join(CONFIG_FILE);
    std::fs::read_to_string(&path)
        .ok()
        .and_then(|data| serde_json::from_str(&data).ok())
        .unwrap_or_default()
}

/// Persist the app config as pretty JSON under the data dir.
pub fn persist_config(config: &AppConfig) -> Result<()> {
    let path = data_dir::data_dir().join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use falzwerk_core::error::FalzwerkError;
    use falzwerk_core::types::OperationMetrics;

    /// Stub processor that writes a real output file, so history
    /// reconciliation sees it.
    struct FileWritingProcessor;

    impl DocumentProcessor for FileWritingProcessor {
        fn process(
            &self,
            source: &SourceDocument,
            _settings: &BatchSettings,
            output: &Path,
        ) -> Result<ResultRecord> {
            std::fs::write(output, b"%PDF-1.5 stub output")?;
            Ok(ResultRecord::new(
                output.to_path_buf(),
                source.name.clone(),
                OperationMetrics::Compression {
                    original_bytes: source.size_bytes,
                    compressed_bytes: source.size_bytes / 2,
                    duration_ms: 1,
                },
            ))
        }
    }

    fn documents(count: usize) -> Vec<SourceDocument> {
        (0..count)
            .map(|i| SourceDocument {
                path: PathBuf::from(format!("/tmp/doc{i}.pdf")),
                name: format!("doc{i}.pdf"),
                size_bytes: 1000,
            })
            .collect()
    }

    fn service(root: &Path) -> BatchService {
        BatchService::with_parts(
            Arc::new(FileWritingProcessor),
            root.to_path_buf(),
            root.join("history.json"),
            root.to_path_buf(),
            50,
        )
    }

    #[tokio::test]
    async fn completed_batch_hydrates_history_newest_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let svc = service(dir.path());

        let records = svc
            .start_batch(documents(3), compression_settings(CompressionQuality::Medium))
            .await
            .expect("batch");
        assert_eq!(records.len(), 3);

        let history = svc.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].id, records[2].id);
    }

    #[tokio::test]
    async fn resume_does_not_duplicate_history_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let svc = service(dir.path());

        svc.start_batch(documents(2), compression_settings(CompressionQuality::Medium))
            .await
            .expect("batch");
        assert_eq!(svc.history().len(), 2);

        // Nothing remains, so resume returns the accumulated results and
        // must not hydrate them a second time.
        let records = svc.resume_batch().await.expect("resume");
        assert_eq!(records.len(), 2);
        assert_eq!(svc.history().len(), 2);
    }

    #[tokio::test]
    async fn empty_batch_error_passes_through() {
        let dir = tempfile::tempdir().expect("tempdir");
        let svc = service(dir.path());
        assert!(matches!(
            svc.start_batch(Vec::new(), compression_settings(CompressionQuality::Low))
                .await,
            Err(FalzwerkError::EmptyBatch)
        ));
        assert!(svc.history().is_empty());
    }

    #[tokio::test]
    async fn history_survives_service_restart() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let svc = service(dir.path());
            svc.start_batch(documents(2), compression_settings(CompressionQuality::High))
                .await
                .expect("batch");
        }

        let restarted = service(dir.path());
        assert_eq!(restarted.history().len(), 2);
    }

    #[tokio::test]
    async fn clear_history_deletes_outputs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let svc = service(dir.path());
        let records = svc
            .start_batch(documents(1), compression_settings(CompressionQuality::Low))
            .await
            .expect("batch");

        assert!(records[0].output_path.exists());
        svc.clear_history();
        assert!(svc.history().is_empty());
        assert!(!records[0].output_path.exists());
    }
}
