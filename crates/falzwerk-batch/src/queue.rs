// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch queue — the state of one batch run.
//
// A queue owns an ordered list of job items plus aggregate state. Item order
// is fixed at construction and defines both processing order and result
// index correspondence. All mutation goes through the orchestrator driving
// this queue; items that reached a terminal state are immutable.

use falzwerk_core::types::{BatchSettings, ItemId, ResultRecord, SourceDocument};

/// Lifecycle states of a single job item.
#[derive(Debug, Clone, PartialEq)]
pub enum JobItemState {
    /// Not yet reached by the run loop.
    Pending,
    /// Dispatched to the document processor.
    Processing { progress: f32 },
    /// Processor finished successfully.
    Completed(ResultRecord),
    /// Processor failed — the batch continues without this item.
    Failed { reason: String },
    /// Explicitly skipped without invoking the processor.
    Skipped,
}

impl JobItemState {
    /// Completed, Failed, and Skipped are terminal: no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed(_) | Self::Failed { .. } | Self::Skipped
        )
    }

    /// Whether this item counts towards the queue's completed count.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed { .. })
    }
}

/// One document's unit of work within a batch.
#[derive(Debug, Clone)]
pub struct JobItem {
    pub id: ItemId,
    /// Source document reference, read-only after creation.
    pub document: SourceDocument,
    pub state: JobItemState,
}

/// Lifecycle states of a batch queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Created but not yet started.
    Idle,
    /// Working through items; `current` is the index being processed or last
    /// processed.
    Processing { current: usize, total: usize },
    /// Pause requested; the in-flight item was allowed to finish.
    Paused { current: usize, total: usize },
    /// Cancellation observed at an item boundary. Terminal for this run.
    Cancelled,
    /// All items resolved. Terminal for this run.
    Completed,
}

/// One batch run: ordered job items, immutable settings, aggregate results.
#[derive(Debug, Clone)]
pub struct BatchQueue {
    items: Vec<JobItem>,
    settings: BatchSettings,
    state: QueueState,
    /// Records of successful items, in input order.
    results: Vec<ResultRecord>,
}

impl BatchQueue {
    /// Build a queue with one pending item per document, in input order.
    pub fn new(documents: Vec<SourceDocument>, settings: BatchSettings) -> Self {
        let items = documents
            .into_iter()
            .map(|document| JobItem {
                id: ItemId::new(),
                document,
                state: JobItemState::Pending,
            })
            .collect();

        Self {
            items,
            settings,
            state: QueueState::Idle,
            results: Vec::new(),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn items(&self) -> &[JobItem] {
        &self.items
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    pub fn state(&self) -> QueueState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Aggregate results of this run so far, in input order.
    pub fn results(&self) -> &[ResultRecord] {
        &self.results
    }

    /// Count of items in a resolved state (completed or failed).
    /// Always <= `len()`.
    pub fn completed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.state.is_resolved())
            .count()
    }

    /// Index of the item currently being processed or last processed.
    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            QueueState::Processing { current, .. } | QueueState::Paused { current, .. } => {
                Some(current)
            }
            _ => None,
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, QueueState::Paused { .. })
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.state, QueueState::Processing { .. })
    }

    // -- Queue transitions ----------------------------------------------------

    /// Enter `Processing` starting at item `at`. Valid from `Idle`, `Paused`,
    /// and (for resumed runs) `Cancelled`.
    pub fn begin(&mut self, at: usize) {
        match self.state {
            QueueState::Idle | QueueState::Paused { .. } | QueueState::Cancelled => {
                self.state = QueueState::Processing {
                    current: at.min(self.items.len().saturating_sub(1)),
                    total: self.items.len(),
                };
            }
            _ => {}
        }
    }

    /// Move the current index forward while processing.
    pub fn advance_to(&mut self, index: usize) {
        if let QueueState::Processing { total, .. } = self.state {
            self.state = QueueState::Processing {
                current: index,
                total,
            };
        }
    }

    /// Pause request. Only valid while processing; the in-flight item is not
    /// interrupted.
    pub fn pause(&mut self) -> bool {
        if let QueueState::Processing { current, total } = self.state {
            self.state = QueueState::Paused { current, total };
            true
        } else {
            false
        }
    }

    /// Cancellation observed at an item boundary.
    pub fn cancel(&mut self) {
        if matches!(self.state, QueueState::Processing { .. }) {
            self.state = QueueState::Cancelled;
        }
    }

    /// All items reached a terminal state without cancellation. Also valid
    /// from `Paused`: a pause request during the final item has nothing left
    /// to hold back.
    pub fn finish(&mut self) {
        if matches!(
            self.state,
            QueueState::Processing { .. } | QueueState::Paused { .. }
        ) {
            self.state = QueueState::Completed;
        }
    }

    // -- Item transitions -----------------------------------------------------

    /// Mark the item at `index` as dispatched. No-op for terminal items.
    pub fn mark_processing(&mut self, index: usize) -> bool {
        self.set_item_state(index, JobItemState::Processing { progress: 0.0 })
    }

    /// Update in-flight progress for the item at `index`.
    pub fn set_item_progress(&mut self, index: usize, progress: f32) {
        if let Some(item) = self.items.get_mut(index)
            && matches!(item.state, JobItemState::Processing { .. })
        {
            item.state = JobItemState::Processing {
                progress: progress.clamp(0.0, 1.0),
            };
        }
    }

    /// Record a successful result for the item at `index` and append it to
    /// the aggregate result list. Returns false (and discards nothing but the
    /// transition) when the item already reached a terminal state, e.g. it
    /// was skipped while in flight.
    pub fn complete_item(&mut self, index: usize, record: ResultRecord) -> bool {
        if self.set_item_state(index, JobItemState::Completed(record.clone())) {
            self.results.push(record);
            true
        } else {
            false
        }
    }

    /// Mark the item at `index` as failed with a human-readable reason.
    pub fn fail_item(&mut self, index: usize, reason: impl Into<String>) -> bool {
        self.set_item_state(
            index,
            JobItemState::Failed {
                reason: reason.into(),
            },
        )
    }

    /// Skip the item at `index` without invoking the processor.
    pub fn skip_item(&mut self, index: usize) -> bool {
        self.set_item_state(index, JobItemState::Skipped)
    }

    fn set_item_state(&mut self, index: usize, state: JobItemState) -> bool {
        match self.items.get_mut(index) {
            Some(item) if !item.state.is_terminal() => {
                item.state = state;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use falzwerk_core::types::{CompressionQuality, OperationMetrics};
    use std::path::PathBuf;

    fn documents(count: usize) -> Vec<SourceDocument> {
        (0..count)
            .map(|i| SourceDocument {
                path: PathBuf::from(format!("/tmp/doc{i}.pdf")),
                name: format!("doc{i}.pdf"),
                size_bytes: 1000,
            })
            .collect()
    }

    fn settings() -> BatchSettings {
        BatchSettings::Compress {
            quality: CompressionQuality::Medium,
        }
    }

    fn record(name: &str) -> ResultRecord {
        ResultRecord::new(
            PathBuf::from(format!("/tmp/{name}")),
            name.to_owned(),
            OperationMetrics::Compression {
                original_bytes: 1000,
                compressed_bytes: 500,
                duration_ms: 5,
            },
        )
    }

    #[test]
    fn new_queue_has_one_pending_item_per_document() {
        let queue = BatchQueue::new(documents(3), settings());
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.state(), QueueState::Idle);
        assert!(
            queue
                .items()
                .iter()
                .all(|item| item.state == JobItemState::Pending)
        );
        assert_eq!(queue.completed_count(), 0);
    }

    #[test]
    fn full_lifecycle_reaches_completed() {
        let mut queue = BatchQueue::new(documents(2), settings());
        queue.begin(0);
        assert_eq!(
            queue.state(),
            QueueState::Processing {
                current: 0,
                total: 2
            }
        );

        queue.mark_processing(0);
        assert!(queue.complete_item(0, record("a.pdf")));
        queue.advance_to(1);
        queue.mark_processing(1);
        assert!(queue.complete_item(1, record("b.pdf")));

        queue.finish();
        assert_eq!(queue.state(), QueueState::Completed);
        assert_eq!(queue.completed_count(), 2);
        assert_eq!(queue.results().len(), 2);
    }

    #[test]
    fn failed_items_count_as_resolved() {
        let mut queue = BatchQueue::new(documents(2), settings());
        queue.begin(0);
        queue.mark_processing(0);
        queue.fail_item(0, "broken xref table");

        assert_eq!(queue.completed_count(), 1);
        assert!(matches!(
            queue.items()[0].state,
            JobItemState::Failed { ref reason } if reason == "broken xref table"
        ));
    }

    #[test]
    fn terminal_items_are_immutable() {
        let mut queue = BatchQueue::new(documents(1), settings());
        queue.begin(0);
        queue.mark_processing(0);
        assert!(queue.skip_item(0));

        // No transition out of Skipped, and no result recorded.
        assert!(!queue.complete_item(0, record("a.pdf")));
        assert!(!queue.fail_item(0, "late failure"));
        assert_eq!(queue.items()[0].state, JobItemState::Skipped);
        assert!(queue.results().is_empty());
        assert_eq!(queue.completed_count(), 0);
    }

    #[test]
    fn pause_only_valid_while_processing() {
        let mut queue = BatchQueue::new(documents(2), settings());
        assert!(!queue.pause());

        queue.begin(0);
        assert!(queue.pause());
        assert_eq!(
            queue.state(),
            QueueState::Paused {
                current: 0,
                total: 2
            }
        );
        assert!(!queue.pause());
    }

    #[test]
    fn resume_from_paused_preserves_position() {
        let mut queue = BatchQueue::new(documents(3), settings());
        queue.begin(0);
        queue.advance_to(1);
        queue.pause();

        queue.begin(1);
        assert_eq!(
            queue.state(),
            QueueState::Processing {
                current: 1,
                total: 3
            }
        );
    }

    #[test]
    fn finish_completes_a_paused_queue_with_all_items_resolved() {
        let mut queue = BatchQueue::new(documents(1), settings());
        queue.begin(0);
        queue.mark_processing(0);
        queue.pause();
        assert!(queue.complete_item(0, record("a.pdf")));

        queue.finish();
        assert_eq!(queue.state(), QueueState::Completed);
    }

    #[test]
    fn cancel_is_terminal_for_the_run() {
        let mut queue = BatchQueue::new(documents(2), settings());
        queue.begin(0);
        queue.cancel();
        assert_eq!(queue.state(), QueueState::Cancelled);

        // finish() after cancel must not overwrite the terminal state.
        queue.finish();
        assert_eq!(queue.state(), QueueState::Cancelled);
    }

    #[test]
    fn progress_updates_only_apply_in_flight() {
        let mut queue = BatchQueue::new(documents(1), settings());
        queue.begin(0);

        // Pending item ignores progress updates.
        queue.set_item_progress(0, 0.5);
        assert_eq!(queue.items()[0].state, JobItemState::Pending);

        queue.mark_processing(0);
        queue.set_item_progress(0, 2.0);
        assert_eq!(
            queue.items()[0].state,
            JobItemState::Processing { progress: 1.0 }
        );
    }
}
