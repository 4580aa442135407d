// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch orchestrator — drives one queue sequentially against the document
// processor.
//
// One control flow owns all queue and item state; the queue lock is held
// only for brief mutations and never across an await. Each item's work is
// offloaded as a single spawn_blocking call — one in flight at a time, never
// a pool. Cancellation and pause are cooperative: they are observed only at
// item boundaries, so a document already submitted to the processor always
// runs to completion before the batch can stop.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use falzwerk_core::error::{FalzwerkError, Result};
use falzwerk_core::processor::DocumentProcessor;
use falzwerk_core::types::{BatchSettings, ResultRecord, SourceDocument};

use crate::naming::unique_output_path;
use crate::queue::{BatchQueue, JobItem, QueueState};

/// Point-in-time view of the active batch for progress UIs.
#[derive(Debug, Clone)]
pub struct BatchSnapshot {
    pub state: QueueState,
    pub items: Vec<JobItem>,
    /// Count of resolved (completed or failed) items.
    pub completed_count: usize,
    pub total: usize,
}

/// Drives sequential execution of a batch queue and owns its control surface.
pub struct BatchOrchestrator {
    /// The active queue. `None` before the first batch and after `clear_queue`.
    queue: Arc<Mutex<Option<BatchQueue>>>,
    /// Cooperative cancellation flag, checked once per item boundary.
    cancel_requested: Arc<AtomicBool>,
    processor: Arc<dyn DocumentProcessor>,
    /// Directory output paths are derived under.
    output_dir: PathBuf,
}

impl BatchOrchestrator {
    pub fn new(processor: Arc<dyn DocumentProcessor>, output_dir: PathBuf) -> Self {
        Self {
            queue: Arc::new(Mutex::new(None)),
            cancel_requested: Arc::new(AtomicBool::new(false)),
            processor,
            output_dir,
        }
    }

    // -- Batch control --------------------------------------------------------

    /// Run a fresh batch over `documents`, strictly sequentially.
    ///
    /// Fails fast with `EmptyBatch` for an empty document list, before any
    /// queue state is created. A single item failure never aborts the batch.
    /// Returns the records of this run's successful items, in input order.
    pub async fn start_batch(
        &self,
        documents: Vec<SourceDocument>,
        settings: BatchSettings,
    ) -> Result<Vec<ResultRecord>> {
        if documents.is_empty() {
            return Err(FalzwerkError::EmptyBatch);
        }

        info!(count = documents.len(), "starting batch");
        self.cancel_requested.store(false, Ordering::SeqCst);
        {
            let mut guard = self.queue.lock().expect("queue lock poisoned");
            let mut queue = BatchQueue::new(documents, settings);
            queue.begin(0);
            *guard = Some(queue);
        }

        self.run_loop(0).await
    }

    /// Resume an existing queue from its last known completed count.
    ///
    /// Items already in a terminal state are never re-dispatched. If nothing
    /// remains, returns the queue's accumulated results without doing work.
    pub async fn resume_batch(&self) -> Result<Vec<ResultRecord>> {
        let start = {
            let mut guard = self.queue.lock().expect("queue lock poisoned");
            let queue = guard.as_mut().ok_or(FalzwerkError::NoActiveBatch)?;

            let start = queue.completed_count();
            let remaining = queue.items()[start.min(queue.len())..]
                .iter()
                .any(|item| !item.state.is_terminal());
            if !remaining {
                debug!("resume requested with no remaining work");
                // Everything is terminal; a queue left paused can complete.
                queue.finish();
                return Ok(queue.results().to_vec());
            }

            queue.begin(start);
            start
        };

        info!(start, "resuming batch");
        self.cancel_requested.store(false, Ordering::SeqCst);
        self.run_loop(start).await
    }

    /// Request cooperative cancellation. Observed only between items; work
    /// already dispatched to the processor always finishes.
    pub fn cancel_batch(&self) {
        info!("batch cancellation requested");
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    /// Pause the batch. Only valid while processing; the in-flight item is
    /// neither stopped nor delayed. Returns whether the request took effect.
    pub fn pause_batch(&self) -> bool {
        let mut guard = self.queue.lock().expect("queue lock poisoned");
        match guard.as_mut() {
            Some(queue) => {
                let paused = queue.pause();
                if paused {
                    info!("batch paused");
                }
                paused
            }
            None => false,
        }
    }

    /// Skip the item at the queue's current index without invoking the
    /// processor. A result arriving later for a skipped item is discarded.
    pub fn skip_current_item(&self) -> bool {
        let mut guard = self.queue.lock().expect("queue lock poisoned");
        let Some(queue) = guard.as_mut() else {
            return false;
        };
        let Some(index) = queue.current_index() else {
            return false;
        };
        let skipped = queue.skip_item(index);
        if skipped {
            info!(index, "current item skipped");
        }
        skipped
    }

    /// Release the queue. No further operations are valid against the
    /// cleared batch; callers must start a new one.
    pub fn clear_queue(&self) {
        let mut guard = self.queue.lock().expect("queue lock poisoned");
        *guard = None;
        self.cancel_requested.store(false, Ordering::SeqCst);
        debug!("queue cleared");
    }

    // -- Progress surface -----------------------------------------------------

    /// Snapshot of the active batch, or `None` when no batch exists.
    pub fn snapshot(&self) -> Option<BatchSnapshot> {
        let guard = self.queue.lock().expect("queue lock poisoned");
        guard.as_ref().map(|queue| BatchSnapshot {
            state: queue.state(),
            items: queue.items().to_vec(),
            completed_count: queue.completed_count(),
            total: queue.len(),
        })
    }

    /// The queue's authoritative aggregate result list, in input order.
    pub fn results(&self) -> Vec<ResultRecord> {
        let guard = self.queue.lock().expect("queue lock poisoned");
        guard
            .as_ref()
            .map(|queue| queue.results().to_vec())
            .unwrap_or_default()
    }

    // -- Run loop -------------------------------------------------------------

    /// Sequential execution from item `start` to the end of the queue.
    async fn run_loop(&self, start: usize) -> Result<Vec<ResultRecord>> {
        let total = {
            let guard = self.queue.lock().expect("queue lock poisoned");
            guard.as_ref().ok_or(FalzwerkError::NoActiveBatch)?.len()
        };

        let mut produced = Vec::new();
        let mut ran_to_end = true;

        for index in start..total {
            // Item boundary: cancellation check.
            if self.cancel_requested.load(Ordering::SeqCst) {
                let mut guard = self.queue.lock().expect("queue lock poisoned");
                if let Some(queue) = guard.as_mut() {
                    queue.cancel();
                }
                info!(index, "batch cancelled at item boundary");
                ran_to_end = false;
                break;
            }

            // Item boundary: pause check and dispatch preparation.
            enum Step {
                Dispatch(SourceDocument, BatchSettings),
                SkipTerminal,
                Paused,
                QueueGone,
            }
            let step = {
                let mut guard = self.queue.lock().expect("queue lock poisoned");
                match guard.as_mut() {
                    None => Step::QueueGone,
                    Some(queue) if queue.is_paused() => Step::Paused,
                    Some(queue) => {
                        queue.advance_to(index);
                        if queue.items()[index].state.is_terminal() {
                            Step::SkipTerminal
                        } else {
                            queue.mark_processing(index);
                            Step::Dispatch(queue.items()[index].document.clone(), *queue.settings())
                        }
                    }
                }
            };

            let (document, settings) = match step {
                Step::Dispatch(document, settings) => (document, settings),
                Step::SkipTerminal => continue,
                Step::Paused => {
                    info!(index, "batch paused at item boundary");
                    ran_to_end = false;
                    break;
                }
                Step::QueueGone => {
                    warn!("queue cleared while running, stopping");
                    return Ok(produced);
                }
            };

            // Bounded single-slot worker: dispatch one unit of work and
            // suspend until it reports back. This is the loop's only
            // suspension point.
            let output = unique_output_path(&self.output_dir, &document, &settings);
            let processor = Arc::clone(&self.processor);
            let worker = tokio::task::spawn_blocking(move || {
                processor.process(&document, &settings, &output)
            });

            match worker.await {
                Ok(Ok(record)) => {
                    let mut guard = self.queue.lock().expect("queue lock poisoned");
                    if let Some(queue) = guard.as_mut() {
                        if queue.complete_item(index, record.clone()) {
                            produced.push(record);
                        } else {
                            debug!(index, "result for skipped item discarded");
                        }
                    }
                }
                Ok(Err(err)) => {
                    warn!(index, %err, "item failed, continuing batch");
                    let mut guard = self.queue.lock().expect("queue lock poisoned");
                    if let Some(queue) = guard.as_mut() {
                        queue.fail_item(index, err.to_string());
                    }
                }
                Err(join_err) => {
                    warn!(index, %join_err, "worker task failed, continuing batch");
                    let mut guard = self.queue.lock().expect("queue lock poisoned");
                    if let Some(queue) = guard.as_mut() {
                        queue.fail_item(index, format!("processing task failed: {join_err}"));
                    }
                }
            }
        }

        if ran_to_end {
            let mut guard = self.queue.lock().expect("queue lock poisoned");
            if let Some(queue) = guard.as_mut() {
                queue.finish();
                info!(
                    completed = queue.completed_count(),
                    total = queue.len(),
                    "batch finished"
                );
            }
        }

        Ok(produced)
    }
}
