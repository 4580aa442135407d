// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Falzwerk Batch — job/queue state machines, the sequential batch
// orchestrator, durable result history, and the service facades. This crate
// bridges between the core domain types in `falzwerk-core` and the PDF
// engine in `falzwerk-document`.

pub mod history;
pub mod naming;
pub mod orchestrator;
pub mod queue;
pub mod service;

pub use history::ResultStore;
pub use orchestrator::{BatchOrchestrator, BatchSnapshot};
pub use queue::{BatchQueue, JobItem, JobItemState, QueueState};
pub use service::BatchService;
