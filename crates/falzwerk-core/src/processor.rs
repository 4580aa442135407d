// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The seam between batch orchestration and the PDF engine.

use std::path::Path;

use crate::error::Result;
use crate::types::{BatchSettings, ResultRecord, SourceDocument};

/// External capability that performs the actual document transformation.
///
/// Invoked once per batch item. Implementations are expected to be blocking
/// (callers offload them via `tokio::task::spawn_blocking`) and safe to retry
/// from scratch for a whole item. The `output` path is derived by the caller
/// and guaranteed collision-free; implementations rely on that precondition.
pub trait DocumentProcessor: Send + Sync {
    fn process(
        &self,
        source: &SourceDocument,
        settings: &BatchSettings,
        output: &Path,
    ) -> Result<ResultRecord>;
}
