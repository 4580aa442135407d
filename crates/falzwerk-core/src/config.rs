// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default compression quality for new batches.
    pub default_quality: crate::CompressionQuality,
    /// Maximum number of entries kept per history store (oldest evicted).
    pub history_cap: usize,
    /// Whether imported documents replace existing files with the same
    /// content hash (if false, duplicates are imported under a new name).
    pub dedup_imports: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_quality: crate::CompressionQuality::Medium,
            history_cap: 50,
            dedup_imports: true,
        }
    }
}
