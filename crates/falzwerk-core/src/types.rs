// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Falzwerk PDF toolbox.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FalzwerkError, Result};

/// Unique identifier for one item of work within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a completed-operation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user-selected source document. Read-only after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Absolute path to the file on disk.
    pub path: PathBuf,
    /// Display name (file stem plus extension).
    pub name: String,
    /// File size in bytes at selection time.
    pub size_bytes: u64,
}

impl SourceDocument {
    /// Build a document reference from a filesystem path, reading its size.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_owned());

        Ok(Self {
            path,
            name,
            size_bytes: metadata.len(),
        })
    }

    /// The file stem used when deriving output names.
    pub fn stem(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_owned())
    }
}

/// Compression quality levels offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionQuality {
    /// Smallest output, visibly reduced image quality.
    Low,
    /// Balanced output (default).
    Medium,
    /// Largest output, near-original image quality.
    High,
}

impl CompressionQuality {
    /// JPEG encoder quality (1–100) used when re-encoding embedded images.
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            Self::Low => 40,
            Self::Medium => 60,
            Self::High => 80,
        }
    }

    /// Short label used in derived output file names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Default for CompressionQuality {
    fn default() -> Self {
        Self::Medium
    }
}

/// An inclusive, 1-indexed page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// Validate the range against a document's page count.
    pub fn validate(&self, total_pages: u32) -> Result<()> {
        if self.start == 0 || self.start > self.end || self.end > total_pages {
            return Err(FalzwerkError::InvalidPageRange(format!(
                "{}-{} (document has {} pages)",
                self.start, self.end, total_pages
            )));
        }
        Ok(())
    }

    pub fn page_count(&self) -> u32 {
        self.end - self.start + 1
    }
}

/// How a document is divided by the split operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitMode {
    /// One output file per page.
    SinglePages,
    /// Fixed-size chunks; the last part may be shorter.
    EveryN { pages: u32 },
    /// Extract a single contiguous range into one output file.
    Range(PageRange),
}

/// Operation configuration for a batch. Immutable for the queue's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchSettings {
    Compress { quality: CompressionQuality },
    Split { mode: SplitMode },
}

impl BatchSettings {
    /// Short label used in derived output file names.
    pub fn label(&self) -> String {
        match self {
            Self::Compress { quality } => format!("compressed_{}", quality.label()),
            Self::Split { .. } => "split".to_owned(),
        }
    }
}

/// Operation-specific metrics attached to a completed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationMetrics {
    Compression {
        original_bytes: u64,
        compressed_bytes: u64,
        duration_ms: u64,
    },
    Split {
        source_pages: u32,
        parts: u32,
    },
}

/// Durable record of one successfully completed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: RecordId,
    /// Absolute path to the produced file (or part directory for multi-part
    /// splits) while in memory. Persisted in path-relative form.
    pub output_path: PathBuf,
    /// Display name of the source document this record was produced from.
    pub source_name: String,
    pub metrics: OperationMetrics,
    pub created_at: DateTime<Utc>,
}

impl ResultRecord {
    pub fn new(output_path: PathBuf, source_name: String, metrics: OperationMetrics) -> Self {
        Self {
            id: RecordId::new(),
            output_path,
            source_name,
            metrics,
            created_at: Utc::now(),
        }
    }

    /// Bytes saved by compression, zero for other operations or when the
    /// output grew.
    pub fn bytes_saved(&self) -> u64 {
        match self.metrics {
            OperationMetrics::Compression {
                original_bytes,
                compressed_bytes,
                ..
            } => original_bytes.saturating_sub(compressed_bytes),
            OperationMetrics::Split { .. } => 0,
        }
    }
}
