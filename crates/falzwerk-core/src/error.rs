// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Falzwerk.

use thiserror::Error;

/// Top-level error type for all Falzwerk operations.
#[derive(Debug, Error)]
pub enum FalzwerkError {
    // -- Batch errors --
    #[error("no documents selected for this batch")]
    EmptyBatch,

    #[error("no active batch to resume")]
    NoActiveBatch,

    // -- Document errors --
    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("invalid page range: {0}")]
    InvalidPageRange(String),

    // -- Storage / persistence --
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FalzwerkError>;
