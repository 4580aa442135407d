// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// falzwerk-document — PDF engine for the Falzwerk toolbox.
//
// Provides PDF operations (open, extract, split, merge, compress), document
// import with SHA-256 dedup, and the `DocumentProcessor` implementations the
// batch layer drives.

pub mod import;
pub mod integrity;
pub mod pdf;
pub mod processor;

// Re-export the primary types so callers can use `falzwerk_document::PdfFile` etc.
pub use import::{ImportedDocument, import_file};
pub use pdf::{CompressionOutcome, PdfFile, compress_pdf};
pub use processor::{CompressProcessor, SplitProcessor};
