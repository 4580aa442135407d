// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — reading, extracting, splitting, merging, and compressing PDFs.

pub mod compress;
pub mod file;

pub use compress::{CompressionOutcome, compress_pdf};
pub use file::PdfFile;
