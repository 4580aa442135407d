// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document import — copy user-selected PDFs into the application's document
// directory with SHA-256 dedup and collision-free naming.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use falzwerk_core::error::{FalzwerkError, Result};

use crate::integrity::hash_bytes;

/// A file that has been copied into the document directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedDocument {
    /// Path of the stored copy.
    pub path: PathBuf,
    /// File name of the stored copy.
    pub name: String,
    /// SHA-256 fingerprint of the document bytes.
    pub sha256: String,
    /// True when an identical copy already existed and no new file was written.
    pub deduplicated: bool,
}

/// Import `source` into `documents_dir`.
///
/// With `dedup` enabled, a file at the target name with identical content is
/// reused instead of copied again. A name collision with different content
/// always picks a fresh numbered name.
#[instrument(skip_all, fields(source = %source.display()))]
pub fn import_file(source: &Path, documents_dir: &Path, dedup: bool) -> Result<ImportedDocument> {
    let extension = source
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if extension != "pdf" {
        return Err(FalzwerkError::UnsupportedDocument(format!(
            "{} (only PDF files can be imported)",
            source.display()
        )));
    }

    let data = std::fs::read(source)?;
    let sha256 = hash_bytes(&data);

    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{sha256}.pdf"));

    std::fs::create_dir_all(documents_dir)?;
    let mut target = documents_dir.join(&file_name);

    if target.exists() {
        let existing_matches = dedup
            && std::fs::read(&target)
                .map(|existing| hash_bytes(&existing) == sha256)
                .unwrap_or(false);

        if existing_matches {
            debug!(path = %target.display(), "identical document already imported");
            return Ok(ImportedDocument {
                name: file_name,
                path: target,
                sha256,
                deduplicated: true,
            });
        }
        target = numbered_alternative(documents_dir, &file_name);
    }

    std::fs::write(&target, &data)?;
    info!(path = %target.display(), bytes = data.len(), "document imported");

    Ok(ImportedDocument {
        name: target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(file_name),
        path: target,
        sha256,
        deduplicated: false,
    })
}

/// First free "name (n).pdf" style path inside `dir`.
fn numbered_alternative(dir: &Path, file_name: &str) -> PathBuf {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_owned());

    let mut counter = 1;
    loop {
        let candidate = dir.join(format!("{stem} ({counter}).pdf"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
