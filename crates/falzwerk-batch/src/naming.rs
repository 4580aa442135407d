// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output naming — derive a collision-free output location per source
// document + settings combination. The processor relies on this as a
// precondition and never checks for collisions itself.

use std::path::{Path, PathBuf};

use falzwerk_core::types::{BatchSettings, SourceDocument, SplitMode};

/// Derive a unique output path inside `dir` for processing `document` with
/// `settings`.
///
/// Compression and single-range splits name a `.pdf` file; multi-part splits
/// name a directory that will hold the parts. When the candidate already
/// exists, a numbered alternative is picked.
pub fn unique_output_path(
    dir: &Path,
    document: &SourceDocument,
    settings: &BatchSettings,
) -> PathBuf {
    let stem = document.stem();

    let (base, is_dir) = match settings {
        BatchSettings::Compress { quality } => {
            (format!("{stem}_compressed_{}", quality.label()), false)
        }
        BatchSettings::Split {
            mode: SplitMode::Range(range),
        } => (
            format!("{stem}_pages_{}-{}", range.start, range.end),
            false,
        ),
        BatchSettings::Split { .. } => (format!("{stem}_split"), true),
    };

    let candidate = if is_dir {
        dir.join(&base)
    } else {
        dir.join(format!("{base}.pdf"))
    };
    if !candidate.exists() {
        return candidate;
    }

    let mut counter = 1;
    loop {
        let alternative = if is_dir {
            dir.join(format!("{base} ({counter})"))
        } else {
            dir.join(format!("{base} ({counter}).pdf"))
        };
        if !alternative.exists() {
            return alternative;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use falzwerk_core::types::{CompressionQuality, PageRange};

    fn document(name: &str) -> SourceDocument {
        SourceDocument {
            path: PathBuf::from(format!("/tmp/{name}")),
            name: name.to_owned(),
            size_bytes: 10,
        }
    }

    #[test]
    fn compression_name_includes_quality_label() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = unique_output_path(
            dir.path(),
            &document("report.pdf"),
            &BatchSettings::Compress {
                quality: CompressionQuality::Low,
            },
        );
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "report_compressed_low.pdf"
        );
    }

    #[test]
    fn range_split_names_a_file_with_the_range() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = unique_output_path(
            dir.path(),
            &document("report.pdf"),
            &BatchSettings::Split {
                mode: SplitMode::Range(PageRange { start: 2, end: 4 }),
            },
        );
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "report_pages_2-4.pdf"
        );
    }

    #[test]
    fn multi_part_split_names_a_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = unique_output_path(
            dir.path(),
            &document("report.pdf"),
            &BatchSettings::Split {
                mode: SplitMode::SinglePages,
            },
        );
        assert_eq!(path.file_name().unwrap().to_string_lossy(), "report_split");
        assert!(path.extension().is_none());
    }

    #[test]
    fn collisions_pick_numbered_alternatives() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = BatchSettings::Compress {
            quality: CompressionQuality::Medium,
        };
        let doc = document("report.pdf");

        let first = unique_output_path(dir.path(), &doc, &settings);
        std::fs::write(&first, b"taken").expect("occupy first");
        let second = unique_output_path(dir.path(), &doc, &settings);
        std::fs::write(&second, b"taken").expect("occupy second");
        let third = unique_output_path(dir.path(), &doc, &settings);

        assert_ne!(first, second);
        assert_ne!(second, third);
        assert_eq!(
            second.file_name().unwrap().to_string_lossy(),
            "report_compressed_medium (1).pdf"
        );
        assert_eq!(
            third.file_name().unwrap().to_string_lossy(),
            "report_compressed_medium (2).pdf"
        );
    }
}
