// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DocumentProcessor implementations backed by the lopdf engine.

use std::path::Path;

use tracing::{info, instrument};

use falzwerk_core::error::{FalzwerkError, Result};
use falzwerk_core::processor::DocumentProcessor;
use falzwerk_core::types::{
    BatchSettings, OperationMetrics, ResultRecord, SourceDocument, SplitMode,
};

use crate::pdf::{PdfFile, compress_pdf};

/// Compresses one PDF per invocation.
#[derive(Debug, Default)]
pub struct CompressProcessor;

impl DocumentProcessor for CompressProcessor {
    #[instrument(skip_all, fields(source = %source.name))]
    fn process(
        &self,
        source: &SourceDocument,
        settings: &BatchSettings,
        output: &Path,
    ) -> Result<ResultRecord> {
        let BatchSettings::Compress { quality } = settings else {
            return Err(FalzwerkError::Pdf(
                "compress processor invoked with split settings".to_owned(),
            ));
        };

        let outcome = compress_pdf(&source.path, output, *quality)?;

        Ok(ResultRecord::new(
            output.to_path_buf(),
            source.name.clone(),
            OperationMetrics::Compression {
                original_bytes: outcome.original_bytes,
                compressed_bytes: outcome.compressed_bytes,
                duration_ms: outcome.duration.as_millis() as u64,
            },
        ))
    }
}

/// Splits one PDF per invocation.
///
/// A single-range split writes one file at `output`; every other mode writes
/// its parts into `output` as a directory, which becomes the record's
/// output location.
#[derive(Debug, Default)]
pub struct SplitProcessor;

impl DocumentProcessor for SplitProcessor {
    #[instrument(skip_all, fields(source = %source.name))]
    fn process(
        &self,
        source: &SourceDocument,
        settings: &BatchSettings,
        output: &Path,
    ) -> Result<ResultRecord> {
        let BatchSettings::Split { mode } = settings else {
            return Err(FalzwerkError::Pdf(
                "split processor invoked with compression settings".to_owned(),
            ));
        };

        let file = PdfFile::open(&source.path)?;
        let source_pages = file.page_count();
        let parts = file.split(*mode)?;
        let part_count = parts.len() as u32;

        match mode {
            SplitMode::Range(_) => {
                // Exactly one part by construction.
                let (_, bytes) = &parts[0];
                std::fs::write(output, bytes)?;
            }
            _ => {
                std::fs::create_dir_all(output)?;
                let stem = source.stem();
                for (range, bytes) in &parts {
                    let part_name = if range.start == range.end {
                        format!("{stem}_page_{:03}.pdf", range.start)
                    } else {
                        format!("{stem}_pages_{:03}-{:03}.pdf", range.start, range.end)
                    };
                    std::fs::write(output.join(part_name), bytes)?;
                }
            }
        }

        info!(source_pages, parts = part_count, "split written");

        Ok(ResultRecord::new(
            output.to_path_buf(),
            source.name.clone(),
            OperationMetrics::Split {
                source_pages,
                parts: part_count,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::test_support::sample_pdf_bytes;
    use falzwerk_core::types::{CompressionQuality, PageRange};

    fn sample_source(dir: &Path, pages: u32) -> SourceDocument {
        let path = dir.join("sample.pdf");
        std::fs::write(&path, sample_pdf_bytes(pages)).expect("write sample");
        SourceDocument::from_path(path).expect("source document")
    }

    #[test]
    fn compress_processor_emits_compression_metrics() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = sample_source(dir.path(), 3);
        let output = dir.path().join("sample_compressed_medium.pdf");

        let record = CompressProcessor
            .process(
                &source,
                &BatchSettings::Compress {
                    quality: CompressionQuality::Medium,
                },
                &output,
            )
            .expect("process");

        assert!(output.exists());
        assert!(matches!(
            record.metrics,
            OperationMetrics::Compression { original_bytes, .. } if original_bytes == source.size_bytes
        ));
    }

    #[test]
    fn split_processor_writes_parts_into_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = sample_source(dir.path(), 5);
        let output = dir.path().join("sample_split");

        let record = SplitProcessor
            .process(
                &source,
                &BatchSettings::Split {
                    mode: SplitMode::EveryN { pages: 2 },
                },
                &output,
            )
            .expect("process");

        assert!(output.is_dir());
        assert_eq!(std::fs::read_dir(&output).unwrap().count(), 3);
        assert!(matches!(
            record.metrics,
            OperationMetrics::Split {
                source_pages: 5,
                parts: 3
            }
        ));
    }

    #[test]
    fn split_processor_single_range_writes_one_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = sample_source(dir.path(), 5);
        let output = dir.path().join("sample_pages_2-4.pdf");

        SplitProcessor
            .process(
                &source,
                &BatchSettings::Split {
                    mode: SplitMode::Range(PageRange { start: 2, end: 4 }),
                },
                &output,
            )
            .expect("process");

        let part = PdfFile::open(&output).expect("reload part");
        assert_eq!(part.page_count(), 3);
    }

    #[test]
    fn mismatched_settings_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = sample_source(dir.path(), 2);
        let output = dir.path().join("out.pdf");

        let result = CompressProcessor.process(
            &source,
            &BatchSettings::Split {
                mode: SplitMode::SinglePages,
            },
            &output,
        );
        assert!(result.is_err());
    }
}
