// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Falzwerk — PDF toolbox CLI.
//
// Entry point. Initialises logging, loads the persisted config, and drives
// the batch services (compress, split) and direct engine calls (import,
// merge) from the command line.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use falzwerk_batch::BatchService;
use falzwerk_batch::service::{self, compression_settings, split_settings};
use falzwerk_core::data_dir;
use falzwerk_core::error::{FalzwerkError, Result};
use falzwerk_core::types::{CompressionQuality, PageRange, SourceDocument, SplitMode};
use falzwerk_document::{PdfFile, import_file};

#[derive(Debug, Parser)]
#[command(name = "falzwerk", version, about = "PDF toolbox: import, compress, merge, and split")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Copy PDFs into the Falzwerk document directory.
    Import {
        /// Files to import.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Compress one or more PDFs as a batch.
    Compress {
        /// Files to compress.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Compression quality (defaults to the configured quality).
        #[arg(long, value_enum)]
        quality: Option<QualityArg>,
    },
    /// Split one or more PDFs as a batch.
    Split {
        /// Files to split.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Split into chunks of N pages.
        #[arg(long, conflicts_with_all = ["pages", "range"])]
        every: Option<u32>,
        /// Split into one file per page.
        #[arg(long, conflicts_with = "range")]
        pages: bool,
        /// Extract a single page range, e.g. "2-5".
        #[arg(long)]
        range: Option<String>,
    },
    /// Merge PDFs into one output file (direct, no batch).
    Merge {
        /// Files to merge, in order.
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,
        /// Output path.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Show or clear the durable operation history.
    History {
        /// Which history store to read.
        #[arg(value_enum)]
        kind: HistoryKind,
        /// Delete all entries and their output files.
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QualityArg {
    Low,
    Medium,
    High,
}

impl From<QualityArg> for CompressionQuality {
    fn from(value: QualityArg) -> Self {
        match value {
            QualityArg::Low => Self::Low,
            QualityArg::Medium => Self::Medium,
            QualityArg::High => Self::High,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HistoryKind {
    Compression,
    Split,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Falzwerk starting");

    let cli = Cli::parse();
    let config = service::load_config();

    match cli.command {
        Command::Import { files } => {
            let documents_dir = data_dir::data_subdir("documents");
            for file in files {
                let imported = import_file(&file, &documents_dir, config.dedup_imports)?;
                if imported.deduplicated {
                    println!("= {} (already imported)", imported.name);
                } else {
                    println!("+ {}", imported.path.display());
                }
            }
        }
        Command::Compress { files, quality } => {
            let documents = source_documents(files)?;
            let quality = quality.map_or(config.default_quality, CompressionQuality::from);
            let svc = BatchService::compression(&config);
            let records = svc
                .start_batch(documents, compression_settings(quality))
                .await?;
            report_batch(&svc, records.len());
        }
        Command::Split {
            files,
            every,
            pages,
            range,
        } => {
            let mode = split_mode(every, pages, range.as_deref())?;
            let documents = source_documents(files)?;
            let svc = BatchService::split(&config);
            let records = svc.start_batch(documents, split_settings(mode)).await?;
            report_batch(&svc, records.len());
        }
        Command::Merge { files, output } => {
            let first = PdfFile::open(&files[0])?;
            let rest = files[1..]
                .iter()
                .map(PdfFile::open)
                .collect::<Result<Vec<_>>>()?;
            let merged = first.merge(&rest)?;
            std::fs::write(&output, merged)?;
            println!("merged {} files into {}", files.len(), output.display());
        }
        Command::History { kind, clear } => {
            let svc = match kind {
                HistoryKind::Compression => BatchService::compression(&config),
                HistoryKind::Split => BatchService::split(&config),
            };
            if clear {
                svc.clear_history();
                println!("history cleared");
            } else {
                for record in svc.history() {
                    println!(
                        "{}  {}  ({})",
                        record.created_at.format("%Y-%m-%d %H:%M"),
                        record.output_path.display(),
                        record.source_name,
                    );
                }
            }
        }
    }

    Ok(())
}

fn source_documents(files: Vec<PathBuf>) -> Result<Vec<SourceDocument>> {
    files.into_iter().map(SourceDocument::from_path).collect()
}

fn split_mode(every: Option<u32>, pages: bool, range: Option<&str>) -> Result<SplitMode> {
    if let Some(chunk) = every {
        return Ok(SplitMode::EveryN { pages: chunk });
    }
    if let Some(spec) = range {
        return Ok(SplitMode::Range(parse_range(spec)?));
    }
    if pages {
        return Ok(SplitMode::SinglePages);
    }
    // Default: one file per page.
    Ok(SplitMode::SinglePages)
}

/// Parse a "start-end" page range; a bare number means a single page.
fn parse_range(spec: &str) -> Result<PageRange> {
    let parse = |s: &str| {
        s.trim()
            .parse::<u32>()
            .map_err(|_| FalzwerkError::InvalidPageRange(spec.to_owned()))
    };

    match spec.split_once('-') {
        Some((start, end)) => Ok(PageRange {
            start: parse(start)?,
            end: parse(end)?,
        }),
        None => {
            let page = parse(spec)?;
            Ok(PageRange {
                start: page,
                end: page,
            })
        }
    }
}

fn report_batch(svc: &BatchService, produced: usize) {
    if let Some(snapshot) = svc.snapshot() {
        println!(
            "{} of {} items completed ({} produced this run)",
            snapshot.completed_count, snapshot.total, produced
        );
        for item in &snapshot.items {
            match &item.state {
                falzwerk_batch::JobItemState::Completed(record) => {
                    println!("  ok    {} -> {}", item.document.name, record.output_path.display());
                }
                falzwerk_batch::JobItemState::Failed { reason } => {
                    println!("  fail  {}: {}", item.document.name, reason);
                }
                state => {
                    println!("  {:?}  {}", state, item.document.name);
                }
            }
        }
    }
}
