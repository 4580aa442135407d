// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF file access — open, inspect, extract, split, and merge existing PDF
// documents using the `lopdf` crate.

use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use tracing::{debug, info, instrument, warn};

use falzwerk_core::error::{FalzwerkError, Result};
use falzwerk_core::types::{PageRange, SplitMode};

/// An opened PDF document.
///
/// Wraps `lopdf::Document` and provides the higher-level operations the
/// toolbox needs: extracting page ranges, splitting into parts, and merging
/// multiple files.
pub struct PdfFile {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfFile {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();

        let document = Document::load(path_ref).map_err(|err| {
            FalzwerkError::Pdf(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Create a `PdfFile` from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| FalzwerkError::Pdf(format!("failed to load PDF from memory: {err}")))?;

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Return the source path if this file was created via [`PdfFile::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    // -- Extraction & splitting -----------------------------------------------

    /// Extract a contiguous page range into a new standalone PDF, returned as
    /// serialised bytes.
    #[instrument(skip(self), fields(start = range.start, end = range.end))]
    pub fn extract_range(&self, range: PageRange) -> Result<Vec<u8>> {
        range.validate(self.page_count())?;

        let pages = self.document.get_pages();
        let mut part = Document::with_version("1.5");

        for page_num in range.start..=range.end {
            let page_id = *pages.get(&page_num).ok_or_else(|| {
                FalzwerkError::Pdf(format!("page {page_num} not found in page tree"))
            })?;
            copy_page_into(&self.document, &mut part, page_id)?;
        }

        let mut output = Vec::new();
        part.save_to(&mut output)
            .map_err(|err| FalzwerkError::Pdf(format!("failed to serialise page range: {err}")))?;

        debug!(output_bytes = output.len(), "Page range extracted");
        Ok(output)
    }

    /// Divide the document according to `mode`, returning each part's range
    /// and serialised bytes in page order.
    #[instrument(skip(self))]
    pub fn split(&self, mode: SplitMode) -> Result<Vec<(PageRange, Vec<u8>)>> {
        let total = self.page_count();
        if total == 0 {
            return Err(FalzwerkError::Pdf("document has no pages".to_owned()));
        }

        let ranges = part_ranges(mode, total)?;
        info!(total, parts = ranges.len(), "Splitting PDF");

        let mut parts = Vec::with_capacity(ranges.len());
        for range in ranges {
            let bytes = self.extract_range(range)?;
            parts.push((range, bytes));
        }
        Ok(parts)
    }

    // -- Merging --------------------------------------------------------------

    /// Merge this document with one or more others, producing a combined PDF.
    /// Pages appear in the order: self, then each supplied document in order.
    #[instrument(skip_all, fields(additional_count = others.len()))]
    pub fn merge(&self, others: &[PdfFile]) -> Result<Vec<u8>> {
        info!(
            base_pages = self.page_count(),
            additional_documents = others.len(),
            "Merging PDFs"
        );

        let mut merged = self.document.clone();

        for other in others {
            let other_pages = other.document.get_pages();
            let mut page_numbers: Vec<u32> = other_pages.keys().copied().collect();
            page_numbers.sort();

            for page_num in page_numbers {
                let page_id = other_pages[&page_num];
                copy_page_into(&other.document, &mut merged, page_id)?;
            }
        }

        let mut output = Vec::new();
        merged
            .save_to(&mut output)
            .map_err(|err| FalzwerkError::Pdf(format!("failed to serialise merged PDF: {err}")))?;

        debug!(output_bytes = output.len(), "Merge complete");
        Ok(output)
    }
}

/// Compute the part ranges for a split mode over a `total`-page document.
fn part_ranges(mode: SplitMode, total: u32) -> Result<Vec<PageRange>> {
    match mode {
        SplitMode::SinglePages => Ok((1..=total)
            .map(|page| PageRange {
                start: page,
                end: page,
            })
            .collect()),
        SplitMode::EveryN { pages } => {
            if pages == 0 {
                return Err(FalzwerkError::InvalidPageRange(
                    "chunk size must be at least 1 page".to_owned(),
                ));
            }
            let mut ranges = Vec::new();
            let mut start = 1u32;
            while start <= total {
                // Saturate: a chunk size near u32::MAX must not overflow.
                let end = start.saturating_add(pages - 1).min(total);
                ranges.push(PageRange { start, end });
                if end == total {
                    break;
                }
                start = end + 1;
            }
            Ok(ranges)
        }
        SplitMode::Range(range) => {
            range.validate(total)?;
            Ok(vec![range])
        }
    }
}

// ---------------------------------------------------------------------------
// Page-graph copying
// ---------------------------------------------------------------------------

/// Copy a single page object (and its referenced resources) from `source`
/// into `target`, appending it as the last page.
///
/// Stream data, fonts, and images referenced by the page dictionary are
/// cloned as new objects in the target document.
fn copy_page_into(source: &Document, target: &mut Document, page_id: ObjectId) -> Result<()> {
    let page_object = source
        .get_object(page_id)
        .map_err(|err| FalzwerkError::Pdf(format!("cannot read page object {page_id:?}: {err}")))?;

    // Deep-clone the page object and all objects it transitively references.
    let cloned = clone_object_graph(source, target, page_object)?;
    let cloned_id = target.add_object(cloned);

    // Retrieve the target's page tree root (/Pages) and append the new page.
    let pages_id = target
        .catalog()
        .map_err(|err| FalzwerkError::Pdf(format!("no catalog: {err}")))
        .and_then(|catalog| {
            catalog
                .get(b"Pages")
                .map_err(|err| FalzwerkError::Pdf(format!("no /Pages: {err}")))
                .and_then(|pages_ref| match pages_ref {
                    Object::Reference(id) => Ok(*id),
                    _ => Err(FalzwerkError::Pdf("/Pages is not a reference".to_owned())),
                })
        })?;

    // Add the page reference to the /Kids array and bump /Count.
    if let Ok(Object::Dictionary(pages_dict)) = target.get_object_mut(pages_id) {
        if let Ok(Object::Array(kids)) = pages_dict.get_mut(b"Kids") {
            kids.push(Object::Reference(cloned_id));
        }
        if let Ok(count_obj) = pages_dict.get_mut(b"Count")
            && let Object::Integer(count) = count_obj
        {
            *count += 1;
        }
    }

    // Point the cloned page's /Parent at the target's /Pages node.
    if let Ok(Object::Dictionary(page_dict)) = target.get_object_mut(cloned_id) {
        page_dict.set("Parent", Object::Reference(pages_id));
    }

    Ok(())
}

/// Deep-clone a single lopdf Object, recursively resolving references
/// (except /Parent, which is deliberately skipped to avoid circular cloning
/// and patched by the caller).
fn clone_object_graph(source: &Document, target: &mut Document, object: &Object) -> Result<Object> {
    match object {
        Object::Dictionary(dict) => {
            let mut new_dict = lopdf::Dictionary::new();
            for (key, value) in dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                let cloned_value = clone_object_graph(source, target, value)?;
                new_dict.set(key.clone(), cloned_value);
            }
            Ok(Object::Dictionary(new_dict))
        }
        Object::Array(arr) => {
            let mut new_arr = Vec::with_capacity(arr.len());
            for item in arr {
                new_arr.push(clone_object_graph(source, target, item)?);
            }
            Ok(Object::Array(new_arr))
        }
        Object::Reference(ref_id) => {
            // Resolve the reference in the source, clone the referent, and
            // return a fresh reference into the target.
            match source.get_object(*ref_id) {
                Ok(referenced) => {
                    let cloned = clone_object_graph(source, target, referenced)?;
                    let new_id = target.add_object(cloned);
                    Ok(Object::Reference(new_id))
                }
                Err(err) => {
                    warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                    Ok(Object::Null)
                }
            }
        }
        Object::Stream(stream) => {
            let mut new_dict = lopdf::Dictionary::new();
            for (key, value) in stream.dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                let cloned_value = clone_object_graph(source, target, value)?;
                new_dict.set(key.clone(), cloned_value);
            }
            Ok(Object::Stream(lopdf::Stream::new(
                new_dict,
                stream.content.clone(),
            )))
        }
        // Boolean, Integer, Real, String, Name, Null are trivially cloneable.
        other => Ok(other.clone()),
    }
}
