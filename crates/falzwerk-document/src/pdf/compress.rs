// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF compression — re-encode embedded JPEG images at a lower quality and
// flate-compress remaining streams.
//
// Only image XObjects with a plain DCTDecode filter are touched; anything
// with stacked or unfamiliar filters is left as-is. A re-encoded image is
// kept only when it is actually smaller than the original.

use std::io::Cursor;
use std::path::Path;
use std::time::{Duration, Instant};

use image::codecs::jpeg::JpegEncoder;
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, info, instrument, warn};

use falzwerk_core::error::{FalzwerkError, Result};
use falzwerk_core::types::CompressionQuality;

/// Outcome of one compression run.
#[derive(Debug, Clone, Copy)]
pub struct CompressionOutcome {
    /// Size of the input file in bytes.
    pub original_bytes: u64,
    /// Size of the produced file in bytes.
    pub compressed_bytes: u64,
    /// Wall-clock time the run took.
    pub duration: Duration,
}

/// Compress the PDF at `input`, writing the result to `output`.
#[instrument(skip_all, fields(input = %input.display(), quality = ?quality))]
pub fn compress_pdf(
    input: &Path,
    output: &Path,
    quality: CompressionQuality,
) -> Result<CompressionOutcome> {
    let started = Instant::now();
    let original_bytes = std::fs::metadata(input)?.len();

    let mut doc = Document::load(input)
        .map_err(|err| FalzwerkError::Pdf(format!("failed to open {}: {}", input.display(), err)))?;

    let replaced = recompress_images(&mut doc, quality);
    debug!(replaced, "image streams re-encoded");

    // Flate-compress any remaining uncompressed streams.
    doc.compress();

    doc.save(output)
        .map_err(|err| FalzwerkError::Pdf(format!("failed to save {}: {}", output.display(), err)))?;

    let compressed_bytes = std::fs::metadata(output)?.len();
    let duration = started.elapsed();

    info!(
        original_bytes,
        compressed_bytes,
        replaced,
        elapsed_ms = duration.as_millis() as u64,
        "Compression complete"
    );

    Ok(CompressionOutcome {
        original_bytes,
        compressed_bytes,
        duration,
    })
}

/// Re-encode every plain-DCTDecode image stream at the quality level's JPEG
/// setting. Returns the number of streams that were replaced.
pub(crate) fn recompress_images(doc: &mut Document, quality: CompressionQuality) -> usize {
    let ids: Vec<ObjectId> = doc.objects.keys().copied().collect();
    let mut replaced = 0;

    for id in ids {
        let Some(Object::Stream(stream)) = doc.objects.get_mut(&id) else {
            continue;
        };
        if !is_plain_jpeg_image(&stream.dict) {
            continue;
        }

        let original_len = stream.content.len();
        let reencoded = match reencode_jpeg(&stream.content, quality.jpeg_quality()) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(?id, %err, "cannot re-encode image stream, leaving untouched");
                continue;
            }
        };

        if reencoded.len() >= original_len {
            debug!(?id, "re-encoded image not smaller, keeping original");
            continue;
        }

        stream.set_content(reencoded);
        // Decoded and re-encoded through RGB, regardless of the source space.
        stream.dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        stream
            .dict
            .set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        stream.dict.set("BitsPerComponent", Object::Integer(8));
        stream.dict.remove(b"DecodeParms");
        replaced += 1;
    }

    replaced
}

/// True for an image XObject whose only filter is DCTDecode (i.e. the stream
/// content is a complete JPEG file).
fn is_plain_jpeg_image(dict: &lopdf::Dictionary) -> bool {
    let is_image = matches!(dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Image");
    if !is_image {
        return false;
    }

    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => name == b"DCTDecode",
        Ok(Object::Array(filters)) => {
            filters.len() == 1
                && matches!(&filters[0], Object::Name(name) if name == b"DCTDecode")
        }
        _ => false,
    }
}

/// Decode a JPEG byte stream and re-encode it at the given quality.
fn reencode_jpeg(data: &[u8], jpeg_quality: u8) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(data)
        .map_err(|err| FalzwerkError::Pdf(format!("image decode: {err}")))?;
    let rgb = decoded.to_rgb8();

    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buffer), jpeg_quality);
    encoder
        .encode_image(&rgb)
        .map_err(|err| FalzwerkError::Pdf(format!("image encode: {err}")))?;

    Ok(buffer)
}
