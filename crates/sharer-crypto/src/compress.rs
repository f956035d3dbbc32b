//! gzip compression to shrink plaintext before encryption (smaller QR codes)

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sharer_core::{SharerError, SharerResult};

/// Compress UTF-8 text with gzip.
pub fn compress(text: &str) -> SharerResult<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(text.len() / 2 + 32), Compression::best());
    encoder.write_all(text.as_bytes())?;
    Ok(encoder.finish()?)
}

/// Decompress gzip bytes back into text.
///
/// Truncated or corrupt streams and non-UTF-8 output are all reported as
/// [`SharerError::DecompressionFailure`].
pub fn decompress(compressed: &[u8]) -> SharerResult<String> {
    let mut text = String::new();
    GzDecoder::new(compressed)
        .read_to_string(&mut text)
        .map_err(|e| {
            tracing::debug!(error = %e, "gzip decode failed");
            SharerError::DecompressionFailure
        })?;
    Ok(text)
}
