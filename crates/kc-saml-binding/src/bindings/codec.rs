//! Text codecs shared by the bindings.
//!
//! Raw DEFLATE (no zlib header) combined with standard base64, as required
//! by the HTTP-Redirect binding, plus plain base64 for HTTP-POST.

use std::io::{Read, Write};

use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::error::{SamlError, SamlResult};

/// Base64-encodes `text`.
#[must_use]
pub fn base64_encode(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text)
}

/// Decodes base64 into UTF-8 text.
pub fn base64_decode(encoded: &str) -> SamlResult<String> {
    let decoded = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
    utf8(decoded)
}

/// Compresses `text` with raw DEFLATE and base64-encodes the result.
pub fn deflate_and_base64_encode(text: &str) -> SamlResult<String> {
    let compressed = deflate_compress(text.as_bytes())?;
    Ok(base64::engine::general_purpose::STANDARD.encode(compressed))
}

/// Inverse of [`deflate_and_base64_encode`].
pub fn decode_base64_and_inflate(encoded: &str) -> SamlResult<String> {
    let compressed = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
    utf8(deflate_decompress(&compressed)?)
}

fn utf8(bytes: Vec<u8>) -> SamlResult<String> {
    String::from_utf8(bytes)
        .map_err(|e| SamlError::InvalidRequest(format!("Invalid UTF-8 in message: {e}")))
}

fn deflate_compress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| SamlError::Deflate(format!("Compression error: {e}")))?;
    encoder
        .finish()
        .map_err(|e| SamlError::Deflate(format!("Compression finish error: {e}")))
}

fn deflate_decompress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| SamlError::Deflate(format!("Decompression error: {e}")))?;
    Ok(decompressed)
}
