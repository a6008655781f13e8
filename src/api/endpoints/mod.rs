//! HTTP endpoint handlers, one module per resource.

pub mod chat;
pub mod delivery;
pub mod feedback;
pub mod health;
pub mod portal;
pub mod summaries;
pub mod templates;
pub mod transcriptions;

use std::sync::MutexGuard;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rusqlite::Connection;

use super::error::ApiError;
use super::types::ApiContext;

/// Lock the shared connection. Guards must be dropped before any `.await`.
pub(crate) fn lock_db(ctx: &ApiContext) -> Result<MutexGuard<'_, Connection>, ApiError> {
    ctx.db
        .lock()
        .map_err(|_| ApiError::Internal("database lock poisoned".into()))
}

/// Decode a base64 payload in fixed-size chunks so a multi-megabyte body
/// never forces one giant intermediate allocation.
pub(crate) fn decode_base64_chunked(encoded: &str) -> Result<Vec<u8>, ApiError> {
    // 4 base64 chars decode to 3 bytes; the chunk size must stay 4-aligned.
    const CHUNK_CHARS: usize = 64 * 1024;

    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let mut out = Vec::with_capacity(cleaned.len() / 4 * 3);

    let bytes = cleaned.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        let end = (pos + CHUNK_CHARS).min(bytes.len());
        let chunk = &bytes[pos..end];
        let decoded = STANDARD
            .decode(chunk)
            .map_err(|_| ApiError::BadRequest("Invalid base64 payload".into()))?;
        out.extend_from_slice(&decoded);
        pos = end;
    }

    if out.is_empty() {
        return Err(ApiError::BadRequest("Empty payload".into()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_small_payload() {
        let encoded = STANDARD.encode(b"hello audio bytes");
        assert_eq!(decode_base64_chunked(&encoded).unwrap(), b"hello audio bytes");
    }

    #[test]
    fn decodes_payload_larger_than_one_chunk() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let encoded = STANDARD.encode(&data);
        assert_eq!(decode_base64_chunked(&encoded).unwrap(), data);
    }

    #[test]
    fn tolerates_embedded_whitespace() {
        let encoded = format!("{}\n{}", STANDARD.encode(b"abc"), "");
        assert_eq!(decode_base64_chunked(&encoded).unwrap(), b"abc");
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(decode_base64_chunked("not!!valid@@base64").is_err());
    }

    #[test]
    fn rejects_empty_input() {
        assert!(decode_base64_chunked("").is_err());
    }
}
