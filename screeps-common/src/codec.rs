//! The `gz:` memory payload codec.
//!
//! Screeps hands out segment and memory contents as `"gz:" + base64(gzip(json))`.
//! Decoding runs the stages in order and stops at the first one that fails;
//! there are no partial results.

use std::io::{Read, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use tracing::trace;

use crate::error::{DecodeError, Result};
use crate::snapshot::Snapshot;

/// Marker that prefixes every gzip-encoded payload.
pub const GZIP_MARKER: &str = "gz:";

/// Decode a payload into a [`Snapshot`].
pub fn decode(payload: &str) -> std::result::Result<Snapshot, DecodeError> {
    decode_as(payload)
}

/// Decode a payload into any deserializable type.
pub fn decode_as<T: DeserializeOwned>(payload: &str) -> std::result::Result<T, DecodeError> {
    let encoded = strip_marker(payload)?;
    let compressed = STANDARD.decode(encoded)?;
    let raw = gunzip(&compressed)?;
    let text = std::str::from_utf8(&raw)?;

    trace!(
        encoded_len = payload.len(),
        compressed_len = compressed.len(),
        json_len = text.len(),
        "Decoded memory payload"
    );

    serde_json::from_str(text).map_err(|e| match e.classify() {
        Category::Data => DecodeError::Shape(e),
        Category::Syntax | Category::Eof | Category::Io => DecodeError::Json(e),
    })
}

/// Encode a value the same way the game server does.
pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;

    Ok(format!("{}{}", GZIP_MARKER, STANDARD.encode(compressed)))
}

fn strip_marker(payload: &str) -> std::result::Result<&str, DecodeError> {
    payload
        .strip_prefix(GZIP_MARKER)
        .ok_or_else(|| DecodeError::Prefix {
            expected: GZIP_MARKER,
            found: payload.chars().take(GZIP_MARKER.len()).collect(),
        })
}

fn gunzip(data: &[u8]) -> std::result::Result<Vec<u8>, DecodeError> {
    if data.is_empty() {
        return Err(DecodeError::Gzip(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "empty gzip stream",
        )));
    }

    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(DecodeError::Gzip)?;
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    fn wrap(bytes: &[u8]) -> String {
        format!("{}{}", GZIP_MARKER, STANDARD.encode(gzip(bytes)))
    }

    #[test]
    fn test_roundtrip_arbitrary_json() {
        let value = json!({
            "nested": { "list": [1, 2.5, "three", null, true] },
            "unicode": "héllo ⚡",
            "empty": {}
        });

        let payload = encode(&value).unwrap();
        assert!(payload.starts_with(GZIP_MARKER));

        let decoded: Value = decode_as(&payload).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_decode_snapshot() {
        let payload = wrap(br#"{"time": 99, "cpu": {"bucket": 10000}}"#);
        let snapshot = decode(&payload).unwrap();

        assert_eq!(snapshot.time.and_then(|t| t.value()), Some(99.0));
        assert_eq!(snapshot.cpu.unwrap().bucket.value(), Some(10000.0));
    }

    #[test]
    fn test_wrong_marker_rejected() {
        let good = wrap(b"{}");
        let bad = good.replacen(GZIP_MARKER, "xz:", 1);

        match decode(&bad) {
            Err(DecodeError::Prefix { found, .. }) => assert_eq!(found, "xz:"),
            other => panic!("expected prefix error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_marker_rejected() {
        let bare = STANDARD.encode(gzip(b"{}"));
        let err = decode(&bare).unwrap_err();
        assert_eq!(err.stage(), "prefix");
    }

    #[test]
    fn test_short_payload_rejected() {
        let err = decode("gz").unwrap_err();
        assert!(matches!(err, DecodeError::Prefix { .. }));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let err = decode("gz:this is not base64!").unwrap_err();
        assert!(matches!(err, DecodeError::Base64(_)));
    }

    #[test]
    fn test_non_gzip_rejected() {
        let payload = format!("{}{}", GZIP_MARKER, STANDARD.encode(b"plain text, no gzip"));
        let err = decode(&payload).unwrap_err();
        assert!(matches!(err, DecodeError::Gzip(_)));
    }

    #[test]
    fn test_empty_body_rejected() {
        let err = decode(GZIP_MARKER).unwrap_err();
        assert!(matches!(err, DecodeError::Gzip(_)));
    }

    #[test]
    fn test_truncated_gzip_rejected() {
        let mut compressed = gzip(br#"{"time": 1, "padding": "aaaaaaaaaaaaaaaaaaaaaaaaaaaa"}"#);
        compressed.truncate(compressed.len() / 2);
        let payload = format!("{}{}", GZIP_MARKER, STANDARD.encode(compressed));

        let err = decode(&payload).unwrap_err();
        assert!(matches!(err, DecodeError::Gzip(_)));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let err = decode(&wrap(&[0x7b, 0xff, 0xfe, 0x7d])).unwrap_err();
        assert!(matches!(err, DecodeError::Utf8(_)));
    }

    #[test]
    fn test_invalid_json_rejected() {
        let err = decode(&wrap(b"{\"time\": ")).unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));

        let err = decode(&wrap(b"not json")).unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let err = decode(&wrap(br#"{"rooms": [1, 2, 3]}"#)).unwrap_err();
        assert!(matches!(err, DecodeError::Shape(_)));
        assert_eq!(err.stage(), "shape");
    }

    #[test]
    fn test_malformed_entry_keeps_document() {
        let snapshot = decode(&wrap(br#"{"creeps": {"a": "x"}, "time": 1}"#)).unwrap();

        let creeps = snapshot.creeps.unwrap();
        assert_eq!(creeps["a"].role_key(), crate::UNDEFINED_ROLE);
        assert_eq!(snapshot.time.and_then(|t| t.value()), Some(1.0));
    }
}
