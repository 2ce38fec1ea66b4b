//! Versioned payload encoding for cached values.

use bytes::Bytes;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use super::keys::CACHE_SCHEMA_VERSION;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to serialize cache payload: {0}")]
    Serialize(String),
    #[error("malformed cache payload: {0}")]
    Malformed(String),
    #[error("cache payload version {found} does not match expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    v: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    v: u32,
    data: T,
}

pub fn encode<T: Serialize>(value: &T) -> Result<Bytes, CodecError> {
    let envelope = EnvelopeRef {
        v: CACHE_SCHEMA_VERSION,
        data: value,
    };
    serde_json::to_vec(&envelope)
        .map(Bytes::from)
        .map_err(|err| CodecError::Serialize(err.to_string()))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    #[derive(Deserialize)]
    struct VersionProbe {
        v: u32,
    }

    let probe: VersionProbe =
        serde_json::from_slice(bytes).map_err(|err| CodecError::Malformed(err.to_string()))?;
    if probe.v != CACHE_SCHEMA_VERSION {
        return Err(CodecError::VersionMismatch {
            found: probe.v,
            expected: CACHE_SCHEMA_VERSION,
        });
    }

    let envelope: Envelope<T> =
        serde_json::from_slice(bytes).map_err(|err| CodecError::Malformed(err.to_string()))?;
    Ok(envelope.data)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::application::pagination::CursorResult;

    #[test]
    fn payload_carries_version_tag() {
        let result = CursorResult {
            ids: vec![Uuid::nil()],
            next_cursor: None,
        };
        let bytes = encode(&result).expect("encodes");
        let raw: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(raw["v"], CACHE_SCHEMA_VERSION);

        let decoded: CursorResult = decode(&bytes).expect("decodes");
        assert_eq!(decoded, result);
    }

    #[test]
    fn foreign_version_is_rejected() {
        let bytes = br#"{"v": 999, "data": {"ids": [], "next_cursor": null}}"#;
        let err = decode::<CursorResult>(bytes).expect_err("version mismatch");
        assert!(matches!(err, CodecError::VersionMismatch { found: 999, .. }));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            decode::<CursorResult>(b"\x00\x01not json"),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(
            decode::<CursorResult>(br#"{"v": 1, "data": {"ids": "nope"}}"#),
            Err(CodecError::Malformed(_))
        ));
    }
}
