//! Postcard encoding of cached values with a versioned envelope.
//!
//! Every value written to the store has this layout:
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│ VERSION (varint)│POSTCARD PAYLOAD (N bytes)│
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "BLGC"              u32                postcard::to_allocvec(T)
//! ```
//!
//! A value whose envelope does not validate is never returned to a caller;
//! the cached wrapper drops it and recomputes.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Magic header for blog-cache entries.
pub const CACHE_MAGIC: [u8; 4] = *b"BLGC";

/// Current schema version.
///
/// Bump when a cached record changes shape (fields added, removed, reordered
/// or retyped). Entries from the previous version are then evicted on read.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Versioned envelope for cache entries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEnvelope<T> {
    pub magic: [u8; 4],
    pub version: u32,
    pub payload: T,
}

impl<T> CacheEnvelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Encode a value for the store.
///
/// # Errors
///
/// Returns `Error::SerializationError` if Postcard serialization fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let envelope = CacheEnvelope::new(value);
    postcard::to_allocvec(&envelope).map_err(|e| {
        error!("Cache serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Encode a value and confirm it decodes back as `T`.
///
/// Postcard is not self-describing, so types relying on `deserialize_any`
/// (e.g. `serde_json::Value`) or on skipped fields encode fine but can never
/// be read back. Storing them would turn every later read into a miss.
///
/// # Errors
///
/// Returns `Error::SerializationError` if encoding fails or the bytes do not
/// decode as `T`.
pub fn encode_checked<T: Serialize + DeserializeOwned>(value: &T) -> Result<Vec<u8>> {
    let bytes = encode(value)?;
    decode::<T>(&bytes).map_err(|e| {
        Error::SerializationError(format!("value cannot be read back from the cache: {}", e))
    })?;
    Ok(bytes)
}

/// Decode a value read from the store, validating magic and version.
///
/// # Errors
///
/// - `Error::DeserializationError`: corrupted Postcard bytes
/// - `Error::InvalidCacheEntry`: wrong magic header
/// - `Error::VersionMismatch`: written by another schema version
pub fn decode<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> Result<T> {
    let envelope: CacheEnvelope<T> = postcard::from_bytes(bytes)
        .map_err(|e| Error::DeserializationError(e.to_string()))?;

    if envelope.magic != CACHE_MAGIC {
        return Err(Error::InvalidCacheEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        )));
    }

    if envelope.version != CURRENT_SCHEMA_VERSION {
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: envelope.version,
        });
    }

    Ok(envelope.payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
    struct PostSummary {
        id: String,
        title: String,
        published: bool,
    }

    fn sample() -> PostSummary {
        PostSummary {
            id: "p1".to_string(),
            title: "Merhaba Dünya".to_string(),
            published: true,
        }
    }

    #[test]
    fn test_envelope_structure() {
        let bytes = encode(&sample()).unwrap();

        // postcard uses varints, so inspect via the envelope type
        let envelope: CacheEnvelope<PostSummary> = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(envelope.magic, CACHE_MAGIC);
        assert_eq!(envelope.version, CURRENT_SCHEMA_VERSION);
        assert_eq!(envelope.payload, sample());
    }

    #[test]
    fn test_decode_returns_payload() {
        let posts = vec![sample(), sample()];
        let bytes = encode(&posts).unwrap();
        let decoded: Vec<PostSummary> = decode(&bytes).unwrap();
        assert_eq!(decoded, posts);
    }

    #[test]
    fn test_invalid_magic_rejected() {
        let mut bytes = vec![0u8; 32];
        bytes[0..4].copy_from_slice(b"XXXX");
        bytes[4] = 1;

        let result: Result<PostSummary> = decode(&bytes);
        assert!(matches!(result, Err(Error::InvalidCacheEntry(_))));
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut envelope = CacheEnvelope::new(sample());
        envelope.version = 7;
        let bytes = postcard::to_allocvec(&envelope).unwrap();

        let result: Result<PostSummary> = decode(&bytes);
        assert_eq!(
            result.unwrap_err(),
            Error::VersionMismatch {
                expected: CURRENT_SCHEMA_VERSION,
                found: 7
            }
        );
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let mut bytes = encode(&sample()).unwrap();
        let len = bytes.len();
        bytes.truncate(len / 2);

        let result: Result<PostSummary> = decode(&bytes);
        assert!(matches!(result, Err(Error::DeserializationError(_))));
    }

    #[test]
    fn test_encode_checked_accepts_plain_types() {
        let bytes = encode_checked(&vec![sample()]).unwrap();
        let decoded: Vec<PostSummary> = decode(&bytes).unwrap();
        assert_eq!(decoded, vec![sample()]);
    }

    #[test]
    fn test_encode_checked_rejects_self_describing_types() {
        let value = serde_json::json!({ "id": "p1" });
        assert!(encode(&value).is_ok());

        let err = encode_checked(&value).unwrap_err();
        assert!(matches!(err, Error::SerializationError(_)));
    }

    #[test]
    fn test_encode_checked_rejects_skipped_fields() {
        #[derive(Serialize, Deserialize)]
        struct Draft {
            id: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            category: Option<String>,
            published: bool,
        }

        let draft = Draft {
            id: "p1".to_string(),
            category: None,
            published: true,
        };
        assert!(encode_checked(&draft).is_err());
    }
}
