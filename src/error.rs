//! Error types for the blog cache.

use std::fmt;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the blog cache.
///
/// Store operations themselves never fail; errors come from encoding cached
/// values, from the wrapped computations, and from content validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Serialization failed when encoding a computed value for the store.
    SerializationError(String),

    /// Deserialization failed when decoding cached bytes.
    ///
    /// **Recovery:** the entry is deleted and recomputed on the spot.
    DeserializationError(String),

    /// Cached bytes do not carry the expected envelope magic.
    InvalidCacheEntry(String),

    /// Cached bytes were written by a different schema version.
    ///
    /// Expected after a deploy that changes cached record layouts; the entry
    /// is evicted and recomputed.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from cached entry)
        found: u32,
    },

    /// The wrapped data source (database) failed.
    ///
    /// Propagated to the caller unchanged and never cached.
    RepositoryError(String),

    /// Input rejected before a write reached the repository.
    ValidationError(String),

    /// A tag name outside the closed tag set was parsed.
    InvalidTag(String),

    /// Invalid cache configuration.
    ConfigError(String),

    /// Generic error with custom message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            Error::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Error::InvalidTag(tag) => write!(f, "Unknown cache tag: {}", tag),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// True for errors raised while decoding a cached entry.
    ///
    /// Such entries are dropped and recomputed instead of failing the read.
    pub fn is_stale_entry(&self) -> bool {
        matches!(
            self,
            Error::DeserializationError(_)
                | Error::InvalidCacheEntry(_)
                | Error::VersionMismatch { .. }
        )
    }
}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_syntax() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}
