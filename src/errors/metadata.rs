//! Errors for call metadata (headers and trailers).

/// A metadata key or value did not satisfy the ASCII metadata rules.
///
/// Keys must be non-empty and consist of `0-9`, `a-z`, `_`, `-` or `.`;
/// binary keys (ending in `-bin`) are not supported. Values must be visible
/// ASCII or space.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    /// The key contains characters outside the allowed set, is empty, or
    /// names a binary header.
    #[error("Invalid metadata key: {key:?}")]
    InvalidKey {
        /// The rejected key, as given
        key: String,
    },

    /// The value contains control or non-ASCII characters.
    #[error("Invalid metadata value for key {key:?}")]
    InvalidValue {
        /// Key the value was meant for
        key: String,
    },
}
