//! Error types for the wireflow codec.

use thiserror::Error;

/// Result type alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors produced while converting between application messages and
/// wire envelopes.
///
/// Invalid input fails fast: it indicates a programmer error on the
/// producing side, not a recoverable wire condition. Unsupported
/// header types are deliberately not an error; the codec drops the
/// header with a warning and produces the message anyway.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A required value was missing or unset where the wire schema
    /// demands one.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `build()` was called before a payload was set.
    #[error("payload cannot be empty; set a payload before build()")]
    MissingPayload,

    /// A reserved header (`id` or `timestamp`) arrived in a form that
    /// does not parse.
    #[error("malformed `{key}` header: {reason}")]
    MalformedHeader { key: String, reason: String },
}
