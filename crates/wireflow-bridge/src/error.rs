//! Error types for the streaming bridge.

use thiserror::Error;

use wireflow_codec::CodecError;

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors surfaced to the consumer of an exchange.
///
/// A transport failure terminates the affected exchange and is
/// reported to the consumer; the bridge never retries transparently.
/// Other concurrent exchanges are unaffected.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Conversion between application message and wire envelope
    /// failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The transport terminated the exchange.
    #[error("transport failure: {0}")]
    Transport(#[from] tonic::Status),

    /// Connecting to the remote processor failed.
    #[error("connect error: {0}")]
    Connect(#[from] tonic::transport::Error),

    /// The outbound source failed while the exchange was live.
    #[error("outbound source failed: {0}")]
    Source(String),
}
