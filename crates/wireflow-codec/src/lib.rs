//! wireflow-codec — the pure conversion core of Wireflow.
//!
//! Bridges the application-side message abstraction (raw payload plus
//! an open, dynamically typed header map) and the binary wire envelope
//! carried over gRPC. Three layers, leaves first:
//!
//! ```text
//! generic   — one value  <-> tagged scalar union
//! headers   — header map <-> wire entries (structured or string-list)
//! envelope  — message    <-> wire envelope (payload + encoded headers)
//! ```
//!
//! Everything here is a pure, synchronous transform: no blocking, no
//! suspension, no retained references to inputs after a call returns.
//! Safe to call from any thread.

pub mod envelope;
pub mod error;
pub mod generic;
pub mod headers;
pub mod message;

/// Generated protobuf types and gRPC service stubs.
pub mod proto {
    tonic::include_proto!("wireflow.processor");
}

pub use envelope::{decode_envelope, EnvelopeBuilder};
pub use error::{CodecError, CodecResult};
pub use headers::{HeaderCodec, ValuePolicy};
pub use message::{AppMessage, Headers, Value, HEADER_ID, HEADER_TIMESTAMP};
