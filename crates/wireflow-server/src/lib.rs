//! wireflow-server — the reference processor used to exercise the
//! bridge end to end.
//!
//! Mirrors the server side of the wire contract: unary process, bidi
//! stream, and the periodically failing ping.

pub mod server;

pub use server::{serve_with_listener, ProcessorService, DEFAULT_MAX_PINGS};
