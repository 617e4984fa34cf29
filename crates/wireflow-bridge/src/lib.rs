//! wireflow-bridge — client side of the Wireflow processor protocol.
//!
//! Connects an application-side message sequence to a remote processor
//! over gRPC, for exactly one logical exchange at a time.
//!
//! # Architecture
//!
//! ```text
//! Bridge
//!   ├── open(outbound) → Inbound        bidi streaming exchange
//!   │     ├── FIFO per direction, backpressured outbound feed
//!   │     └── into_blocking()           bounded-queue pull adapter
//!   ├── process(message)                unary request/reply
//!   └── HealthProbe::check()            liveness, Up/Down mapping
//! ```
//!
//! Encoding and decoding of envelopes is delegated to
//! `wireflow-codec`; the bridge owns only the transport choreography:
//! backpressure, completion, failure, and cancellation propagation.

pub mod blocking;
pub mod bridge;
pub mod config;
pub mod error;
pub mod health;

pub use blocking::BlockingInbound;
pub use bridge::{Bridge, Inbound};
pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult};
pub use health::{HealthProbe, HealthReport, HealthStatus};
