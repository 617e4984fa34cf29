//! Bridge configuration.
//!
//! Connection and encoding settings for one remote processor,
//! loadable from TOML.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tonic::transport::Endpoint;

use wireflow_codec::ValuePolicy;

/// Settings for the bridge's gRPC channel and envelope encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Remote processor host.
    pub host: String,
    /// Remote processor port.
    pub port: u16,
    /// Send application headers on the wire. When false only the
    /// payload is sent, which keeps per-item overhead minimal.
    pub include_headers: bool,
    /// Header value policy used when headers are included.
    pub policy: ValuePolicy,
    /// Connect timeout in seconds. Zero leaves the transport default.
    pub connect_timeout_secs: u64,
    /// Maximum inbound message size in bytes. Zero leaves the
    /// transport default.
    pub max_message_size: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50051,
            include_headers: false,
            policy: ValuePolicy::Structured,
            connect_timeout_secs: 10,
            max_message_size: 0,
        }
    }
}

impl BridgeConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BridgeConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// The tonic endpoint this configuration describes.
    pub fn endpoint(&self) -> Result<Endpoint, tonic::transport::Error> {
        let mut endpoint = Endpoint::from_shared(format!("http://{}:{}", self.host, self.port))?;
        if self.connect_timeout_secs > 0 {
            endpoint = endpoint.connect_timeout(Duration::from_secs(self.connect_timeout_secs));
        }
        Ok(endpoint)
    }
}
