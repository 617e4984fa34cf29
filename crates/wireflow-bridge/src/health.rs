//! Liveness probe.
//!
//! Wraps the unary ping RPC in a health indicator for external
//! monitoring: a successful call maps to `Up` carrying the returned
//! status text, any failure maps to `Down`. Transport errors never
//! escape the probe's public contract.

use tonic::transport::Channel;
use tracing::debug;

use wireflow_codec::proto::processor_client::ProcessorClient;
use wireflow_codec::proto::PingRequest;

/// Probe outcome category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Up,
    Down,
}

/// One probe result: the status plus the peer's status text, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub message: Option<String>,
}

/// Health probe sharing the processor's transport channel.
#[derive(Debug, Clone)]
pub struct HealthProbe {
    client: ProcessorClient<Channel>,
}

impl HealthProbe {
    pub fn new(channel: Channel) -> Self {
        Self {
            client: ProcessorClient::new(channel),
        }
    }

    /// Ping the remote processor. Infallible by contract: any error,
    /// including the peer's simulated unavailability, reports `Down`
    /// without exposing the underlying fault.
    pub async fn check(&mut self) -> HealthReport {
        match self.client.ping(PingRequest {}).await {
            Ok(response) => HealthReport {
                status: HealthStatus::Up,
                message: Some(response.into_inner().message),
            },
            Err(status) => {
                debug!(code = ?status.code(), "ping failed; reporting down");
                HealthReport {
                    status: HealthStatus::Down,
                    message: None,
                }
            }
        }
    }
}
