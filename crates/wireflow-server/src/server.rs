//! The reference processor service.
//!
//! Implements the `Processor` gRPC interface: a unary upper-casing
//! echo that passes headers through untouched, a bidirectional
//! streaming upper-caser, and a ping endpoint with a bounded failure
//! cycle used to exercise client-side health reporting.

use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};

use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, warn};

use wireflow_codec::proto::processor_server::{Processor, ProcessorServer};
use wireflow_codec::proto::{self, Envelope, PingRequest};
use wireflow_codec::{EnvelopeBuilder, ValuePolicy};

/// Pings before the simulated failure. The counter resets after the
/// failure, giving a fixed period-N cycle: N-1 successes, 1 failure.
pub const DEFAULT_MAX_PINGS: u32 = 3;

/// Per-exchange buffer between the inbound pump and the response
/// stream.
const STREAM_BUFFER: usize = 16;

/// The reference processor.
pub struct ProcessorService {
    max_pings: u32,
    ping_count: AtomicU32,
}

impl ProcessorService {
    pub fn new() -> Self {
        Self::with_max_pings(DEFAULT_MAX_PINGS)
    }

    /// Override the ping failure threshold.
    pub fn with_max_pings(max_pings: u32) -> Self {
        Self {
            max_pings,
            ping_count: AtomicU32::new(0),
        }
    }

    /// Get the tonic service for mounting on a gRPC server.
    pub fn into_service(self) -> ProcessorServer<Self> {
        ProcessorServer::new(self)
    }
}

impl Default for ProcessorService {
    fn default() -> Self {
        Self::new()
    }
}

fn uppercased(payload: &[u8]) -> Vec<u8> {
    String::from_utf8_lossy(payload).to_uppercase().into_bytes()
}

#[tonic::async_trait]
impl Processor for ProcessorService {
    async fn process(
        &self,
        request: Request<Envelope>,
    ) -> Result<Response<Envelope>, Status> {
        let envelope = request.into_inner();
        debug!(headers = envelope.headers.len(), "processing unary envelope");

        // Transform the payload; the original headers pass through
        // unchanged.
        let reply = EnvelopeBuilder::new(ValuePolicy::Structured)
            .payload(uppercased(&envelope.payload))
            .wire_headers(envelope.headers)
            .build()
            .map_err(|e| Status::internal(e.to_string()))?;

        Ok(Response::new(reply))
    }

    type StreamStream = Pin<Box<dyn Stream<Item = Result<Envelope, Status>> + Send>>;

    async fn stream(
        &self,
        request: Request<Streaming<Envelope>>,
    ) -> Result<Response<Self::StreamStream>, Status> {
        let mut inbound = request.into_inner();
        let (tx, rx) = tokio::sync::mpsc::channel(STREAM_BUFFER);

        tokio::spawn(async move {
            while let Some(item) = inbound.next().await {
                let reply = item.map(|envelope| Envelope {
                    payload: uppercased(&envelope.payload),
                    headers: Vec::new(),
                });
                let terminal = reply.is_err();
                if tx.send(reply).await.is_err() {
                    // Client cancelled the exchange.
                    debug!("stream response channel closed; dropping exchange");
                    return;
                }
                if terminal {
                    return;
                }
            }
            // Inbound completion: dropping the sender completes the
            // response stream.
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }

    async fn ping(
        &self,
        _request: Request<PingRequest>,
    ) -> Result<Response<proto::Status>, Status> {
        let count = self.ping_count.fetch_add(1, Ordering::SeqCst) + 1;
        if count == self.max_pings {
            self.ping_count.store(0, Ordering::SeqCst);
            warn!(count, "simulating unavailable ping");
            return Err(Status::unavailable("simulated unavailable"));
        }
        debug!(count, "ping");
        Ok(Response::new(proto::Status {
            message: "alive".to_string(),
        }))
    }
}

/// Serve the processor on an already-bound listener. Tests bind port 0
/// and hand the listener over.
pub async fn serve_with_listener(
    service: ProcessorService,
    listener: tokio::net::TcpListener,
) -> Result<(), tonic::transport::Error> {
    tonic::transport::Server::builder()
        .add_service(service.into_service())
        .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use wireflow_codec::proto::{header_value, Generic, HeaderEntry, HeaderValue};

    async fn ping_once(service: &ProcessorService) -> Result<String, Status> {
        service
            .ping(Request::new(PingRequest {}))
            .await
            .map(|r| r.into_inner().message)
    }

    #[tokio::test]
    async fn ping_fails_every_third_call_and_cycles() {
        let service = ProcessorService::new();

        for _ in 0..2 {
            assert_eq!(ping_once(&service).await.unwrap(), "alive");
        }
        let err = ping_once(&service).await.unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unavailable);

        // Counter reset: the cycle repeats.
        for _ in 0..2 {
            assert_eq!(ping_once(&service).await.unwrap(), "alive");
        }
        assert!(ping_once(&service).await.is_err());
    }

    #[tokio::test]
    async fn process_uppercases_and_keeps_headers() {
        let service = ProcessorService::new();
        let headers = vec![HeaderEntry {
            key: "lang".into(),
            value: Some(HeaderValue {
                value: Some(header_value::Value::Generic(Generic {
                    kind: Some(wireflow_codec::proto::generic::Kind::String("en".into())),
                })),
            }),
        }];

        let reply = service
            .process(Request::new(Envelope {
                payload: b"hello".to_vec(),
                headers: headers.clone(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(reply.payload, b"HELLO");
        assert_eq!(reply.headers, headers);
    }
}
