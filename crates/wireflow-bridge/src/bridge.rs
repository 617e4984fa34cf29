//! The streaming bridge.
//!
//! Moves an application-side asynchronous sequence of messages into
//! the outbound half of one bidirectional gRPC exchange and surfaces
//! the inbound half as a stream of decoded messages.
//!
//! ```text
//! outbound source ──> encode ──> bounded feed ──> transport ──┐
//!                                                             │ server
//! consumer <── decode <────────── inbound half <──────────────┘
//! ```
//!
//! Per exchange, order is preserved end to end in each direction.
//! Outbound exhaustion half-closes the send direction; the inbound
//! half stays open until the server completes or fails. A source or
//! encode error aborts the exchange and terminates the inbound stream
//! with that error. Dropping the inbound stream cancels both
//! directions and unwinds the feeder task; pending outbound items are
//! discarded, not flushed.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;
use tonic::Streaming;
use tracing::debug;

use wireflow_codec::proto::processor_client::ProcessorClient;
use wireflow_codec::proto::Envelope;
use wireflow_codec::{decode_envelope, AppMessage, CodecResult, EnvelopeBuilder, ValuePolicy};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};

/// Outbound feed capacity. Bounds how far the source can run ahead of
/// transport readiness; the feeder suspends when the buffer is full.
const OUTBOUND_BUFFER: usize = 16;

/// Client-side bridge over one gRPC channel.
///
/// Cloning is cheap (tonic channels are shared handles); each call to
/// [`Bridge::open`] owns exactly one exchange, and exchanges share no
/// mutable state.
#[derive(Debug, Clone)]
pub struct Bridge {
    client: ProcessorClient<Channel>,
    include_headers: bool,
    policy: ValuePolicy,
}

/// Encode one message per the include-headers switch. When headers are
/// excluded only the payload rides on the wire.
fn encode_envelope(
    message: &AppMessage,
    include_headers: bool,
    policy: ValuePolicy,
) -> CodecResult<Envelope> {
    let builder = EnvelopeBuilder::new(policy);
    let builder = if include_headers {
        builder.from_message(message)
    } else {
        builder.payload(message.payload())
    };
    builder.build()
}

impl Bridge {
    /// Connect to the remote processor described by `config`.
    pub async fn connect(config: &BridgeConfig) -> BridgeResult<Self> {
        let channel = config.endpoint()?.connect().await?;
        Ok(Self::with_channel(channel, config))
    }

    /// Wrap an existing channel. Tests connect to ephemeral ports this
    /// way.
    pub fn with_channel(channel: Channel, config: &BridgeConfig) -> Self {
        let mut client = ProcessorClient::new(channel);
        if config.max_message_size > 0 {
            client = client.max_decoding_message_size(config.max_message_size);
        }
        Self {
            client,
            include_headers: config.include_headers,
            policy: config.policy,
        }
    }

    /// Process a single message through the unary RPC: the degenerate
    /// one-item case of the same encode/decode machinery.
    pub async fn process(&mut self, message: &AppMessage) -> BridgeResult<AppMessage> {
        let envelope = encode_envelope(message, self.include_headers, self.policy)?;
        let reply = self.client.process(envelope).await?.into_inner();
        Ok(decode_envelope(reply)?)
    }

    /// Open one bidirectional exchange.
    ///
    /// Items pulled from `outbound` are encoded and sent in strict
    /// FIFO order; the returned stream yields the decoded replies in
    /// arrival order. The source is pulled lazily: when the transport
    /// is not ready the feed fills up and pulling suspends, so a
    /// possibly-infinite source never outruns the peer.
    pub async fn open<S>(&mut self, outbound: S) -> BridgeResult<Inbound>
    where
        S: Stream<Item = BridgeResult<AppMessage>> + Send + 'static,
    {
        let (feed, feed_rx) = mpsc::channel::<Envelope>(OUTBOUND_BUFFER);
        let (abort_tx, abort_rx) = oneshot::channel::<BridgeError>();

        let include_headers = self.include_headers;
        let policy = self.policy;

        tokio::spawn(async move {
            use tokio_stream::StreamExt;

            let mut outbound = std::pin::pin!(outbound);
            while let Some(item) = outbound.next().await {
                let envelope = match item.and_then(|message| {
                    encode_envelope(&message, include_headers, policy).map_err(BridgeError::from)
                }) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        // Abort the exchange; the consumer sees this
                        // error as the terminating event.
                        let _ = abort_tx.send(e);
                        return;
                    }
                };
                if feed.send(envelope).await.is_err() {
                    debug!("outbound feed closed; stopping source pump");
                    return;
                }
            }
            // Source exhausted: dropping the sender half-closes the
            // outbound direction. The inbound half stays open.
        });

        let response = self
            .client
            .stream(ReceiverStream::new(feed_rx))
            .await?;

        Ok(Inbound {
            inbound: response.into_inner(),
            abort: Some(abort_rx),
            done: false,
        })
    }
}

/// The inbound half of one exchange: decoded replies in arrival order.
///
/// Terminates with an error if the transport fails, a reply fails to
/// decode, or the outbound side aborted the exchange. After the
/// terminating item the stream yields `None`. Dropping it releases
/// both directions of the exchange.
pub struct Inbound {
    inbound: Streaming<Envelope>,
    abort: Option<oneshot::Receiver<BridgeError>>,
    done: bool,
}

impl Inbound {
    /// Layer the blocking, thread-per-call adapter on top of this
    /// exchange. Must be called from within the runtime driving it.
    pub fn into_blocking(self) -> crate::blocking::BlockingInbound {
        crate::blocking::BlockingInbound::new(self)
    }
}

impl Stream for Inbound {
    type Item = BridgeResult<AppMessage>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        // An outbound-side failure aborts the exchange: it wins over
        // anything the transport still has buffered.
        if let Some(abort) = this.abort.as_mut() {
            match Pin::new(abort).poll(cx) {
                Poll::Ready(Ok(e)) => {
                    this.abort = None;
                    this.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
                // Feeder finished without error.
                Poll::Ready(Err(_)) => this.abort = None,
                Poll::Pending => {}
            }
        }

        match Pin::new(&mut this.inbound).poll_next(cx) {
            Poll::Ready(Some(Ok(envelope))) => match decode_envelope(envelope) {
                Ok(message) => Poll::Ready(Some(Ok(message))),
                Err(e) => {
                    this.done = true;
                    Poll::Ready(Some(Err(e.into())))
                }
            },
            Poll::Ready(Some(Err(status))) => {
                this.done = true;
                Poll::Ready(Some(Err(BridgeError::Transport(status))))
            }
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
