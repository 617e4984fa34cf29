//! Blocking consumption adapter.
//!
//! Layers a bounded queue and a blocking receive over an exchange's
//! async inbound stream, for thread-per-call consumers. The same
//! exchange machinery backs both styles; this adapter is the only
//! place a thread waits.

use tokio::sync::mpsc;

use wireflow_codec::AppMessage;

use crate::bridge::Inbound;
use crate::error::BridgeResult;

/// Handoff queue depth between the async exchange and the blocking
/// consumer.
const QUEUE_DEPTH: usize = 16;

/// Pull-style view of an exchange's inbound half.
///
/// [`BlockingInbound::next`] blocks the calling thread until the next
/// decoded message, the terminating error, or completion. Dropping
/// this cancels the exchange, same as dropping [`Inbound`].
pub struct BlockingInbound {
    rx: mpsc::Receiver<BridgeResult<AppMessage>>,
}

impl BlockingInbound {
    /// Spawns the forwarding task on the current runtime; the caller
    /// must therefore be inside one.
    pub(crate) fn new(inbound: Inbound) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);

        tokio::spawn(async move {
            use tokio_stream::StreamExt;

            let mut inbound = inbound;
            while let Some(item) = inbound.next().await {
                let terminal = item.is_err();
                if tx.send(item).await.is_err() {
                    // Consumer dropped; the exchange unwinds with us.
                    return;
                }
                if terminal {
                    return;
                }
            }
        });

        Self { rx }
    }

    /// Block until the next item. `None` means the exchange completed
    /// normally; an `Err` item is terminal.
    ///
    /// Must not be called from a runtime thread; it would block the
    /// driver of the very exchange it waits on.
    pub fn next(&mut self) -> Option<BridgeResult<AppMessage>> {
        self.rx.blocking_recv()
    }
}
