//! Reply delivery worker.
//!
//! The reply handler pushes replies onto an [`Outbox`] and moves on; a
//! background loop drains it and hands each reply to the gateway. Delivery is
//! at-most-once: failures are logged and dropped, never retried.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::channels::{DynGateway, OutgoingReply};

/// Sending half of the reply queue
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<OutgoingReply>,
}

impl Outbox {
    /// Create an outbox and the receiver the delivery loop drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutgoingReply>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a reply without waiting for delivery.
    ///
    /// Returns `false` if the delivery loop has gone away.
    pub fn send(&self, reply: OutgoingReply) -> bool {
        match self.tx.send(reply) {
            Ok(()) => true,
            Err(mpsc::error::SendError(reply)) => {
                warn!(in_reply_to = %reply.in_reply_to, "outbox closed, dropping reply");
                false
            }
        }
    }
}

/// Delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: u64,
    pub failed: u64,
}

/// Run the delivery loop until every outbox handle is dropped.
pub async fn delivery_loop(
    mut rx: mpsc::UnboundedReceiver<OutgoingReply>,
    gateway: DynGateway,
) -> DeliveryStats {
    let mut stats = DeliveryStats::default();

    while let Some(reply) = rx.recv().await {
        match gateway.publish(&reply).await {
            Ok(()) => {
                stats.delivered += 1;
                debug!(in_reply_to = %reply.in_reply_to, gateway = gateway.name(), "reply delivered");
            }
            Err(e) => {
                stats.failed += 1;
                warn!(
                    in_reply_to = %reply.in_reply_to,
                    gateway = gateway.name(),
                    error = %e,
                    "reply delivery failed, not retrying"
                );
            }
        }
    }

    stats
}
