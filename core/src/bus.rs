//! Bid fan-out: durable publish plus best-effort in-process push.
//!
//! Both sinks carry the same logical channel, `ticket:<tokenId>`:
//!
//! - [`BidFeed`] pushes directly to co-located live subscribers over
//!   per-channel broadcast channels; delivery is best-effort and never blocks
//!   or fails the producing request
//! - [`BidBus`] publishes durably for out-of-process subscribers
//!
//! Delivery on each sink is at-most-once and unordered relative to other
//! tokens.

use crate::types::BidUpdate;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{RwLock, broadcast};

/// Errors surfaced by durable bus implementations.
#[derive(Debug, Clone, Error)]
pub enum BusError {
    /// The bus client could not be configured or connected.
    #[error("bus connection failed: {0}")]
    ConnectionFailed(String),

    /// The publish did not reach the bus.
    #[error("publish failed for channel '{channel}': {reason}")]
    PublishFailed {
        /// Channel the update was destined for.
        channel: String,
        /// Reason reported by the bus client.
        reason: String,
    },
}

/// Boxed future returned by bus methods.
pub type BusFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BusError>> + Send + 'a>>;

/// Durable publish side of the bid fan-out, for out-of-process subscribers.
///
/// # Dyn Compatibility
///
/// Returns an explicit `Pin<Box<dyn Future>>` so the bus can be injected as
/// `Arc<dyn BidBus>`.
pub trait BidBus: Send + Sync {
    /// Publish one bid update on its `ticket:<tokenId>` channel.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::PublishFailed`] when the update did not reach the
    /// bus. The caller logs and degrades; the off-chain bid write has already
    /// committed and is not rolled back.
    fn publish(&self, update: &BidUpdate) -> BusFuture<'_, ()>;
}

/// Per-channel buffer depth for live subscribers. Slow consumers miss
/// updates rather than backpressure the producer.
const FEED_CAPACITY: usize = 256;

/// In-process bid feed for co-located live subscribers.
///
/// One broadcast channel per `ticket:<tokenId>` channel name, created lazily
/// on first subscribe. Pushing to a channel nobody subscribed to is a no-op.
#[derive(Clone, Default)]
pub struct BidFeed {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<BidUpdate>>>>,
}

impl BidFeed {
    /// Create an empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an update to live subscribers of its channel, best-effort.
    ///
    /// Returns the number of subscribers the update was handed to. Never
    /// blocks and never fails the caller: a missing channel or a channel with
    /// no receivers simply delivers to zero subscribers.
    pub async fn push(&self, update: &BidUpdate) -> usize {
        let channel = update.channel();
        let channels = self.channels.read().await;
        match channels.get(&channel) {
            Some(sender) => sender.send(update.clone()).unwrap_or(0),
            None => 0,
        }
    }

    /// Subscribe to a channel, creating it if needed.
    pub async fn subscribe(&self, channel: impl Into<String>) -> broadcast::Receiver<BidUpdate> {
        let mut channels = self.channels.write().await;
        channels
            .entry(channel.into())
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
            .subscribe()
    }
}
