//! Capturing bid bus double.

use seatswap_core::bus::{BidBus, BusError, BusFuture};
use seatswap_core::types::BidUpdate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Durable-publish double that records every update it is handed.
///
/// Flip [`set_failing`](Self::set_failing) to exercise the degraded-delivery
/// path: the coordinator must log and carry on, never fail the bid.
#[derive(Clone, Default)]
pub struct CapturingBidBus {
    published: Arc<Mutex<Vec<BidUpdate>>>,
    failing: Arc<AtomicBool>,
}

impl CapturingBidBus {
    /// Create an empty, succeeding bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent publishes fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Everything published so far, in order.
    #[must_use]
    pub fn published(&self) -> Vec<BidUpdate> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BidBus for CapturingBidBus {
    fn publish(&self, update: &BidUpdate) -> BusFuture<'_, ()> {
        let bus = self.clone();
        let update = update.clone();
        Box::pin(async move {
            if bus.failing.load(Ordering::SeqCst) {
                return Err(BusError::PublishFailed {
                    channel: update.channel(),
                    reason: "injected publish failure".into(),
                });
            }
            bus.published
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(update);
            Ok(())
        })
    }
}
