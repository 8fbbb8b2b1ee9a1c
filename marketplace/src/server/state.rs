//! Application state for the marketplace HTTP server.

use crate::market::{BidCoordinator, ListingManager, ListingQueries, SettlementCoordinator};
use seatswap_core::bus::{BidBus, BidFeed};
use seatswap_core::clock::Clock;
use seatswap_core::ledger::LedgerGateway;
use seatswap_core::store::RecordStore;
use std::sync::Arc;

/// Shared state cloned (cheaply, via `Arc`) into every handler.
///
/// Construction is the single wiring point: handlers and coordinators never
/// reach for process-wide globals, so tests assemble the same state over
/// in-memory fakes.
#[derive(Clone)]
pub struct AppState {
    /// Listing creation.
    pub listings: Arc<ListingManager>,
    /// Bid acceptance and fan-out.
    pub bids: Arc<BidCoordinator>,
    /// Purchase settlement.
    pub settlement: Arc<SettlementCoordinator>,
    /// Read-side discovery.
    pub queries: Arc<ListingQueries>,
    /// Live bid feed, shared with the WebSocket handler.
    pub feed: BidFeed,
}

impl AppState {
    /// Wire the coordinators over the given leaf handles.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        ledger: Arc<dyn LedgerGateway>,
        bus: Arc<dyn BidBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let feed = BidFeed::new();
        Self {
            listings: Arc::new(ListingManager::new(store.clone(), clock.clone())),
            bids: Arc::new(BidCoordinator::new(
                store.clone(),
                feed.clone(),
                bus,
                clock.clone(),
            )),
            settlement: Arc::new(SettlementCoordinator::new(store.clone(), ledger)),
            queries: Arc::new(ListingQueries::new(store, clock)),
            feed,
        }
    }
}
