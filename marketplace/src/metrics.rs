//! Business metrics for the marketplace.
//!
//! # Exported Metrics
//!
//! - `seatswap_listings_created_total` — listings successfully created
//! - `seatswap_bids_placed_total{kind}` — accepted bid writes by kind
//!   (`new`, `update`)
//! - `seatswap_bid_publish_failures_total` — durable publishes that failed
//!   after the bid write committed
//! - `seatswap_settlements_total{outcome}` — purchase outcomes (`settled`,
//!   `rejected`, `pending`)
//! - `seatswap_reconciliation_required_total` — settlements that left the
//!   two systems of record inconsistent

use metrics::{counter, describe_counter};
use seatswap_core::types::BidKind;

/// Register metric descriptions. Call once at startup, before any metric is
/// recorded.
pub fn register_market_metrics() {
    describe_counter!(
        "seatswap_listings_created_total",
        "Total listings successfully created"
    );
    describe_counter!(
        "seatswap_bids_placed_total",
        "Total accepted bid writes by kind (new, update)"
    );
    describe_counter!(
        "seatswap_bid_publish_failures_total",
        "Durable bid publishes that failed after the off-chain write committed"
    );
    describe_counter!(
        "seatswap_settlements_total",
        "Purchase outcomes (settled, rejected, pending)"
    );
    describe_counter!(
        "seatswap_reconciliation_required_total",
        "Settlements that require operator reconciliation"
    );

    tracing::info!("market metrics registered");
}

/// Record a successfully created listing.
pub fn record_listing_created() {
    counter!("seatswap_listings_created_total").increment(1);
}

/// Record an accepted bid write.
pub fn record_bid_placed(kind: BidKind) {
    let kind = match kind {
        BidKind::New => "new",
        BidKind::Update => "update",
    };
    counter!("seatswap_bids_placed_total", "kind" => kind).increment(1);
}

/// Record a failed durable publish.
pub fn record_bid_publish_failure() {
    counter!("seatswap_bid_publish_failures_total").increment(1);
}

/// Record a purchase outcome.
pub fn record_settlement(outcome: &'static str) {
    counter!("seatswap_settlements_total", "outcome" => outcome).increment(1);
}

/// Record a settlement that left the systems of record inconsistent.
pub fn record_reconciliation_required() {
    counter!("seatswap_reconciliation_required_total").increment(1);
}
