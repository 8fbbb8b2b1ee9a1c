//! Listing/bid coordination and the settlement workflow.
//!
//! Four coordinators, each owning one operation family and holding injected
//! handles to the leaf interfaces:
//!
//! - [`ListingManager`] — creates listings against ownership and duplication
//!   rules
//! - [`BidCoordinator`] — merges concurrent bids under the monotonic-increase
//!   and one-bid-per-bidder invariants, then fans updates out
//! - [`SettlementCoordinator`] — drives a purchase across the store and the
//!   ledger without producing silent inconsistency
//! - [`ListingQueries`] — the read-side discovery projection
//!
//! No coordinator holds a lock across its multi-step sequence; the store's
//! uniqueness constraints and the retire-delete are the only serialization
//! points, exactly as the concurrency model requires.

mod bids;
mod listings;
mod queries;
mod settlement;

pub use bids::BidCoordinator;
pub use listings::{CreatedListing, ListingManager};
pub use queries::ListingQueries;
pub use settlement::{SettlementCoordinator, SettlementReceipt};
