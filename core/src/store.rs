//! Record store abstraction over the off-chain transactional store.
//!
//! The store exclusively owns the three entities (tickets, listings, bids)
//! and is the single source of off-chain truth. Absent rows are `None`,
//! distinguishable from [`StoreError`]; uniqueness violations surface as
//! [`StoreError::Conflict`] so callers can translate check-then-write race
//! losses into business errors instead of raw storage failures.
//!
//! # Dyn Compatibility
//!
//! Methods return explicit `Pin<Box<dyn Future>>` instead of `async fn` so
//! the trait can be used as `Arc<dyn RecordStore>` and injected into each
//! coordinator at construction time.

use crate::types::{
    Bid, Listing, ListingId, ListingView, NewListing, Price, Ticket, TokenId, WalletAddress,
};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors surfaced by record store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A query failed inside the store.
    #[error("store query failed: {0}")]
    Query(String),

    /// A uniqueness constraint rejected the write.
    #[error("uniqueness conflict on {constraint}")]
    Conflict {
        /// The violated constraint.
        constraint: String,
    },

    /// A stored row could not be decoded into its domain type.
    #[error("stored row could not be decoded: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether this error is a uniqueness-constraint rejection.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Boxed future returned by store methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Narrow interface to the transactional store holding tickets, listings,
/// and bids.
///
/// Required constraints, enforced by every implementation:
///
/// - `listings(token_id)` is unique — one listing row per token, regardless
///   of expiry
/// - `bids(token_id, bidder)` is unique — one bid row per pair
///
/// These constraints are the concurrency backstop: two tasks may both read
/// "absent" and both attempt an insert, and the store must reject exactly one
/// with [`StoreError::Conflict`].
pub trait RecordStore: Send + Sync {
    /// Load the ticket for a token.
    fn ticket(&self, token_id: TokenId) -> StoreFuture<'_, Option<Ticket>>;

    /// Write a new owner on the ticket for a token, returning the updated
    /// ticket or `None` when no such ticket exists.
    fn update_ticket_owner(
        &self,
        token_id: TokenId,
        new_owner: WalletAddress,
    ) -> StoreFuture<'_, Option<Ticket>>;

    /// Insert a listing, assigning its identity, and return the created row.
    ///
    /// Fails with [`StoreError::Conflict`] when a listing row for the token
    /// already exists.
    fn insert_listing(&self, listing: NewListing) -> StoreFuture<'_, Listing>;

    /// Load a listing by identifier.
    fn listing(&self, id: ListingId) -> StoreFuture<'_, Option<Listing>>;

    /// Load the listing row for a token, expired or not.
    fn listing_for_token(&self, token_id: TokenId) -> StoreFuture<'_, Option<Listing>>;

    /// Delete a listing by identifier, returning the number of rows removed.
    ///
    /// Zero rows is a signal, not an error: the settlement workflow treats it
    /// as losing the retire race.
    fn delete_listing(&self, id: ListingId) -> StoreFuture<'_, u64>;

    /// Project all listings expiring strictly after `now`, joined with ticket
    /// event metadata, ordered by creation time descending.
    fn active_listings(&self, now: DateTime<Utc>) -> StoreFuture<'_, Vec<ListingView>>;

    /// Load the bid for a `(token, bidder)` pair.
    fn bid(&self, token_id: TokenId, bidder: WalletAddress) -> StoreFuture<'_, Option<Bid>>;

    /// Insert a first bid for a `(token, bidder)` pair and return the row.
    ///
    /// Fails with [`StoreError::Conflict`] when the pair already has a bid.
    fn insert_bid(&self, bid: Bid) -> StoreFuture<'_, Bid>;

    /// Raise an existing bid in place, only when `amount` strictly exceeds
    /// the stored amount.
    ///
    /// Returns the updated row, or `None` when no row matched — either the
    /// pair has no bid or the stored amount is already at or above `amount`.
    /// The comparison and write are a single atomic store operation so the
    /// monotonic-amount invariant holds under concurrent raises.
    fn raise_bid(
        &self,
        token_id: TokenId,
        bidder: WalletAddress,
        amount: Price,
        placed_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Bid>>;
}
