//! In-memory record store with real conflict semantics.

use chrono::{DateTime, Utc};
use seatswap_core::store::{RecordStore, StoreError, StoreFuture};
use seatswap_core::types::{
    Bid, Listing, ListingId, ListingView, NewListing, Price, Ticket, TokenId, WalletAddress,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    tickets: HashMap<i64, Ticket>,
    listings: HashMap<Uuid, Listing>,
    bids: HashMap<(i64, String), Bid>,
}

/// In-memory [`RecordStore`] double.
///
/// Enforces the same uniqueness constraints as the Postgres store — one
/// listing row per token, one bid row per `(token, bidder)` — and returns the
/// same [`StoreError::Conflict`] constraint names, so race-loser translation
/// is exercised by tests exactly as it runs in production.
///
/// Failure injection: [`fail_ticket_updates`](Self::fail_ticket_updates) and
/// [`fail_listing_deletes`](Self::fail_listing_deletes) make the
/// corresponding writes fail, which is how the reconciliation-required paths
/// of the settlement workflow are driven.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<Mutex<Inner>>,
    ticket_updates_fail: Arc<AtomicBool>,
    listing_deletes_fail: Arc<AtomicBool>,
    listing_deletes_miss: Arc<AtomicBool>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a ticket (external provisioning stands outside the trait).
    pub fn put_ticket(&self, ticket: Ticket) {
        self.lock().tickets.insert(ticket.token_id.as_i64(), ticket);
    }

    /// Make subsequent ticket-owner updates fail with a storage error.
    pub fn fail_ticket_updates(&self, fail: bool) {
        self.ticket_updates_fail.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent listing deletes fail with a storage error.
    pub fn fail_listing_deletes(&self, fail: bool) {
        self.listing_deletes_fail.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent listing deletes affect zero rows, as if a concurrent
    /// purchase retired the listing first.
    pub fn miss_listing_deletes(&self, miss: bool) {
        self.listing_deletes_miss.store(miss, Ordering::SeqCst);
    }

    /// Current owner of a token, for assertions.
    #[must_use]
    pub fn ticket_owner(&self, token_id: TokenId) -> Option<WalletAddress> {
        self.lock()
            .tickets
            .get(&token_id.as_i64())
            .map(|t| t.owner.clone())
    }

    /// Number of listing rows, for assertions.
    #[must_use]
    pub fn listing_count(&self) -> usize {
        self.lock().listings.len()
    }

    /// Stored bid amount for a pair, for assertions.
    #[must_use]
    pub fn bid_amount(&self, token_id: TokenId, bidder: &WalletAddress) -> Option<Price> {
        self.lock()
            .bids
            .get(&(token_id.as_i64(), bidder.as_str().to_owned()))
            .map(|b| b.amount)
    }
}

impl RecordStore for MemoryRecordStore {
    fn ticket(&self, token_id: TokenId) -> StoreFuture<'_, Option<Ticket>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().tickets.get(&token_id.as_i64()).cloned()) })
    }

    fn update_ticket_owner(
        &self,
        token_id: TokenId,
        new_owner: WalletAddress,
    ) -> StoreFuture<'_, Option<Ticket>> {
        let store = self.clone();
        Box::pin(async move {
            if store.ticket_updates_fail.load(Ordering::SeqCst) {
                return Err(StoreError::Query("injected ticket-update failure".into()));
            }
            let mut inner = store.lock();
            Ok(inner.tickets.get_mut(&token_id.as_i64()).map(|ticket| {
                ticket.owner = new_owner;
                ticket.clone()
            }))
        })
    }

    fn insert_listing(&self, listing: NewListing) -> StoreFuture<'_, Listing> {
        let store = self.clone();
        Box::pin(async move {
            let mut inner = store.lock();
            if inner
                .listings
                .values()
                .any(|l| l.token_id == listing.token_id)
            {
                return Err(StoreError::Conflict {
                    constraint: "listings_token_id_key".into(),
                });
            }
            let row = Listing {
                id: ListingId::new(),
                token_id: listing.token_id,
                price: listing.price,
                seller: listing.seller,
                expires_at: listing.expires_at,
                created_at: Utc::now(),
            };
            inner.listings.insert(*row.id.as_uuid(), row.clone());
            Ok(row)
        })
    }

    fn listing(&self, id: ListingId) -> StoreFuture<'_, Option<Listing>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().listings.get(id.as_uuid()).cloned()) })
    }

    fn listing_for_token(&self, token_id: TokenId) -> StoreFuture<'_, Option<Listing>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .lock()
                .listings
                .values()
                .find(|l| l.token_id == token_id)
                .cloned())
        })
    }

    fn delete_listing(&self, id: ListingId) -> StoreFuture<'_, u64> {
        let store = self.clone();
        Box::pin(async move {
            if store.listing_deletes_fail.load(Ordering::SeqCst) {
                return Err(StoreError::Query("injected listing-delete failure".into()));
            }
            if store.listing_deletes_miss.load(Ordering::SeqCst) {
                store.lock().listings.remove(id.as_uuid());
                return Ok(0);
            }
            Ok(u64::from(store.lock().listings.remove(id.as_uuid()).is_some()))
        })
    }

    fn active_listings(&self, now: DateTime<Utc>) -> StoreFuture<'_, Vec<ListingView>> {
        let store = self.clone();
        Box::pin(async move {
            let inner = store.lock();
            let mut views: Vec<ListingView> = inner
                .listings
                .values()
                .filter(|l| l.expires_at > now)
                .map(|l| ListingView {
                    id: l.id,
                    token_id: l.token_id,
                    price: l.price,
                    seller: l.seller.clone(),
                    expires_at: l.expires_at,
                    image_url: inner
                        .tickets
                        .get(&l.token_id.as_i64())
                        .and_then(|t| t.image_url.clone())
                        .unwrap_or_default(),
                    created_at: l.created_at,
                })
                .collect();
            views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(views)
        })
    }

    fn bid(&self, token_id: TokenId, bidder: WalletAddress) -> StoreFuture<'_, Option<Bid>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .lock()
                .bids
                .get(&(token_id.as_i64(), bidder.as_str().to_owned()))
                .cloned())
        })
    }

    fn insert_bid(&self, bid: Bid) -> StoreFuture<'_, Bid> {
        let store = self.clone();
        Box::pin(async move {
            let mut inner = store.lock();
            let key = (bid.token_id.as_i64(), bid.bidder.as_str().to_owned());
            if inner.bids.contains_key(&key) {
                return Err(StoreError::Conflict {
                    constraint: "bids_pkey".into(),
                });
            }
            inner.bids.insert(key, bid.clone());
            Ok(bid)
        })
    }

    fn raise_bid(
        &self,
        token_id: TokenId,
        bidder: WalletAddress,
        amount: Price,
        placed_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Bid>> {
        let store = self.clone();
        Box::pin(async move {
            let mut inner = store.lock();
            let key = (token_id.as_i64(), bidder.as_str().to_owned());
            // Compare-and-set under one lock, mirroring the single-statement
            // conditional update in Postgres.
            match inner.bids.get_mut(&key) {
                Some(bid) if bid.amount < amount => {
                    bid.amount = amount;
                    bid.placed_at = placed_at;
                    Ok(Some(bid.clone()))
                }
                _ => Ok(None),
            }
        })
    }
}
