//! Listing creation.

use chrono::{DateTime, Utc};
use seatswap_core::clock::Clock;
use seatswap_core::error::{MarketError, MarketResult};
use seatswap_core::store::RecordStore;
use seatswap_core::types::{
    Listing, ListingAnnouncement, NewListing, Price, TokenId, WalletAddress, Wei,
};
use serde::Serialize;
use std::sync::Arc;

/// A freshly created listing plus the on-chain announcement payload the
/// caller is responsible for submitting.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedListing {
    /// The stored listing row.
    pub listing: Listing,
    /// Payload for the caller's on-chain listing transaction.
    pub announcement: ListingAnnouncement,
}

/// Creates and validates listings.
pub struct ListingManager {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl ListingManager {
    /// Create a manager over the given store and clock.
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Create a listing for `token_id` at `price`, expiring at `expires_at`.
    ///
    /// Ordering of checks is load-bearing: validation first (no I/O), then
    /// ownership, then duplication. The duplication check covers *any*
    /// existing row for the token, expired or not, and the store's unique
    /// constraint backstops the check-then-insert race — a conflicting
    /// concurrent insert surfaces as [`MarketError::AlreadyListed`], never as
    /// a raw storage error.
    ///
    /// # Errors
    ///
    /// - [`MarketError::Validation`] — negative token id, non-positive or
    ///   over-precise price, expiration not in the future
    /// - [`MarketError::NotOwnerOrNotFound`] — no ticket for the token, or
    ///   the ticket is owned by someone else (indistinguishable on purpose)
    /// - [`MarketError::AlreadyListed`] — a listing row for the token exists
    /// - [`MarketError::Storage`] — the store failed
    pub async fn create(
        &self,
        token_id: TokenId,
        price: Price,
        expires_at: DateTime<Utc>,
        seller: WalletAddress,
    ) -> MarketResult<CreatedListing> {
        if token_id.as_i64() < 0 {
            return Err(MarketError::Validation(
                "token id must be non-negative".into(),
            ));
        }
        let price_wei = Wei::from_price(price)
            .map_err(|e| MarketError::Validation(format!("price: {e}")))?;
        if expires_at <= self.clock.now() {
            return Err(MarketError::Validation(
                "expiration must be in the future".into(),
            ));
        }

        let ticket = self
            .store
            .ticket(token_id)
            .await?
            .ok_or(MarketError::NotOwnerOrNotFound)?;
        if ticket.owner != seller {
            return Err(MarketError::NotOwnerOrNotFound);
        }

        if self.store.listing_for_token(token_id).await?.is_some() {
            return Err(MarketError::AlreadyListed);
        }

        let inserted = self
            .store
            .insert_listing(NewListing {
                token_id,
                price,
                seller: seller.clone(),
                expires_at,
            })
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    MarketError::AlreadyListed
                } else {
                    MarketError::Storage(e)
                }
            })?;

        tracing::info!(
            listing_id = %inserted.id,
            token_id = %token_id,
            price = %price,
            seller = %seller,
            "listing created"
        );
        crate::metrics::record_listing_created();

        Ok(CreatedListing {
            announcement: ListingAnnouncement {
                token_id,
                price_wei,
                seller,
            },
            listing: inserted,
        })
    }
}
