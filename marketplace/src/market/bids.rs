//! Bid acceptance and fan-out.

use seatswap_core::bus::{BidBus, BidFeed};
use seatswap_core::clock::Clock;
use seatswap_core::error::{MarketError, MarketResult};
use seatswap_core::store::{RecordStore, StoreError};
use seatswap_core::types::{Bid, BidKind, BidUpdate, Price, TokenId, WalletAddress};
use std::sync::Arc;

/// Accepts bids, enforces the per-pair invariants, and fans out updates.
///
/// Two invariants, both ultimately enforced by the store rather than by this
/// process:
///
/// - one bid row per `(token, bidder)` pair — the first-bid insert race is
///   settled by the store's uniqueness constraint
/// - per-pair amounts strictly increase — raises are a single conditional
///   store update, so an interleaved raise can never move an amount down
///
/// No cross-bidder ranking happens here: bids are competing informational
/// offers, and purchases execute at the listing price regardless of any bid.
pub struct BidCoordinator {
    store: Arc<dyn RecordStore>,
    feed: BidFeed,
    bus: Arc<dyn BidBus>,
    clock: Arc<dyn Clock>,
}

impl BidCoordinator {
    /// Create a coordinator over the given store, fan-out sinks, and clock.
    pub fn new(
        store: Arc<dyn RecordStore>,
        feed: BidFeed,
        bus: Arc<dyn BidBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            feed,
            bus,
            clock,
        }
    }

    /// Place or raise a bid, returning the update that was fanned out.
    ///
    /// # Errors
    ///
    /// - [`MarketError::Validation`] — negative token id or non-positive
    ///   amount
    /// - [`MarketError::BidTooLow`] — the amount does not strictly exceed the
    ///   bidder's stored amount (including when a concurrent write got there
    ///   first); carries the stored amount as retry guidance
    /// - [`MarketError::Storage`] — the store failed
    pub async fn place_bid(
        &self,
        token_id: TokenId,
        bidder: WalletAddress,
        amount: Price,
    ) -> MarketResult<BidUpdate> {
        if token_id.as_i64() < 0 {
            return Err(MarketError::Validation(
                "token id must be non-negative".into(),
            ));
        }
        if amount <= Price::ZERO {
            return Err(MarketError::Validation("amount must be positive".into()));
        }

        let placed_at = self.clock.now();
        let existing = self.store.bid(token_id, bidder.clone()).await?;
        let kind = match existing {
            None => self.first_bid(token_id, &bidder, amount, placed_at).await?,
            Some(current) => {
                if amount <= current.amount {
                    return Err(MarketError::BidTooLow {
                        current: current.amount,
                    });
                }
                self.raise(token_id, &bidder, amount, placed_at).await?
            }
        };

        let update = BidUpdate {
            token_id,
            bidder,
            amount,
            placed_at,
            kind,
        };
        self.fan_out(&update).await;
        crate::metrics::record_bid_placed(kind);
        Ok(update)
    }

    /// Insert the pair's first bid. A conflict means a concurrent bid from
    /// the same bidder won the insert race; re-read and report the stored
    /// amount as [`MarketError::BidTooLow`] retry guidance.
    async fn first_bid(
        &self,
        token_id: TokenId,
        bidder: &WalletAddress,
        amount: Price,
        placed_at: chrono::DateTime<chrono::Utc>,
    ) -> MarketResult<BidKind> {
        let insert = self
            .store
            .insert_bid(Bid {
                token_id,
                bidder: bidder.clone(),
                amount,
                placed_at,
            })
            .await;
        match insert {
            Ok(_) => Ok(BidKind::New),
            Err(e) if e.is_conflict() => Err(self.lost_race(token_id, bidder).await),
            Err(e) => Err(MarketError::Storage(e)),
        }
    }

    /// Raise an existing bid. `None` from the store means the conditional
    /// update matched nothing — a concurrent raise moved the amount to or
    /// past ours first.
    async fn raise(
        &self,
        token_id: TokenId,
        bidder: &WalletAddress,
        amount: Price,
        placed_at: chrono::DateTime<chrono::Utc>,
    ) -> MarketResult<BidKind> {
        let updated = self
            .store
            .raise_bid(token_id, bidder.clone(), amount, placed_at)
            .await?;
        match updated {
            Some(_) => Ok(BidKind::Update),
            None => Err(self.lost_race(token_id, bidder).await),
        }
    }

    /// Translate a lost write race into retry guidance carrying the winner's
    /// amount.
    async fn lost_race(&self, token_id: TokenId, bidder: &WalletAddress) -> MarketError {
        match self.store.bid(token_id, bidder.clone()).await {
            Ok(Some(current)) => MarketError::BidTooLow {
                current: current.amount,
            },
            Ok(None) => MarketError::Storage(StoreError::Query(
                "bid row vanished after a write conflict".into(),
            )),
            Err(e) => MarketError::Storage(e),
        }
    }

    /// Push to live subscribers and publish durably. Best-effort on both
    /// sinks: the off-chain write has committed, so a delivery failure is
    /// degraded fan-out, never a failed bid.
    async fn fan_out(&self, update: &BidUpdate) {
        let delivered = self.feed.push(update).await;
        tracing::debug!(
            channel = %update.channel(),
            subscribers = delivered,
            "bid update pushed to live subscribers"
        );

        if let Err(e) = self.bus.publish(update).await {
            tracing::warn!(
                channel = %update.channel(),
                error = %e,
                "durable bid publish failed; live subscribers were still served"
            );
            crate::metrics::record_bid_publish_failure();
        }
    }
}
