//! The purchase workflow across two systems of record.

use seatswap_core::error::{MarketError, MarketResult};
use seatswap_core::ledger::{LedgerError, LedgerGateway, TxReference};
use seatswap_core::store::RecordStore;
use seatswap_core::types::{ListingId, TokenId, WalletAddress, Wei};
use serde::Serialize;
use std::sync::Arc;

/// Result of a fully settled purchase.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    /// The retired listing.
    pub listing_id: ListingId,
    /// The transferred token.
    pub token_id: TokenId,
    /// The new owner.
    pub buyer: WalletAddress,
    /// Reference of the finalized on-chain transaction.
    pub tx_reference: TxReference,
}

/// Drives purchases: fetch listing, settle on-chain, mirror ownership,
/// retire the listing.
///
/// The workflow is a straight-line state machine with failure exits at each
/// step. Everything before confirmation is safe to retry; everything after
/// it sits past the funds boundary, where an off-chain failure can only be
/// surfaced as [`MarketError::ReconciliationRequired`] — there is no
/// automatic rollback of a settled on-chain transfer.
///
/// There is deliberately no purchase lock: the retire-delete is the de-facto
/// serialization point, and the concurrent loser observes a zero-row delete.
pub struct SettlementCoordinator {
    store: Arc<dyn RecordStore>,
    ledger: Arc<dyn LedgerGateway>,
}

impl SettlementCoordinator {
    /// Create a coordinator over the given store and ledger gateway.
    pub fn new(store: Arc<dyn RecordStore>, ledger: Arc<dyn LedgerGateway>) -> Self {
        Self { store, ledger }
    }

    /// Purchase the listing, settling at its fixed price.
    ///
    /// # Errors
    ///
    /// - [`MarketError::ListingNotFound`] — no such listing (including one
    ///   already retired by an earlier purchase); no gateway call is made
    /// - [`MarketError::SettlementFailed`] — the contract rejected the
    ///   submission before funds moved; safe to retry
    /// - [`MarketError::SettlementPending`] — submission accepted but the
    ///   outcome is unknown; never retried automatically
    /// - [`MarketError::AlreadySettled`] — a concurrent purchase retired the
    ///   listing first
    /// - [`MarketError::ReconciliationRequired`] — on-chain settled, but the
    ///   ownership mirror or the retire step failed off-chain
    #[tracing::instrument(skip(self), fields(listing_id = %listing_id, buyer = %buyer))]
    pub async fn purchase(
        &self,
        listing_id: ListingId,
        buyer: WalletAddress,
    ) -> MarketResult<SettlementReceipt> {
        // Fetched
        let listing = self
            .store
            .listing(listing_id)
            .await?
            .ok_or(MarketError::ListingNotFound)?;
        let value = Wei::from_price(listing.price)
            .map_err(|e| MarketError::Validation(format!("listing price: {e}")))?;

        // OnChainSubmitted — nothing has moved until the gateway accepts.
        let pending = self
            .ledger
            .submit_purchase(listing.token_id, value)
            .await
            .map_err(|e| MarketError::SettlementFailed {
                reason: e.to_string(),
            })?;
        tracing::info!(
            token_id = %listing.token_id,
            value = %value,
            submission_id = %pending.submission_id,
            "settlement submitted"
        );

        // OnChainConfirmed — the funds boundary.
        let submission_id = pending.submission_id.clone();
        let tx = match self.ledger.await_confirmation(pending).await {
            Ok(tx) => tx,
            Err(LedgerError::Rejected { reason }) => {
                // Rejected at finality: funds did not move, retry is safe.
                crate::metrics::record_settlement("rejected");
                return Err(MarketError::SettlementFailed { reason });
            }
            Err(unknown @ (LedgerError::ConfirmationTimeout { .. } | LedgerError::Transport(_))) => {
                // The submission was accepted; assuming failure here could
                // double-spend the buyer on a retry.
                crate::metrics::record_settlement("pending");
                return Err(MarketError::SettlementPending {
                    submission_id,
                    detail: unknown.to_string(),
                });
            }
        };

        // OwnershipUpdated
        self.mirror_ownership(listing.token_id, &buyer, &tx).await?;

        // ListingRetired
        self.retire_listing(listing_id, &tx).await?;

        tracing::info!(tx_reference = %tx, "settlement complete");
        crate::metrics::record_settlement("settled");
        Ok(SettlementReceipt {
            listing_id,
            token_id: listing.token_id,
            buyer,
            tx_reference: tx,
        })
    }

    /// Mirror the confirmed transfer into the off-chain owner column. Any
    /// failure past this point is fatal for automation.
    async fn mirror_ownership(
        &self,
        token_id: TokenId,
        buyer: &WalletAddress,
        tx: &TxReference,
    ) -> MarketResult<()> {
        let updated = self
            .store
            .update_ticket_owner(token_id, buyer.clone())
            .await;
        match updated {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(self.reconciliation(tx, "ticket row missing during ownership update")),
            Err(e) => Err(self.reconciliation(tx, &format!("ownership update failed: {e}"))),
        }
    }

    /// Delete the listing row. Zero rows affected is the concurrent-loser
    /// signal, not success and not a crash.
    async fn retire_listing(&self, listing_id: ListingId, tx: &TxReference) -> MarketResult<()> {
        match self.store.delete_listing(listing_id).await {
            Ok(0) => {
                tracing::warn!(
                    listing_id = %listing_id,
                    "listing already retired by a concurrent purchase"
                );
                Err(MarketError::AlreadySettled)
            }
            Ok(_) => Ok(()),
            Err(e) => Err(self.reconciliation(tx, &format!("listing retire failed: {e}"))),
        }
    }

    fn reconciliation(&self, tx: &TxReference, detail: &str) -> MarketError {
        tracing::error!(
            tx_reference = %tx,
            detail = %detail,
            "on-chain settled but off-chain update failed; operator reconciliation required"
        );
        crate::metrics::record_reconciliation_required();
        MarketError::ReconciliationRequired {
            tx_reference: tx.to_string(),
            detail: detail.to_string(),
        }
    }
}
