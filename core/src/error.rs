//! Error taxonomy for the marketplace core.
//!
//! Every operation failure is one of these variants; the HTTP layer
//! translates them into structured responses and nothing leaves a
//! partially-applied write uncommunicated. Business-rule conflicts carry the
//! conflicting current value so the caller can retry correctly.

use crate::store::StoreError;
use crate::types::Price;
use thiserror::Error;

/// Result alias for marketplace operations.
pub type MarketResult<T> = Result<T, MarketError>;

/// Failures of the listing, bid, and settlement workflows.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Missing or malformed input, recovered locally and reported.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The listing does not exist (or was already retired).
    #[error("listing not found")]
    ListingNotFound,

    /// Ownership check failed. Deliberately one variant: "no such token" and
    /// "token owned by someone else" are indistinguishable to the caller so
    /// ownership information does not leak.
    #[error("token not found or not owned by caller")]
    NotOwnerOrNotFound,

    /// A listing row for the token already exists, expired or not.
    #[error("token already has a listing")]
    AlreadyListed,

    /// The bid does not strictly exceed the bidder's current bid.
    #[error("bid must exceed the current bid of {current}")]
    BidTooLow {
        /// The bidder's stored amount at rejection time.
        current: Price,
    },

    /// A concurrent purchase retired the listing first.
    #[error("listing was settled by a concurrent purchase")]
    AlreadySettled,

    /// The contract rejected the settlement before any funds moved. Safe to
    /// retry.
    #[error("settlement rejected: {reason}")]
    SettlementFailed {
        /// Rejection reason from the gateway.
        reason: String,
    },

    /// The settlement was submitted but its outcome is unknown — finality
    /// was not observed in time, or the gateway went unreachable after
    /// accepting. The transaction may still finalize: never auto-retried,
    /// reported for external reconciliation.
    #[error("settlement {submission_id} outcome unknown ({detail}); it may still finalize")]
    SettlementPending {
        /// Gateway submission identifier to reconcile against.
        submission_id: String,
        /// Why the outcome is unknown.
        detail: String,
    },

    /// The on-chain transfer is final but a subsequent off-chain write
    /// failed. Fatal: requires operator intervention, must not be retried
    /// automatically.
    #[error("on-chain transfer {tx_reference} settled but off-chain update failed: {detail}")]
    ReconciliationRequired {
        /// Reference of the settled on-chain transaction.
        tx_reference: String,
        /// Which off-chain step failed and how.
        detail: String,
    },

    /// The underlying store failed; logged and reported as internal.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bid_too_low_reports_current_amount() {
        let err = MarketError::BidTooLow {
            current: "10.5".parse().unwrap_or_default(),
        };
        assert_eq!(err.to_string(), "bid must exceed the current bid of 10.5");
    }

    #[test]
    fn storage_errors_pass_through() {
        let err = MarketError::from(StoreError::Unavailable("pool closed".into()));
        assert_eq!(err.to_string(), "store unavailable: pool closed");
    }
}
