//! Ledger gateway abstraction over the on-chain contract.
//!
//! The contract is an opaque settlement oracle: this interface exposes only
//! purchase submission and confirmation of finality. It is treated as an
//! append-only, at-most-once-per-accepted-submission external authority —
//! once a submission is accepted, funds may leave the buyer's control before
//! any off-chain step runs, which is why the settlement workflow never
//! retries a submission automatically.
//!
//! # Dyn Compatibility
//!
//! Methods return explicit `Pin<Box<dyn Future>>` instead of `async fn` to
//! enable `Arc<dyn LedgerGateway>` injection.

use crate::types::{TokenId, Wei};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by ledger gateway implementations.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// The contract rejected the submission before any funds moved
    /// (insufficient funds, invalid token). Safe to retry.
    #[error("settlement rejected: {reason}")]
    Rejected {
        /// Rejection reason reported by the contract.
        reason: String,
    },

    /// Finality was not observed within the configured wait. The transaction
    /// may still finalize; the caller must not assume failure.
    #[error("confirmation not observed within {waited:?}")]
    ConfirmationTimeout {
        /// How long the caller waited.
        waited: Duration,
    },

    /// The gateway could not be reached or answered unintelligibly.
    #[error("ledger transport error: {0}")]
    Transport(String),
}

/// An accepted-but-unconfirmed settlement submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSettlement {
    /// Token being transferred.
    pub token_id: TokenId,
    /// Submitted value in wei.
    pub value: Wei,
    /// Gateway-assigned submission identifier, used to poll for finality.
    pub submission_id: String,
}

/// Reference to a finalized on-chain transaction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxReference(String);

impl TxReference {
    /// Wrap a transaction reference string.
    #[must_use]
    pub const fn new(reference: String) -> Self {
        Self(reference)
    }

    /// View the reference string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Boxed future returned by gateway methods.
pub type LedgerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LedgerError>> + Send + 'a>>;

/// Narrow interface to the blockchain contract used for settlement.
pub trait LedgerGateway: Send + Sync {
    /// Submit a purchase of `token_id` for `value` wei.
    ///
    /// Suspends until the gateway accepts or rejects the submission.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Rejected`] when the contract refuses the
    /// submission, or [`LedgerError::Transport`] when the gateway cannot be
    /// reached.
    fn submit_purchase(
        &self,
        token_id: TokenId,
        value: Wei,
    ) -> LedgerFuture<'_, PendingSettlement>;

    /// Await finality of an accepted submission.
    ///
    /// This is the funds boundary: after this resolves successfully the
    /// buyer's funds have moved and no off-chain failure can undo that.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ConfirmationTimeout`] when finality is not
    /// observed within the implementation's configured wait — the caller must
    /// treat the outcome as unknown, not failed.
    fn await_confirmation(&self, pending: PendingSettlement) -> LedgerFuture<'_, TxReference>;
}
