//! Scripted ledger gateway double.

use seatswap_core::ledger::{
    LedgerError, LedgerFuture, LedgerGateway, PendingSettlement, TxReference,
};
use seatswap_core::types::{TokenId, Wei};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[derive(Clone, Debug)]
enum Behavior {
    Confirm,
    RejectOnSubmit(String),
    TimeoutOnConfirm(Duration),
}

/// Ledger gateway double with a scripted outcome and call counters.
///
/// The counters let tests assert the workflow's key negative property: a
/// purchase of a missing listing performs no gateway call at all.
#[derive(Clone)]
pub struct MockLedgerGateway {
    behavior: Arc<Mutex<Behavior>>,
    submissions: Arc<AtomicUsize>,
    confirmations: Arc<AtomicUsize>,
}

impl MockLedgerGateway {
    /// Gateway that accepts and confirms every settlement.
    #[must_use]
    pub fn confirming() -> Self {
        Self::with_behavior(Behavior::Confirm)
    }

    /// Gateway that rejects every submission before funds move.
    #[must_use]
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::RejectOnSubmit(reason.into()))
    }

    /// Gateway that accepts submissions but never reaches finality in time.
    #[must_use]
    pub fn timing_out() -> Self {
        Self::with_behavior(Behavior::TimeoutOnConfirm(Duration::from_secs(30)))
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            submissions: Arc::new(AtomicUsize::new(0)),
            confirmations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of submissions accepted or attempted.
    #[must_use]
    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Number of confirmations reached.
    #[must_use]
    pub fn confirmations(&self) -> usize {
        self.confirmations.load(Ordering::SeqCst)
    }

    fn behavior(&self) -> Behavior {
        self.behavior
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LedgerGateway for MockLedgerGateway {
    fn submit_purchase(&self, token_id: TokenId, value: Wei) -> LedgerFuture<'_, PendingSettlement> {
        let gateway = self.clone();
        Box::pin(async move {
            let n = gateway.submissions.fetch_add(1, Ordering::SeqCst) + 1;
            match gateway.behavior() {
                Behavior::RejectOnSubmit(reason) => Err(LedgerError::Rejected { reason }),
                Behavior::Confirm | Behavior::TimeoutOnConfirm(_) => Ok(PendingSettlement {
                    token_id,
                    value,
                    submission_id: format!("mock_sub_{n}"),
                }),
            }
        })
    }

    fn await_confirmation(&self, pending: PendingSettlement) -> LedgerFuture<'_, TxReference> {
        let gateway = self.clone();
        Box::pin(async move {
            match gateway.behavior() {
                Behavior::TimeoutOnConfirm(waited) => {
                    Err(LedgerError::ConfirmationTimeout { waited })
                }
                _ => {
                    gateway.confirmations.fetch_add(1, Ordering::SeqCst);
                    Ok(TxReference::new(format!(
                        "0xtx_{}",
                        pending.submission_id
                    )))
                }
            }
        })
    }
}
