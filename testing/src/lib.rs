//! # Seatswap Testing
//!
//! Test doubles for the marketplace's three leaf interfaces, so coordinator
//! behavior — including race-window and partial-failure behavior — is
//! testable at memory speed:
//!
//! - [`MemoryRecordStore`]: in-memory store enforcing the same uniqueness
//!   conflicts as the Postgres implementation, with failure injection for
//!   the reconciliation paths
//! - [`MockLedgerGateway`]: scripted settlement outcomes with call counters
//! - [`CapturingBidBus`]: records published updates, optionally failing
//! - [`FixedClock`]: deterministic, manually advanced time

mod bus;
mod clock;
mod ledger;
mod store;

pub use bus::CapturingBidBus;
pub use clock::FixedClock;
pub use ledger::MockLedgerGateway;
pub use store::MemoryRecordStore;
