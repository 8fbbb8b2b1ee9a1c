//! # Seatswap Core
//!
//! Domain types and leaf-interface traits for the Seatswap secondary ticket
//! marketplace.
//!
//! This crate defines the vocabulary shared by every other crate in the
//! workspace: token and wallet identifiers, listings, bids, the bid-update
//! payload fanned out to subscribers, and the error taxonomy. It also defines
//! the three narrow interfaces behind which all external systems live:
//!
//! - [`store::RecordStore`] — the transactional off-chain store owning
//!   tickets, listings, and bids (single source of off-chain truth)
//! - [`ledger::LedgerGateway`] — the opaque boundary to the on-chain contract,
//!   used only for value transfer and ownership-transfer confirmation
//! - [`bus::BidBus`] — the durable fan-out channel for bid updates, paired
//!   with the in-process [`bus::BidFeed`] for co-located live subscribers
//!
//! ## Architecture Principles
//!
//! - Dependency injection: coordinators receive handles at construction time,
//!   never through process-wide globals, so tests can substitute fakes
//! - The store exclusively owns all three entities; every other component
//!   holds identifiers only
//! - Absent rows are `Option::None`, distinguishable from [`store::StoreError`]
//! - Store uniqueness constraints are the backstop for check-then-write races;
//!   conflict losers are translated into business errors with retry context

pub mod bus;
pub mod clock;
pub mod error;
pub mod ledger;
pub mod store;
pub mod types;

pub use bus::{BidBus, BidFeed, BusError};
pub use clock::{Clock, SystemClock};
pub use error::{MarketError, MarketResult};
pub use ledger::{LedgerError, LedgerGateway, PendingSettlement, TxReference};
pub use store::{RecordStore, StoreError};
pub use types::{
    Bid, BidKind, BidUpdate, Listing, ListingAnnouncement, ListingId, ListingView, NewListing,
    Price, Ticket, TokenId, WalletAddress, Wei,
};
