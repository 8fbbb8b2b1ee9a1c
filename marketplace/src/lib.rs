//! Seatswap: a secondary marketplace for on-chain event tickets.
//!
//! Sellers list ticket tokens at a fixed price, buyers place competing
//! non-binding bids, and purchases settle against the on-chain contract
//! while the record store tracks listing/bid state off-chain. Bid changes
//! fan out to live WebSocket subscribers and to the durable bus.
//!
//! The interesting part is [`market`]: how concurrent bids on one token are
//! validated and merged, and how a purchase moves a listing from active to
//! settled across two systems of record that cannot share a transaction.

pub mod api;
pub mod config;
pub mod market;
pub mod metrics;
pub mod server;
