//! HTTP API handlers.
//!
//! Thin shells over the market coordinators: extract the verified caller,
//! validate request shape, call one operation, map the result to JSON.

pub mod bids;
pub mod feed;
pub mod listings;
pub mod purchases;
