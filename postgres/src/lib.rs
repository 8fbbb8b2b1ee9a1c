//! `PostgreSQL` record store for the Seatswap marketplace.
//!
//! Implements the [`RecordStore`](seatswap_core::store::RecordStore) trait
//! over a sqlx connection pool. Queries are runtime-bound (`sqlx::query_as`
//! with explicit binds) so the crate builds without a live database.
//!
//! The two uniqueness constraints required by the concurrency model live
//! here as real database constraints:
//!
//! - `listings_token_id_key UNIQUE (token_id)` — one listing row per token,
//!   expired or not
//! - `bids_pkey PRIMARY KEY (token_id, bidder_address)` — one bid row per
//!   `(token, bidder)` pair
//!
//! Unique-violation errors (SQLSTATE 23505) are mapped to
//! [`StoreError::Conflict`](seatswap_core::store::StoreError::Conflict) so
//! coordinators can translate race losses into business errors.

mod schema;
mod store;

pub use store::PostgresRecordStore;
