//! Table definitions for the record store.
//!
//! Idempotent DDL applied at startup. Schema migration tooling is out of
//! scope; these statements only create what is missing.

/// Statements applied by `ensure_schema`, in order.
pub(crate) const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS tickets (
        token_id BIGINT PRIMARY KEY,
        owner_address TEXT NOT NULL,
        event_name TEXT NOT NULL,
        image_url TEXT
    )",
    // One listing row per token regardless of expiry; the constraint is the
    // backstop for the duplicate-check-then-insert race.
    "CREATE TABLE IF NOT EXISTS listings (
        id UUID PRIMARY KEY,
        token_id BIGINT NOT NULL CONSTRAINT listings_token_id_key UNIQUE,
        price NUMERIC(38, 18) NOT NULL CHECK (price > 0),
        seller_address TEXT NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS listings_active_idx
        ON listings (expires_at, created_at DESC)",
    // One bid row per (token, bidder); the primary key is the backstop for
    // the first-bid insert race.
    "CREATE TABLE IF NOT EXISTS bids (
        token_id BIGINT NOT NULL,
        bidder_address TEXT NOT NULL,
        amount NUMERIC(38, 18) NOT NULL CHECK (amount > 0),
        placed_at TIMESTAMPTZ NOT NULL,
        CONSTRAINT bids_pkey PRIMARY KEY (token_id, bidder_address)
    )",
];
