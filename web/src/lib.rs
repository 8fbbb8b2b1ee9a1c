//! Axum integration for the Seatswap marketplace.
//!
//! The HTTP layer is a thin shell over the coordinators in the `marketplace`
//! crate: handlers extract a verified caller identity and request data, call
//! one coordinator operation, and map its result to a JSON response. All
//! domain failures flow through [`ApiError`], which owns the translation
//! from the [`MarketError`](seatswap_core::error::MarketError) taxonomy to
//! status codes and the `{ code, message }` error envelope.
//!
//! Authentication is out of scope: an upstream gateway verifies wallet
//! ownership and forwards the address in the `x-wallet-address` header,
//! which [`CallerWallet`] extracts and validates syntactically.

pub mod error;
pub mod extractors;
pub mod middleware;

pub use error::ApiError;
pub use extractors::{CallerWallet, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, ApiError>;
