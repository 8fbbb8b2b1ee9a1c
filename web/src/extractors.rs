//! Custom Axum extractors.
//!
//! - [`CallerWallet`]: the authenticated caller's wallet address
//! - [`CorrelationId`]: extract or generate a request correlation ID

use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::StatusCode, http::request::Parts};
use seatswap_core::types::WalletAddress;
use uuid::Uuid;

/// Header carrying the upstream-verified caller wallet address.
pub const WALLET_HEADER: &str = "x-wallet-address";

/// The authenticated caller's wallet address.
///
/// Session management and signature verification happen upstream; by the
/// time a request reaches this service the gateway has verified wallet
/// ownership and forwarded the address in `x-wallet-address`. This extractor
/// only checks that the header is present and syntactically an address.
#[derive(Debug, Clone)]
pub struct CallerWallet(pub WalletAddress);

#[async_trait]
impl<S> FromRequestParts<S> for CallerWallet
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(WALLET_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ApiError::new(
                    StatusCode::UNAUTHORIZED,
                    "caller wallet address missing".to_string(),
                    "UNAUTHENTICATED".to_string(),
                )
            })?;
        let address = raw.parse::<WalletAddress>().map_err(|e| {
            ApiError::new(
                StatusCode::UNAUTHORIZED,
                e.to_string(),
                "UNAUTHENTICATED".to_string(),
            )
        })?;
        Ok(Self(address))
    }
}

/// Correlation ID for request tracing.
///
/// Extracts the `X-Correlation-ID` header, or generates a new UUID v4 if not
/// present.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts
            .headers
            .get("X-Correlation-ID")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}
