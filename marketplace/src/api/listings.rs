//! Listing endpoints.
//!
//! - `POST /api/listings` — create a listing (caller must own the token)
//! - `GET /api/listings` — active-listing discovery view

use crate::market::CreatedListing;
use crate::server::state::AppState;
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use seatswap_core::types::{ListingView, TokenId};
use seatswap_web::{ApiError, CallerWallet, WebResult};
use serde::Deserialize;

/// Request to create a listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    /// Token to list.
    pub token_id: Option<i64>,
    /// Fixed asking price.
    pub price: Option<Decimal>,
    /// Expiration timestamp.
    pub expiration: Option<DateTime<Utc>>,
}

/// Create a listing owned by the calling wallet.
pub async fn create_listing(
    State(state): State<AppState>,
    CallerWallet(seller): CallerWallet,
    Json(body): Json<CreateListingRequest>,
) -> WebResult<Json<CreatedListing>> {
    let token_id = body
        .token_id
        .ok_or_else(|| ApiError::bad_request("tokenId is required"))?;
    let price = body
        .price
        .ok_or_else(|| ApiError::bad_request("price is required"))?;
    let expiration = body
        .expiration
        .ok_or_else(|| ApiError::bad_request("expiration is required"))?;

    let created = state
        .listings
        .create(TokenId::new(token_id), price, expiration, seller)
        .await?;
    Ok(Json(created))
}

/// List all active listings, most recent first.
pub async fn list_active_listings(
    State(state): State<AppState>,
) -> WebResult<Json<Vec<ListingView>>> {
    let views = state.queries.list_active().await?;
    Ok(Json(views))
}
