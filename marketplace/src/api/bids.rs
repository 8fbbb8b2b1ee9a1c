//! Bid endpoint.
//!
//! `POST /api/bids` — place or raise a bid as the calling wallet. The
//! response body is the same `BidUpdate` payload that subscribers receive.

use crate::server::state::AppState;
use axum::{Json, extract::State};
use rust_decimal::Decimal;
use seatswap_core::types::{BidUpdate, TokenId};
use seatswap_web::{ApiError, CallerWallet, WebResult};
use serde::Deserialize;

/// Request to place or raise a bid.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidRequest {
    /// Token to bid on.
    pub token_id: Option<i64>,
    /// Offer amount; must strictly exceed the caller's current bid.
    pub amount: Option<Decimal>,
}

/// Place or raise a bid.
pub async fn place_bid(
    State(state): State<AppState>,
    CallerWallet(bidder): CallerWallet,
    Json(body): Json<PlaceBidRequest>,
) -> WebResult<Json<BidUpdate>> {
    let token_id = body
        .token_id
        .ok_or_else(|| ApiError::bad_request("tokenId is required"))?;
    let amount = body
        .amount
        .ok_or_else(|| ApiError::bad_request("amount is required"))?;

    let update = state
        .bids
        .place_bid(TokenId::new(token_id), bidder, amount)
        .await?;
    Ok(Json(update))
}
