//! Purchase endpoint.
//!
//! `POST /api/listings/{id}/purchase` — settle a purchase of the listing at
//! its fixed price, as the calling wallet.

use crate::market::SettlementReceipt;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use seatswap_core::types::ListingId;
use seatswap_web::{CallerWallet, WebResult};
use uuid::Uuid;

/// Purchase a listing by id.
pub async fn purchase_listing(
    State(state): State<AppState>,
    CallerWallet(buyer): CallerWallet,
    Path(id): Path<Uuid>,
) -> WebResult<Json<SettlementReceipt>> {
    let receipt = state
        .settlement
        .purchase(ListingId::from_uuid(id), buyer)
        .await?;
    Ok(Json(receipt))
}
