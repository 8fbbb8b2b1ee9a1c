//! Router configuration for the marketplace.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{bids, feed, listings, purchases};
use axum::{
    Router,
    routing::{get, post},
};
use seatswap_web::correlation_id_layer;

/// Build the complete Axum router.
///
/// The four market operations live under `/api`; health probes and the
/// WebSocket bid feed sit at the root.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/listings", post(listings::create_listing))
        .route("/listings", get(listings::list_active_listings))
        .route("/listings/:id/purchase", post(purchases::purchase_listing))
        .route("/bids", post(bids::place_bid));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/ws", get(feed::bid_feed_ws))
        .nest("/api", api_routes)
        .layer(correlation_id_layer())
        .with_state(state)
}
