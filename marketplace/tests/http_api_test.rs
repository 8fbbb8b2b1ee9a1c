//! HTTP API integration tests.
//!
//! Drives the full router over in-memory fakes: routing, caller extraction,
//! request validation, and the error envelope contract.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, Utc};
use marketplace::server::{AppState, build_router};
use seatswap_core::types::{Ticket, TokenId, WalletAddress};
use seatswap_testing::{CapturingBidBus, FixedClock, MemoryRecordStore, MockLedgerGateway};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const SELLER: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const BUYER: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

fn wallet(s: &str) -> WalletAddress {
    s.parse().unwrap()
}

fn app_with_store(store: &MemoryRecordStore) -> Router {
    let state = AppState::new(
        Arc::new(store.clone()),
        Arc::new(MockLedgerGateway::confirming()),
        Arc::new(CapturingBidBus::new()),
        Arc::new(FixedClock::at(Utc::now())),
    );
    build_router(state)
}

fn seeded_store() -> MemoryRecordStore {
    let store = MemoryRecordStore::new();
    store.put_ticket(Ticket {
        token_id: TokenId::new(42),
        owner: wallet(SELLER),
        event_name: "Midnight Gala".into(),
        image_url: Some("ipfs://artwork/42".into()),
    });
    store
}

fn post_json(uri: &str, caller: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-wallet-address", caller)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_listing_returns_row_and_announcement() {
    let store = seeded_store();
    let app = app_with_store(&store);

    let expiration = (Utc::now() + Duration::hours(2)).to_rfc3339();
    let response = app
        .oneshot(post_json(
            "/api/listings",
            SELLER,
            json!({ "tokenId": 42, "price": "0.5", "expiration": expiration }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["listing"]["tokenId"], 42);
    assert_eq!(body["announcement"]["priceWei"], "500000000000000000");
}

#[tokio::test]
async fn missing_fields_are_a_400_validation_error() {
    let store = seeded_store();
    let app = app_with_store(&store);

    let response = app
        .oneshot(post_json("/api/listings", SELLER, json!({ "tokenId": 42 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("price"));
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected() {
    let store = seeded_store();
    let app = app_with_store(&store);

    let request = Request::builder()
        .method("POST")
        .uri("/api/bids")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "tokenId": 42, "amount": "1" }).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn low_bid_conflict_carries_the_current_amount() {
    let store = seeded_store();
    let app = app_with_store(&store);

    let first = app
        .clone()
        .oneshot(post_json(
            "/api/bids",
            BUYER,
            json!({ "tokenId": 42, "amount": "10" }),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let body = body_json(first).await;
    assert_eq!(body["type"], "new");
    assert_eq!(body["tokenId"], 42);

    let second = app
        .oneshot(post_json(
            "/api/bids",
            BUYER,
            json!({ "tokenId": 42, "amount": "10" }),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = body_json(second).await;
    assert_eq!(body["code"], "BID_TOO_LOW");
    assert!(body["message"].as_str().unwrap().contains("10"));
}

#[tokio::test]
async fn purchase_of_unknown_listing_is_404() {
    let store = seeded_store();
    let app = app_with_store(&store);

    let response = app
        .oneshot(post_json(
            &format!("/api/listings/{}/purchase", uuid::Uuid::new_v4()),
            BUYER,
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn listing_then_purchase_round_trip() {
    let store = seeded_store();
    let app = app_with_store(&store);

    let expiration = (Utc::now() + Duration::hours(2)).to_rfc3339();
    let created = app
        .clone()
        .oneshot(post_json(
            "/api/listings",
            SELLER,
            json!({ "tokenId": 42, "price": "0.5", "expiration": expiration }),
        ))
        .await
        .unwrap();
    let listing_id = body_json(created).await["listing"]["id"]
        .as_str()
        .unwrap()
        .to_owned();

    let discovery = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/listings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(discovery.status(), StatusCode::OK);
    let views = body_json(discovery).await;
    assert_eq!(views.as_array().unwrap().len(), 1);
    assert_eq!(views[0]["imageReference"], "ipfs://artwork/42");

    let purchase = app
        .clone()
        .oneshot(post_json(
            &format!("/api/listings/{listing_id}/purchase"),
            BUYER,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(purchase.status(), StatusCode::OK);
    let receipt = body_json(purchase).await;
    assert_eq!(receipt["buyer"], BUYER);
    assert!(receipt["txReference"].as_str().unwrap().starts_with("0xtx_"));

    // The ticket changed hands and the listing is gone from discovery
    assert_eq!(store.ticket_owner(TokenId::new(42)), Some(wallet(BUYER)));
    let after = app
        .oneshot(
            Request::builder()
                .uri("/api/listings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(after).await.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn health_probes_answer() {
    let store = seeded_store();
    let app = app_with_store(&store);

    let health = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let ready = app
        .oneshot(
            Request::builder()
                .uri("/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
}
