//! Listing creation, discovery, and settlement integration tests.
//!
//! Exercises the ownership/duplication rules, the full purchase state
//! machine with its failure exits at every step, and the read-side view.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use chrono::{Duration, Utc};
use marketplace::market::{ListingManager, ListingQueries, SettlementCoordinator};
use seatswap_core::clock::Clock;
use seatswap_core::error::MarketError;
use seatswap_core::types::{Listing, Ticket, TokenId, WalletAddress};
use seatswap_testing::{FixedClock, MemoryRecordStore, MockLedgerGateway};
use std::sync::Arc;

fn address(tail: char) -> WalletAddress {
    format!("0x{}", tail.to_string().repeat(40)).parse().unwrap()
}

fn ticket(token: i64, owner: &WalletAddress, image: Option<&str>) -> Ticket {
    Ticket {
        token_id: TokenId::new(token),
        owner: owner.clone(),
        event_name: "Midnight Gala".into(),
        image_url: image.map(Into::into),
    }
}

struct Harness {
    listings: ListingManager,
    queries: ListingQueries,
    store: MemoryRecordStore,
    clock: FixedClock,
}

fn harness() -> Harness {
    let store = MemoryRecordStore::new();
    let clock = FixedClock::at(Utc::now());
    Harness {
        listings: ListingManager::new(Arc::new(store.clone()), Arc::new(clock.clone())),
        queries: ListingQueries::new(Arc::new(store.clone()), Arc::new(clock.clone())),
        store,
        clock,
    }
}

fn settlement(store: &MemoryRecordStore, gateway: &MockLedgerGateway) -> SettlementCoordinator {
    SettlementCoordinator::new(Arc::new(store.clone()), Arc::new(gateway.clone()))
}

async fn listed(h: &Harness, token: i64, seller: &WalletAddress, price: &str) -> Listing {
    h.store.put_ticket(ticket(token, seller, None));
    h.listings
        .create(
            TokenId::new(token),
            price.parse().unwrap(),
            h.clock.now() + Duration::hours(2),
            seller.clone(),
        )
        .await
        .unwrap()
        .listing
}

// ============================================================================
// Listing creation
// ============================================================================

#[tokio::test]
async fn created_listing_matches_request_and_carries_announcement() {
    let h = harness();
    let seller = address('a');
    h.store.put_ticket(ticket(42, &seller, None));

    let created = h
        .listings
        .create(
            TokenId::new(42),
            "0.5".parse().unwrap(),
            h.clock.now() + Duration::hours(1),
            seller.clone(),
        )
        .await
        .unwrap();

    assert_eq!(created.listing.token_id, TokenId::new(42));
    assert_eq!(created.listing.seller, seller);
    // The on-chain payload converts the price exactly to native units
    assert_eq!(
        created.announcement.price_wei.as_u128(),
        500_000_000_000_000_000
    );
}

#[tokio::test]
async fn listing_requires_ownership_without_leaking_which_check_failed() {
    let h = harness();
    let expires = h.clock.now() + Duration::hours(1);

    // No such ticket
    let missing = h
        .listings
        .create(TokenId::new(1), "1".parse().unwrap(), expires, address('a'))
        .await
        .unwrap_err();
    assert!(matches!(missing, MarketError::NotOwnerOrNotFound));

    // Ticket owned by someone else: indistinguishable outcome
    h.store.put_ticket(ticket(2, &address('b'), None));
    let not_owner = h
        .listings
        .create(TokenId::new(2), "1".parse().unwrap(), expires, address('a'))
        .await
        .unwrap_err();
    assert!(matches!(not_owner, MarketError::NotOwnerOrNotFound));
}

#[tokio::test]
async fn second_listing_for_a_token_is_rejected_even_after_expiry() {
    let h = harness();
    let seller = address('a');
    listed(&h, 7, &seller, "1").await;

    // Let the first listing expire; the duplication rule still covers it
    h.clock.advance(Duration::hours(3));

    let err = h
        .listings
        .create(
            TokenId::new(7),
            "2".parse().unwrap(),
            h.clock.now() + Duration::hours(1),
            seller,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::AlreadyListed));
    assert_eq!(h.store.listing_count(), 1);
}

#[tokio::test]
async fn malformed_listing_requests_fail_validation() {
    let h = harness();
    let seller = address('a');
    h.store.put_ticket(ticket(1, &seller, None));
    let future = h.clock.now() + Duration::hours(1);

    let negative_token = h
        .listings
        .create(TokenId::new(-1), "1".parse().unwrap(), future, seller.clone())
        .await
        .unwrap_err();
    assert!(matches!(negative_token, MarketError::Validation(_)));

    let zero_price = h
        .listings
        .create(TokenId::new(1), "0".parse().unwrap(), future, seller.clone())
        .await
        .unwrap_err();
    assert!(matches!(zero_price, MarketError::Validation(_)));

    let past_expiry = h
        .listings
        .create(
            TokenId::new(1),
            "1".parse().unwrap(),
            h.clock.now() - Duration::minutes(1),
            seller,
        )
        .await
        .unwrap_err();
    assert!(matches!(past_expiry, MarketError::Validation(_)));

    assert_eq!(h.store.listing_count(), 0);
}

// ============================================================================
// Settlement
// ============================================================================

#[tokio::test]
async fn purchasing_a_missing_listing_touches_nothing() {
    let h = harness();
    let gateway = MockLedgerGateway::confirming();
    let coordinator = settlement(&h.store, &gateway);

    let err = coordinator
        .purchase(seatswap_core::types::ListingId::new(), address('b'))
        .await
        .unwrap_err();

    assert!(matches!(err, MarketError::ListingNotFound));
    assert_eq!(gateway.submissions(), 0, "no gateway call may happen");
}

#[tokio::test]
async fn successful_purchase_transfers_ownership_and_retires_the_listing() {
    let h = harness();
    let seller = address('a');
    let buyer = address('b');
    let listing = listed(&h, 42, &seller, "0.5").await;

    let gateway = MockLedgerGateway::confirming();
    let coordinator = settlement(&h.store, &gateway);

    let receipt = coordinator.purchase(listing.id, buyer.clone()).await.unwrap();

    assert_eq!(receipt.token_id, TokenId::new(42));
    assert!(receipt.tx_reference.as_str().starts_with("0xtx_"));
    assert_eq!(h.store.ticket_owner(TokenId::new(42)), Some(buyer.clone()));
    assert_eq!(h.store.listing_count(), 0);

    // Idempotence: the retired id is simply gone
    let again = coordinator.purchase(listing.id, buyer).await.unwrap_err();
    assert!(matches!(again, MarketError::ListingNotFound));
    assert_eq!(gateway.submissions(), 1, "no re-settlement may happen");
}

#[tokio::test]
async fn gateway_rejection_is_retryable_and_leaves_state_untouched() {
    let h = harness();
    let seller = address('a');
    let listing = listed(&h, 1, &seller, "1").await;

    let gateway = MockLedgerGateway::rejecting("insufficient funds");
    let coordinator = settlement(&h.store, &gateway);

    let err = coordinator
        .purchase(listing.id, address('b'))
        .await
        .unwrap_err();

    match err {
        MarketError::SettlementFailed { reason } => {
            assert!(reason.contains("insufficient funds"));
        }
        other => panic!("expected SettlementFailed, got {other}"),
    }
    assert_eq!(h.store.ticket_owner(TokenId::new(1)), Some(seller));
    assert_eq!(h.store.listing_count(), 1);
}

#[tokio::test]
async fn confirmation_timeout_reports_pending_not_failure() {
    let h = harness();
    let seller = address('a');
    let listing = listed(&h, 1, &seller, "1").await;

    let gateway = MockLedgerGateway::timing_out();
    let coordinator = settlement(&h.store, &gateway);

    let err = coordinator
        .purchase(listing.id, address('b'))
        .await
        .unwrap_err();

    match err {
        MarketError::SettlementPending { submission_id, .. } => {
            assert!(!submission_id.is_empty());
        }
        other => panic!("expected SettlementPending, got {other}"),
    }
    // Outcome unknown: nothing off-chain may be touched
    assert_eq!(h.store.ticket_owner(TokenId::new(1)), Some(seller));
    assert_eq!(h.store.listing_count(), 1);
}

#[tokio::test]
async fn ownership_write_failure_after_confirmation_demands_reconciliation() {
    let h = harness();
    let seller = address('a');
    let listing = listed(&h, 1, &seller, "1").await;

    let gateway = MockLedgerGateway::confirming();
    let coordinator = settlement(&h.store, &gateway);
    h.store.fail_ticket_updates(true);

    let err = coordinator
        .purchase(listing.id, address('b'))
        .await
        .unwrap_err();

    match err {
        MarketError::ReconciliationRequired { tx_reference, .. } => {
            assert!(tx_reference.starts_with("0xtx_"), "must carry the settled tx");
        }
        other => panic!("expected ReconciliationRequired, got {other}"),
    }
    assert_eq!(h.store.listing_count(), 1, "listing must not be retired");
}

#[tokio::test]
async fn retire_failure_after_ownership_update_demands_reconciliation() {
    let h = harness();
    let seller = address('a');
    let buyer = address('b');
    let listing = listed(&h, 1, &seller, "1").await;

    let gateway = MockLedgerGateway::confirming();
    let coordinator = settlement(&h.store, &gateway);
    h.store.fail_listing_deletes(true);

    let err = coordinator
        .purchase(listing.id, buyer.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, MarketError::ReconciliationRequired { .. }));
    // The ownership mirror already moved; only the retire step is stale
    assert_eq!(h.store.ticket_owner(TokenId::new(1)), Some(buyer));
}

#[tokio::test]
async fn losing_the_retire_race_is_already_settled_not_silent_success() {
    let h = harness();
    let seller = address('a');
    let listing = listed(&h, 1, &seller, "1").await;

    let gateway = MockLedgerGateway::confirming();
    let coordinator = settlement(&h.store, &gateway);
    h.store.miss_listing_deletes(true);

    let err = coordinator
        .purchase(listing.id, address('b'))
        .await
        .unwrap_err();

    assert!(matches!(err, MarketError::AlreadySettled));
}

// ============================================================================
// Discovery view
// ============================================================================

#[tokio::test]
async fn active_view_filters_expired_and_sorts_newest_first() {
    let h = harness();
    let seller = address('a');

    // Will be expired by query time
    h.store.put_ticket(ticket(1, &seller, None));
    h.listings
        .create(
            TokenId::new(1),
            "1".parse().unwrap(),
            h.clock.now() + Duration::minutes(30),
            seller.clone(),
        )
        .await
        .unwrap();

    let second = listed(&h, 2, &seller, "2").await;
    let third = listed(&h, 3, &seller, "3").await;

    h.clock.advance(Duration::hours(1));

    let views = h.queries.list_active().await.unwrap();
    assert_eq!(views.len(), 2, "the expired listing is filtered at read time");
    assert_eq!(views[0].id, third.id, "most recent first");
    assert_eq!(views[1].id, second.id);
}

#[tokio::test]
async fn view_joins_event_artwork_and_defaults_to_empty() {
    let h = harness();
    let seller = address('a');

    h.store
        .put_ticket(ticket(1, &seller, Some("ipfs://artwork/1")));
    h.listings
        .create(
            TokenId::new(1),
            "1".parse().unwrap(),
            h.clock.now() + Duration::hours(1),
            seller.clone(),
        )
        .await
        .unwrap();
    listed(&h, 2, &seller, "2").await; // ticket without artwork

    let views = h.queries.list_active().await.unwrap();
    let by_token = |t: i64| {
        views
            .iter()
            .find(|v| v.token_id == TokenId::new(t))
            .unwrap()
    };
    assert_eq!(by_token(1).image_url, "ipfs://artwork/1");
    assert_eq!(by_token(2).image_url, "");
}
