//! Bid coordination integration tests.
//!
//! Exercises the per-(token, bidder) invariants — one row per pair,
//! strictly increasing amounts — including the concurrent-insert race, and
//! the dual-sink fan-out behavior.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use chrono::Utc;
use marketplace::market::BidCoordinator;
use seatswap_core::bus::BidFeed;
use seatswap_core::error::MarketError;
use seatswap_core::types::{BidKind, TokenId, WalletAddress};
use seatswap_testing::{CapturingBidBus, FixedClock, MemoryRecordStore};
use std::sync::Arc;

fn address(tail: char) -> WalletAddress {
    format!("0x{}", tail.to_string().repeat(40)).parse().unwrap()
}

struct Harness {
    coordinator: Arc<BidCoordinator>,
    store: MemoryRecordStore,
    bus: CapturingBidBus,
    feed: BidFeed,
}

fn harness() -> Harness {
    let store = MemoryRecordStore::new();
    let bus = CapturingBidBus::new();
    let feed = BidFeed::new();
    let clock = FixedClock::at(Utc::now());
    let coordinator = Arc::new(BidCoordinator::new(
        Arc::new(store.clone()),
        feed.clone(),
        Arc::new(bus.clone()),
        Arc::new(clock),
    ));
    Harness {
        coordinator,
        store,
        bus,
        feed,
    }
}

#[tokio::test]
async fn first_bid_creates_one_row_and_emits_new() {
    let h = harness();
    let bidder = address('a');

    let update = h
        .coordinator
        .place_bid(TokenId::new(1), bidder.clone(), "10".parse().unwrap())
        .await
        .unwrap();

    assert_eq!(update.kind, BidKind::New);
    assert_eq!(update.amount, "10".parse().unwrap());
    assert_eq!(
        h.store.bid_amount(TokenId::new(1), &bidder),
        Some("10".parse().unwrap())
    );

    let published = h.bus.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].kind, BidKind::New);
    assert_eq!(published[0].channel(), "ticket:1");
}

#[tokio::test]
async fn equal_or_lower_bid_is_rejected_with_current_amount() {
    let h = harness();
    let bidder = address('a');

    h.coordinator
        .place_bid(TokenId::new(1), bidder.clone(), "10".parse().unwrap())
        .await
        .unwrap();

    for amount in ["10", "9.99"] {
        let err = h
            .coordinator
            .place_bid(TokenId::new(1), bidder.clone(), amount.parse().unwrap())
            .await
            .unwrap_err();
        match err {
            MarketError::BidTooLow { current } => {
                assert_eq!(current, "10".parse().unwrap());
            }
            other => panic!("expected BidTooLow, got {other}"),
        }
    }

    // Stored amount untouched, and only the first write was fanned out
    assert_eq!(
        h.store.bid_amount(TokenId::new(1), &bidder),
        Some("10".parse().unwrap())
    );
    assert_eq!(h.bus.published().len(), 1);
}

#[tokio::test]
async fn higher_bid_updates_in_place_and_emits_update() {
    let h = harness();
    let bidder = address('a');

    h.coordinator
        .place_bid(TokenId::new(1), bidder.clone(), "10".parse().unwrap())
        .await
        .unwrap();
    let update = h
        .coordinator
        .place_bid(TokenId::new(1), bidder.clone(), "12.5".parse().unwrap())
        .await
        .unwrap();

    assert_eq!(update.kind, BidKind::Update);
    assert_eq!(
        h.store.bid_amount(TokenId::new(1), &bidder),
        Some("12.5".parse().unwrap())
    );

    let published = h.bus.published();
    assert_eq!(published.len(), 2);
    assert_eq!(published[1].kind, BidKind::Update);
    assert_eq!(published[1].amount, "12.5".parse().unwrap());
}

#[tokio::test]
async fn bidders_compete_without_displacing_each_other() {
    let h = harness();

    h.coordinator
        .place_bid(TokenId::new(1), address('a'), "10".parse().unwrap())
        .await
        .unwrap();
    // A lower bid from a different bidder is a separate pair, not a raise
    let update = h
        .coordinator
        .place_bid(TokenId::new(1), address('b'), "5".parse().unwrap())
        .await
        .unwrap();

    assert_eq!(update.kind, BidKind::New);
    assert_eq!(
        h.store.bid_amount(TokenId::new(1), &address('a')),
        Some("10".parse().unwrap())
    );
    assert_eq!(
        h.store.bid_amount(TokenId::new(1), &address('b')),
        Some("5".parse().unwrap())
    );
}

#[tokio::test]
async fn concurrent_equal_first_bids_settle_to_one_row() {
    let h = harness();
    let bidder = address('c');

    let first = {
        let coordinator = h.coordinator.clone();
        let bidder = bidder.clone();
        tokio::spawn(async move {
            coordinator
                .place_bid(TokenId::new(7), bidder, "10".parse().unwrap())
                .await
        })
    };
    let second = {
        let coordinator = h.coordinator.clone();
        let bidder = bidder.clone();
        tokio::spawn(async move {
            coordinator
                .place_bid(TokenId::new(7), bidder, "10".parse().unwrap())
                .await
        })
    };

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one concurrent bid may win");

    for outcome in outcomes {
        match outcome {
            Ok(update) => assert_eq!(update.kind, BidKind::New),
            Err(MarketError::BidTooLow { current }) => {
                assert_eq!(current, "10".parse().unwrap());
            }
            Err(other) => panic!("loser must see BidTooLow, got {other}"),
        }
    }

    assert_eq!(
        h.store.bid_amount(TokenId::new(7), &bidder),
        Some("10".parse().unwrap())
    );
    assert_eq!(h.bus.published().len(), 1);
}

#[tokio::test]
async fn live_subscribers_receive_pushed_updates() {
    let h = harness();
    let mut feed_rx = h.feed.subscribe("ticket:3").await;

    h.coordinator
        .place_bid(TokenId::new(3), address('a'), "2".parse().unwrap())
        .await
        .unwrap();

    let live = feed_rx.recv().await.unwrap();
    assert_eq!(live.token_id, TokenId::new(3));
    assert_eq!(live.kind, BidKind::New);
}

#[tokio::test]
async fn durable_publish_failure_degrades_but_does_not_fail_the_bid() {
    let h = harness();
    h.bus.set_failing(true);
    let mut feed_rx = h.feed.subscribe("ticket:9").await;

    let update = h
        .coordinator
        .place_bid(TokenId::new(9), address('a'), "4".parse().unwrap())
        .await
        .expect("bid must succeed despite a failing durable publish");

    assert_eq!(update.kind, BidKind::New);
    assert_eq!(
        h.store.bid_amount(TokenId::new(9), &address('a')),
        Some("4".parse().unwrap())
    );
    // Live subscribers were still served
    assert_eq!(feed_rx.recv().await.unwrap().amount, "4".parse().unwrap());
    assert!(h.bus.published().is_empty());
}

#[tokio::test]
async fn malformed_bids_are_rejected_before_any_write() {
    let h = harness();

    let negative_token = h
        .coordinator
        .place_bid(TokenId::new(-1), address('a'), "1".parse().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(negative_token, MarketError::Validation(_)));

    let zero_amount = h
        .coordinator
        .place_bid(TokenId::new(1), address('a'), "0".parse().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(zero_amount, MarketError::Validation(_)));

    assert!(h.bus.published().is_empty());
}
