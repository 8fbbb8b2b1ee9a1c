//! WebSocket bid feed for live subscribers.
//!
//! Clients subscribe to per-token channels and receive every accepted bid
//! write on those tokens, best-effort.
//!
//! # Message Protocol
//!
//! **Client → Server (subscribe):**
//! ```json
//! { "type": "subscribe", "tokens": [42, 7] }
//! ```
//!
//! **Server → Client (confirmation):**
//! ```json
//! { "type": "subscribed", "channels": ["ticket:42", "ticket:7"] }
//! ```
//!
//! **Server → Client (bid update):**
//! ```json
//! { "type": "bid", "channel": "ticket:42", "update": { ... } }
//! ```

use crate::server::state::AppState;
use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{Sink, SinkExt, StreamExt};
use seatswap_core::bus::BidFeed;
use seatswap_core::types::{BidUpdate, TokenId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ClientMessage {
    Subscribe { tokens: Vec<i64> },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ServerMessage {
    Subscribed { channels: Vec<String> },
    Bid { channel: String, update: BidUpdate },
    Error { message: String },
}

/// Upgrade to a WebSocket carrying the live bid feed.
pub async fn bid_feed_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let feed = state.feed.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, feed))
}

/// Funnel depth from per-channel forwarders into the socket writer.
const OUTBOUND_BUFFER: usize = 64;

async fn handle_socket(socket: WebSocket, feed: BidFeed) {
    let (mut sink, mut stream) = socket.split();
    let (outbound, mut inbox) = mpsc::channel::<BidUpdate>(OUTBOUND_BUFFER);
    let mut forwarders: Vec<JoinHandle<()>> = Vec::new();
    let mut subscribed: HashSet<String> = HashSet::new();

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let reply = match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(ClientMessage::Subscribe { tokens }) => {
                            let channels = subscribe_tokens(
                                &feed,
                                &tokens,
                                &mut subscribed,
                                &mut forwarders,
                                &outbound,
                            )
                            .await;
                            ServerMessage::Subscribed { channels }
                        }
                        Err(e) => ServerMessage::Error {
                            message: format!("unrecognized message: {e}"),
                        },
                    };
                    if send_json(&mut sink, &reply).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // ping/pong handled by axum
                Some(Err(e)) => {
                    debug!(error = %e, "bid feed socket error");
                    break;
                }
            },
            received = inbox.recv() => match received {
                Some(update) => {
                    let message = ServerMessage::Bid {
                        channel: update.channel(),
                        update,
                    };
                    if send_json(&mut sink, &message).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    for forwarder in forwarders {
        forwarder.abort();
    }
}

/// Subscribe to each token's channel once, spawning a forwarder that funnels
/// feed broadcasts into this socket's outbound queue.
async fn subscribe_tokens(
    feed: &BidFeed,
    tokens: &[i64],
    subscribed: &mut HashSet<String>,
    forwarders: &mut Vec<JoinHandle<()>>,
    outbound: &mpsc::Sender<BidUpdate>,
) -> Vec<String> {
    let mut channels = Vec::with_capacity(tokens.len());
    for &raw in tokens {
        let channel = TokenId::new(raw).channel();
        if subscribed.insert(channel.clone()) {
            let mut source = feed.subscribe(channel.clone()).await;
            let outbound = outbound.clone();
            forwarders.push(tokio::spawn(async move {
                loop {
                    match source.recv().await {
                        Ok(update) => {
                            if outbound.send(update).await.is_err() {
                                break;
                            }
                        }
                        // Slow consumers skip missed updates rather than die.
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }));
        }
        channels.push(channel);
    }
    channels
}

async fn send_json(
    sink: &mut (impl Sink<Message, Error = axum::Error> + Unpin),
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(message)
        .map_err(|e| axum::Error::new(std::io::Error::other(e)))?;
    sink.send(Message::Text(payload)).await
}
