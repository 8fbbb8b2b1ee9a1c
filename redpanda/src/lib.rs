//! Redpanda durable publish sink for bid updates.
//!
//! Implements the [`BidBus`] trait from `seatswap-core` with a
//! Kafka-compatible producer, so out-of-process subscribers (other service
//! instances, analytics, notification workers) receive every bid change that
//! the in-process feed delivers to co-located clients.
//!
//! # Channel mapping
//!
//! The logical channel name is `ticket:<tokenId>`, but Kafka topic names
//! cannot contain `:`. All updates therefore go to one configured topic with
//! the channel string as the record key: per-token ordering is preserved by
//! key partitioning and the channel survives verbatim on the wire for
//! consumers to route on.
//!
//! # Delivery semantics
//!
//! At-most-once from the producing request's point of view: the off-chain
//! bid write has already committed when publish runs, and a publish failure
//! is reported to the caller as degraded delivery, never as a failed bid.
//!
//! # Example
//!
//! ```no_run
//! use seatswap_redpanda::RedpandaBidBus;
//!
//! # fn example() -> Result<(), seatswap_core::bus::BusError> {
//! let bus = RedpandaBidBus::builder()
//!     .brokers("localhost:9092")
//!     .topic("seatswap-bid-updates")
//!     .producer_acks("all")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use seatswap_core::bus::{BidBus, BusError, BusFuture};
use seatswap_core::types::BidUpdate;
use std::time::Duration;

const DEFAULT_TOPIC: &str = "seatswap-bid-updates";

/// Durable bid bus over a Kafka-compatible producer.
pub struct RedpandaBidBus {
    producer: FutureProducer,
    topic: String,
    timeout: Duration,
}

impl RedpandaBidBus {
    /// Create a bus with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ConnectionFailed`] when the producer cannot be
    /// created from the given broker list.
    pub fn new(brokers: &str) -> Result<Self, BusError> {
        Self::builder().brokers(brokers).build()
    }

    /// Create a new builder for configuring the bus.
    #[must_use]
    pub fn builder() -> RedpandaBidBusBuilder {
        RedpandaBidBusBuilder::default()
    }

    /// The topic all bid updates are published to.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Builder for configuring a [`RedpandaBidBus`].
#[derive(Default)]
pub struct RedpandaBidBusBuilder {
    brokers: Option<String>,
    topic: Option<String>,
    producer_acks: Option<String>,
    compression: Option<String>,
    timeout: Option<Duration>,
}

impl RedpandaBidBusBuilder {
    /// Set the broker addresses (comma-separated).
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the topic carrying bid updates. Default: `seatswap-bid-updates`.
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Set the producer acknowledgment mode: "0", "1", or "all". Default: "1".
    #[must_use]
    pub fn producer_acks(mut self, acks: impl Into<String>) -> Self {
        self.producer_acks = Some(acks.into());
        self
    }

    /// Set the compression codec. Default: "none".
    #[must_use]
    pub fn compression(mut self, compression: impl Into<String>) -> Self {
        self.compression = Some(compression.into());
        self
    }

    /// Set the producer send timeout. Default: 5 seconds.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the [`RedpandaBidBus`].
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ConnectionFailed`] when brokers are not configured
    /// or the producer cannot be created.
    pub fn build(self) -> Result<RedpandaBidBus, BusError> {
        let brokers = self
            .brokers
            .ok_or_else(|| BusError::ConnectionFailed("brokers not configured".to_string()))?;
        let topic = self.topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string());

        let mut producer_config = ClientConfig::new();
        producer_config
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", "5000")
            .set("acks", self.producer_acks.as_deref().unwrap_or("1"))
            .set(
                "compression.type",
                self.compression.as_deref().unwrap_or("none"),
            );

        let producer: FutureProducer = producer_config.create().map_err(|e| {
            BusError::ConnectionFailed(format!("failed to create producer: {e}"))
        })?;

        tracing::info!(
            brokers = %brokers,
            topic = %topic,
            acks = self.producer_acks.as_deref().unwrap_or("1"),
            "RedpandaBidBus created"
        );

        Ok(RedpandaBidBus {
            producer,
            topic,
            timeout: self.timeout.unwrap_or(Duration::from_secs(5)),
        })
    }
}

impl BidBus for RedpandaBidBus {
    fn publish(&self, update: &BidUpdate) -> BusFuture<'_, ()> {
        // Clone data before moving into the async block
        let update = update.clone();
        let topic = self.topic.clone();
        let timeout = self.timeout;

        Box::pin(async move {
            let channel = update.channel();
            let payload =
                serde_json::to_vec(&update).map_err(|e| BusError::PublishFailed {
                    channel: channel.clone(),
                    reason: format!("failed to serialize update: {e}"),
                })?;

            // The channel string is the record key: per-token ordering via
            // key partitioning, channel preserved for consumer routing.
            let record = FutureRecord::to(&topic)
                .payload(&payload)
                .key(channel.as_bytes());

            match self.producer.send(record, Timeout::After(timeout)).await {
                Ok((partition, offset)) => {
                    tracing::debug!(
                        channel = %channel,
                        partition = partition,
                        offset = offset,
                        "bid update published"
                    );
                    Ok(())
                }
                Err((kafka_error, _)) => {
                    tracing::error!(
                        channel = %channel,
                        error = %kafka_error,
                        "failed to publish bid update"
                    );
                    Err(BusError::PublishFailed {
                        channel,
                        reason: kafka_error.to_string(),
                    })
                }
            }
        })
    }
}
