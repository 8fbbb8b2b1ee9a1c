//! Domain types for the Seatswap marketplace.
//!
//! Value objects and entities shared across the workspace: chain-assigned
//! token identifiers, wallet addresses, listings, bids, and the bid-update
//! payload pushed to subscribers. All money amounts are
//! [`rust_decimal::Decimal`] off-chain and integer wei ([`Wei`]) on-chain;
//! the conversion between the two is exact or it fails.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Chain-assigned identifier of a ticket token.
///
/// Immutable once minted. Stored as `BIGINT` off-chain; negative values never
/// occur on-chain and are rejected at the operation boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId(i64);

impl TokenId {
    /// Wrap a raw token identifier.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Get the raw identifier value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// The per-token notification channel name, `ticket:<tokenId>`.
    #[must_use]
    pub fn channel(self) -> String {
        format!("ticket:{}", self.0)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TokenId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(Self)
    }
}

/// Store-assigned identifier of a listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(Uuid);

impl ListingId {
    /// Creates a new random `ListingId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ListingId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ListingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ListingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Error returned when a wallet address fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    /// The address is not `0x` followed by 40 hex characters.
    #[error("wallet address must be 0x followed by 40 hex characters")]
    Malformed,
}

/// A checksummed-or-not EVM wallet address, normalized to lowercase.
///
/// Comparisons are case-insensitive by construction: every address is
/// lowercased when parsed, so two spellings of the same address are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// View the normalized address string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("0x").ok_or(AddressParseError::Malformed)?;
        if rest.len() != 40 || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressParseError::Malformed);
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// Amounts
// ============================================================================

/// Off-chain price or bid amount in the marketplace's display currency.
pub type Price = Decimal;

/// Number of decimal places in the chain's native value unit.
pub const WEI_DECIMALS: u32 = 18;

/// Error returned when a price cannot be represented exactly in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WeiConversionError {
    /// The amount is zero or negative.
    #[error("amount must be positive")]
    NotPositive,
    /// More fractional digits than the native unit can carry.
    #[error("amount has {scale} fractional digits; the native unit carries at most {WEI_DECIMALS}")]
    ExcessPrecision {
        /// Fractional digits of the rejected amount.
        scale: u32,
    },
    /// The scaled value exceeds the representable range.
    #[error("amount overflows the native value unit")]
    Overflow,
}

/// An exact on-chain value in wei (10^-18 of the native token).
///
/// Constructed from a [`Price`] by exact integer scaling; any conversion that
/// would lose precision or overflow is an error, never a rounding.
/// Serialized as a decimal string — wei values routinely exceed what JSON
/// numbers carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Wei(u128);

impl Wei {
    /// Wrap a raw wei value.
    #[must_use]
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Get the raw wei value.
    #[must_use]
    pub const fn as_u128(self) -> u128 {
        self.0
    }

    /// Convert a decimal price to wei without precision loss.
    ///
    /// # Errors
    ///
    /// Returns [`WeiConversionError::NotPositive`] for zero or negative
    /// amounts, [`WeiConversionError::ExcessPrecision`] when the price has
    /// more than 18 fractional digits even after normalization, and
    /// [`WeiConversionError::Overflow`] when the scaled value does not fit.
    pub fn from_price(price: Price) -> Result<Self, WeiConversionError> {
        if price <= Decimal::ZERO {
            return Err(WeiConversionError::NotPositive);
        }
        let normalized = price.normalize();
        let scale = normalized.scale();
        if scale > WEI_DECIMALS {
            return Err(WeiConversionError::ExcessPrecision { scale });
        }
        let mantissa =
            u128::try_from(normalized.mantissa()).map_err(|_| WeiConversionError::NotPositive)?;
        let factor = 10u128
            .checked_pow(WEI_DECIMALS - scale)
            .ok_or(WeiConversionError::Overflow)?;
        mantissa
            .checked_mul(factor)
            .map(Self)
            .ok_or(WeiConversionError::Overflow)
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Wei {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Wei {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<u128>()
            .map(Self)
            .map_err(|_| serde::de::Error::custom("expected a decimal wei string"))
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A ticket token mirrored off-chain.
///
/// `owner` is the authoritative off-chain mirror of on-chain ownership and is
/// mutated only by the settlement workflow (or by external provisioning).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Chain-assigned token identifier.
    pub token_id: TokenId,
    /// Current owner address.
    pub owner: WalletAddress,
    /// Name of the originating event.
    pub event_name: String,
    /// Event artwork reference, if any.
    pub image_url: Option<String>,
}

/// An active offer to sell one ticket token at a fixed price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Store-assigned identifier.
    pub id: ListingId,
    /// Token being sold.
    pub token_id: TokenId,
    /// Fixed asking price set by the seller.
    pub price: Price,
    /// Seller wallet address.
    pub seller: WalletAddress,
    /// Moment after which the listing no longer appears in discovery.
    pub expires_at: DateTime<Utc>,
    /// Moment the listing row was created.
    pub created_at: DateTime<Utc>,
}

/// Fields of a listing before the store assigns its identity.
#[derive(Clone, Debug, PartialEq)]
pub struct NewListing {
    /// Token being sold.
    pub token_id: TokenId,
    /// Fixed asking price.
    pub price: Price,
    /// Seller wallet address.
    pub seller: WalletAddress,
    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

/// A non-binding offer amount, tracked per `(token, bidder)` pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    /// Token the bid is on.
    pub token_id: TokenId,
    /// Bidder wallet address.
    pub bidder: WalletAddress,
    /// Offer amount; strictly increases over successive writes.
    pub amount: Price,
    /// Moment of the most recent write.
    pub placed_at: DateTime<Utc>,
}

/// Whether a bid write created a row or raised an existing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BidKind {
    /// First bid from this bidder on this token.
    New,
    /// Raise of the bidder's existing bid.
    Update,
}

/// The payload fanned out to subscribers after every successful bid write.
///
/// Serialized as `{tokenId, bidder, amount, timestamp, type}` on the wire,
/// delivered on channel `ticket:<tokenId>`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidUpdate {
    /// Token the bid is on.
    pub token_id: TokenId,
    /// Bidder wallet address.
    pub bidder: WalletAddress,
    /// New bid amount.
    pub amount: Price,
    /// Moment of the write.
    #[serde(rename = "timestamp")]
    pub placed_at: DateTime<Utc>,
    /// Whether the write created or raised the bid.
    #[serde(rename = "type")]
    pub kind: BidKind,
}

impl BidUpdate {
    /// The notification channel this update belongs on.
    #[must_use]
    pub fn channel(&self) -> String {
        self.token_id.channel()
    }
}

// ============================================================================
// Read-side and workflow results
// ============================================================================

/// Denormalized discovery view of an active listing joined with its ticket's
/// event metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    /// Listing identifier.
    pub id: ListingId,
    /// Token being sold.
    pub token_id: TokenId,
    /// Asking price.
    pub price: Price,
    /// Seller wallet address.
    #[serde(rename = "sellerAddress")]
    pub seller: WalletAddress,
    /// Expiration timestamp.
    #[serde(rename = "expiration")]
    pub expires_at: DateTime<Utc>,
    /// Event artwork reference; empty when the ticket join yields none.
    #[serde(rename = "imageReference")]
    pub image_url: String,
    /// Creation timestamp (sort key, descending).
    pub created_at: DateTime<Utc>,
}

/// The on-chain listing transaction payload handed back to the caller.
///
/// Submitting it on-chain is the caller's responsibility; this core only
/// records off-chain state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingAnnouncement {
    /// Token being listed.
    pub token_id: TokenId,
    /// Asking price in the chain's native value unit.
    pub price_wei: Wei,
    /// Seller wallet address.
    pub seller: WalletAddress,
}
