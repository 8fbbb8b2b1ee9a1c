//! sqlx-backed implementation of the record store.

use crate::schema::SCHEMA;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use seatswap_core::store::{RecordStore, StoreError, StoreFuture};
use seatswap_core::types::{
    Bid, Listing, ListingId, ListingView, NewListing, Price, Ticket, TokenId, WalletAddress,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

/// Record store over a `PostgreSQL` connection pool.
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the database cannot be
    /// reached.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the idempotent table definitions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] when a DDL statement fails.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        }
        tracing::info!("record store schema ensured");
        Ok(())
    }
}

/// Translate sqlx failures into the store error taxonomy. Unique violations
/// (SQLSTATE 23505) become [`StoreError::Conflict`] carrying the constraint
/// name.
fn map_sqlx_error(error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::Database(db) => {
            if db.code().as_deref() == Some("23505") {
                StoreError::Conflict {
                    constraint: db.constraint().unwrap_or("unknown").to_string(),
                }
            } else {
                StoreError::Query(db.to_string())
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(error.to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    token_id: i64,
    owner_address: String,
    event_name: String,
    image_url: Option<String>,
}

impl TicketRow {
    fn into_ticket(self) -> Result<Ticket, StoreError> {
        let owner = self
            .owner_address
            .parse::<WalletAddress>()
            .map_err(|e| StoreError::Corrupt(format!("ticket owner: {e}")))?;
        Ok(Ticket {
            token_id: TokenId::new(self.token_id),
            owner,
            event_name: self.event_name,
            image_url: self.image_url,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ListingRow {
    id: Uuid,
    token_id: i64,
    price: Decimal,
    seller_address: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl ListingRow {
    fn into_listing(self) -> Result<Listing, StoreError> {
        let seller = self
            .seller_address
            .parse::<WalletAddress>()
            .map_err(|e| StoreError::Corrupt(format!("listing seller: {e}")))?;
        Ok(Listing {
            id: ListingId::from_uuid(self.id),
            token_id: TokenId::new(self.token_id),
            price: self.price,
            seller,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ListingViewRow {
    id: Uuid,
    token_id: i64,
    price: Decimal,
    seller_address: String,
    expires_at: DateTime<Utc>,
    image_url: String,
    created_at: DateTime<Utc>,
}

impl ListingViewRow {
    fn into_view(self) -> Result<ListingView, StoreError> {
        let seller = self
            .seller_address
            .parse::<WalletAddress>()
            .map_err(|e| StoreError::Corrupt(format!("listing seller: {e}")))?;
        Ok(ListingView {
            id: ListingId::from_uuid(self.id),
            token_id: TokenId::new(self.token_id),
            price: self.price,
            seller,
            expires_at: self.expires_at,
            image_url: self.image_url,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BidRow {
    token_id: i64,
    bidder_address: String,
    amount: Decimal,
    placed_at: DateTime<Utc>,
}

impl BidRow {
    fn into_bid(self) -> Result<Bid, StoreError> {
        let bidder = self
            .bidder_address
            .parse::<WalletAddress>()
            .map_err(|e| StoreError::Corrupt(format!("bidder: {e}")))?;
        Ok(Bid {
            token_id: TokenId::new(self.token_id),
            bidder,
            amount: self.amount,
            placed_at: self.placed_at,
        })
    }
}

impl RecordStore for PostgresRecordStore {
    fn ticket(&self, token_id: TokenId) -> StoreFuture<'_, Option<Ticket>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let row: Option<TicketRow> = sqlx::query_as(
                "SELECT token_id, owner_address, event_name, image_url
                 FROM tickets WHERE token_id = $1",
            )
            .bind(token_id.as_i64())
            .fetch_optional(&pool)
            .await
            .map_err(map_sqlx_error)?;
            row.map(TicketRow::into_ticket).transpose()
        })
    }

    fn update_ticket_owner(
        &self,
        token_id: TokenId,
        new_owner: WalletAddress,
    ) -> StoreFuture<'_, Option<Ticket>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let row: Option<TicketRow> = sqlx::query_as(
                "UPDATE tickets SET owner_address = $2
                 WHERE token_id = $1
                 RETURNING token_id, owner_address, event_name, image_url",
            )
            .bind(token_id.as_i64())
            .bind(new_owner.as_str().to_owned())
            .fetch_optional(&pool)
            .await
            .map_err(map_sqlx_error)?;
            row.map(TicketRow::into_ticket).transpose()
        })
    }

    fn insert_listing(&self, listing: NewListing) -> StoreFuture<'_, Listing> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let row: ListingRow = sqlx::query_as(
                "INSERT INTO listings (id, token_id, price, seller_address, expires_at)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id, token_id, price, seller_address, expires_at, created_at",
            )
            .bind(Uuid::new_v4())
            .bind(listing.token_id.as_i64())
            .bind(listing.price)
            .bind(listing.seller.as_str().to_owned())
            .bind(listing.expires_at)
            .fetch_one(&pool)
            .await
            .map_err(map_sqlx_error)?;
            row.into_listing()
        })
    }

    fn listing(&self, id: ListingId) -> StoreFuture<'_, Option<Listing>> {
        let pool = self.pool.clone();
        let id = *id.as_uuid();
        Box::pin(async move {
            let row: Option<ListingRow> = sqlx::query_as(
                "SELECT id, token_id, price, seller_address, expires_at, created_at
                 FROM listings WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&pool)
            .await
            .map_err(map_sqlx_error)?;
            row.map(ListingRow::into_listing).transpose()
        })
    }

    fn listing_for_token(&self, token_id: TokenId) -> StoreFuture<'_, Option<Listing>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let row: Option<ListingRow> = sqlx::query_as(
                "SELECT id, token_id, price, seller_address, expires_at, created_at
                 FROM listings WHERE token_id = $1",
            )
            .bind(token_id.as_i64())
            .fetch_optional(&pool)
            .await
            .map_err(map_sqlx_error)?;
            row.map(ListingRow::into_listing).transpose()
        })
    }

    fn delete_listing(&self, id: ListingId) -> StoreFuture<'_, u64> {
        let pool = self.pool.clone();
        let id = *id.as_uuid();
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM listings WHERE id = $1")
                .bind(id)
                .execute(&pool)
                .await
                .map_err(map_sqlx_error)?;
            Ok(result.rows_affected())
        })
    }

    fn active_listings(&self, now: DateTime<Utc>) -> StoreFuture<'_, Vec<ListingView>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let rows: Vec<ListingViewRow> = sqlx::query_as(
                "SELECT l.id, l.token_id, l.price, l.seller_address, l.expires_at,
                        COALESCE(t.image_url, '') AS image_url, l.created_at
                 FROM listings l
                 LEFT JOIN tickets t ON t.token_id = l.token_id
                 WHERE l.expires_at > $1
                 ORDER BY l.created_at DESC",
            )
            .bind(now)
            .fetch_all(&pool)
            .await
            .map_err(map_sqlx_error)?;
            rows.into_iter().map(ListingViewRow::into_view).collect()
        })
    }

    fn bid(&self, token_id: TokenId, bidder: WalletAddress) -> StoreFuture<'_, Option<Bid>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let row: Option<BidRow> = sqlx::query_as(
                "SELECT token_id, bidder_address, amount, placed_at
                 FROM bids WHERE token_id = $1 AND bidder_address = $2",
            )
            .bind(token_id.as_i64())
            .bind(bidder.as_str().to_owned())
            .fetch_optional(&pool)
            .await
            .map_err(map_sqlx_error)?;
            row.map(BidRow::into_bid).transpose()
        })
    }

    fn insert_bid(&self, bid: Bid) -> StoreFuture<'_, Bid> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let row: BidRow = sqlx::query_as(
                "INSERT INTO bids (token_id, bidder_address, amount, placed_at)
                 VALUES ($1, $2, $3, $4)
                 RETURNING token_id, bidder_address, amount, placed_at",
            )
            .bind(bid.token_id.as_i64())
            .bind(bid.bidder.as_str().to_owned())
            .bind(bid.amount)
            .bind(bid.placed_at)
            .fetch_one(&pool)
            .await
            .map_err(map_sqlx_error)?;
            row.into_bid()
        })
    }

    fn raise_bid(
        &self,
        token_id: TokenId,
        bidder: WalletAddress,
        amount: Price,
        placed_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Bid>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            // Compare-and-set in one statement; the monotonic invariant never
            // depends on a read in this process.
            let row: Option<BidRow> = sqlx::query_as(
                "UPDATE bids SET amount = $3, placed_at = $4
                 WHERE token_id = $1 AND bidder_address = $2 AND amount < $3
                 RETURNING token_id, bidder_address, amount, placed_at",
            )
            .bind(token_id.as_i64())
            .bind(bidder.as_str().to_owned())
            .bind(amount)
            .bind(placed_at)
            .fetch_optional(&pool)
            .await
            .map_err(map_sqlx_error)?;
            row.map(BidRow::into_bid).transpose()
        })
    }
}
