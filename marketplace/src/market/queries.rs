//! Read-side discovery projection.

use seatswap_core::clock::Clock;
use seatswap_core::error::MarketResult;
use seatswap_core::store::RecordStore;
use seatswap_core::types::ListingView;
use std::sync::Arc;

/// Read-only listing discovery. Expiry is filtered at query time against the
/// injected clock; no background reaper exists.
pub struct ListingQueries {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl ListingQueries {
    /// Create a query service over the given store and clock.
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// All listings expiring strictly after now, most recent first, joined
    /// with ticket event metadata.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Storage`](seatswap_core::error::MarketError::Storage)
    /// when the store fails.
    pub async fn list_active(&self) -> MarketResult<Vec<ListingView>> {
        let views = self.store.active_listings(self.clock.now()).await?;
        Ok(views)
    }
}
