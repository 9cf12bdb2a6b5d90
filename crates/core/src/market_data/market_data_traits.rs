//! Market history store and service traits.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::market_data_model::{
    HistoricalPricePoint, MarketSide, PriceLevel, PricePointKey, RecordKind, Sale, SaleKey,
    SyncOutcome, SyncRequest,
};
use crate::errors::Result;

/// Append-only persistence for sales and historical price points.
///
/// Implementations must enforce uniqueness of each natural key. Records are
/// never updated or deleted through this trait.
///
/// # Method Naming Convention
///
/// - `latest_*` - Most recent stored timestamp
/// - `*_exists` - Natural key lookups used for deduplication
/// - `insert_*` - Bulk writes that skip rows already present
/// - `*_in_range` - Ascending reads with inclusive date bounds
#[async_trait]
pub trait MarketHistoryStore: Send + Sync {
    /// Most recent timestamp stored for the variant, or `None` if it has no
    /// records of this kind.
    async fn latest_timestamp(
        &self,
        variant_id: &str,
        kind: RecordKind,
    ) -> Result<Option<DateTime<Utc>>>;

    async fn sale_exists(&self, key: &SaleKey) -> Result<bool>;

    async fn price_point_exists(&self, key: &PricePointKey) -> Result<bool>;

    /// Inserts sales, ignoring rows whose natural key is already stored.
    ///
    /// Returns the rows actually written. An empty input is a no-op.
    async fn insert_sales(&self, sales: Vec<Sale>) -> Result<Vec<Sale>>;

    /// Inserts price points, ignoring rows whose natural key is already stored.
    ///
    /// Returns the rows actually written. An empty input is a no-op.
    async fn insert_price_points(
        &self,
        points: Vec<HistoricalPricePoint>,
    ) -> Result<Vec<HistoricalPricePoint>>;

    async fn sales_in_range(
        &self,
        variant_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Sale>>;

    async fn price_points_in_range(
        &self,
        variant_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<HistoricalPricePoint>>;
}

#[async_trait]
pub trait MarketDataServiceTrait: Send + Sync {
    /// Brings the stored history of one variant up to date.
    async fn sync(&self, variant_id: &str, request: SyncRequest) -> Result<SyncOutcome>;

    /// Syncs every registered variant. One variant failing does not stop the others.
    async fn sync_all(&self, request: SyncRequest) -> Result<Vec<(String, Result<SyncOutcome>)>>;

    async fn get_sales(
        &self,
        variant_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Sale>>;

    async fn get_price_points(
        &self,
        variant_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<HistoricalPricePoint>>;

    /// Live bids or asks, fetched from the marketplace on every call.
    async fn get_price_levels(&self, variant_id: &str, side: MarketSide) -> Result<Vec<PriceLevel>>;
}
