//! Market history domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::market_data_constants::DEFAULT_INTERVAL_COUNT;
pub use repricer_market_data::MarketSide;

/// A completed marketplace sale stored for a variant.
///
/// Natural key: (variant_id, sale_timestamp, amount). Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub variant_id: String,
    pub sale_timestamp: DateTime<Utc>,
    pub amount: Decimal,
    pub currency: String,
    pub size: Option<String>,
    pub order_type: Option<String>,
}

impl Sale {
    pub fn key(&self) -> SaleKey {
        SaleKey {
            variant_id: self.variant_id.clone(),
            sale_timestamp: self.sale_timestamp,
            amount: self.amount.normalize(),
        }
    }
}

/// One bucket of the marketplace sales chart stored for a variant.
///
/// Natural key: (variant_id, point_timestamp).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPricePoint {
    pub variant_id: String,
    pub point_timestamp: DateTime<Utc>,
    pub price: Decimal,
}

impl HistoricalPricePoint {
    pub fn key(&self) -> PricePointKey {
        PricePointKey {
            variant_id: self.variant_id.clone(),
            point_timestamp: self.point_timestamp,
        }
    }
}

/// Deduplication key of a [`Sale`]. `amount` is normalized, so 250 and
/// 250.00 are the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SaleKey {
    pub variant_id: String,
    pub sale_timestamp: DateTime<Utc>,
    pub amount: Decimal,
}

/// Deduplication key of a [`HistoricalPricePoint`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PricePointKey {
    pub variant_id: String,
    pub point_timestamp: DateTime<Utc>,
}

/// A live bid or ask level for a variant. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceLevel {
    pub variant_id: String,
    pub side: MarketSide,
    pub amount: Decimal,
    pub currency: String,
    pub count: u32,
    pub own_count: u32,
    pub size: Option<String>,
    pub available_for_flex: bool,
}

/// Stored record families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Sale,
    PricePoint,
}

/// Date range requested from the marketplace for one sync.
///
/// `start_date: None` means no lower bound: the upstream applies its own
/// default lookback for the requested interval count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncWindow {
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
}

/// Caller input for a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncRequest {
    pub interval_count: u32,
    /// Explicit window bounds. Supplying either one disables window inference.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Default for SyncRequest {
    fn default() -> Self {
        Self {
            interval_count: DEFAULT_INTERVAL_COUNT,
            start_date: None,
            end_date: None,
        }
    }
}

impl SyncRequest {
    pub fn is_explicit(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }
}

/// Result of one sync: exactly the records written by this call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub new_sales: Vec<Sale>,
    pub new_price_points: Vec<HistoricalPricePoint>,
    pub sales_count: usize,
    pub price_points_count: usize,
}

impl SyncOutcome {
    pub fn new(new_sales: Vec<Sale>, new_price_points: Vec<HistoricalPricePoint>) -> Self {
        Self {
            sales_count: new_sales.len(),
            price_points_count: new_price_points.len(),
            new_sales,
            new_price_points,
        }
    }
}
