use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency assumed for marketplace amounts; the payload carries none.
pub const DEFAULT_CURRENCY: &str = "USD";

/// A completed sale as reported by the marketplace, not yet tied to a local variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    /// When the sale happened
    pub timestamp: DateTime<Utc>,

    /// Sale price
    pub amount: Decimal,

    /// Currency of `amount`
    pub currency: String,

    /// Size label of the item sold, if the node carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Order type (STANDARD, EXPRESS_STANDARD, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_type: Option<String>,
}

/// One point of the marketplace's time-bucketed sales chart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricePointRecord {
    /// Bucket timestamp
    pub timestamp: DateTime<Utc>,

    /// Price for the bucket
    pub price: Decimal,
}

/// Which side of the order book a price level belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSide {
    Bid,
    Ask,
}

impl MarketSide {
    /// Value of the `type` field in the marketplace request body.
    pub fn as_request_type(&self) -> &'static str {
        match self {
            MarketSide::Bid => "bid",
            MarketSide::Ask => "ask",
        }
    }
}

impl std::str::FromStr for MarketSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bid" | "bids" => Ok(MarketSide::Bid),
            "ask" | "asks" => Ok(MarketSide::Ask),
            other => Err(format!("Unknown market side: {}", other)),
        }
    }
}

/// An aggregated bid or ask price level (live snapshot, never persisted).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceLevelRecord {
    pub side: MarketSide,
    pub amount: Decimal,
    pub currency: String,
    /// Number of orders resting at this price
    pub count: u32,
    /// Number of our own orders at this price
    pub own_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub available_for_flex: bool,
}

/// A catalog product, as returned by the product search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub product_id: String,
    pub title: String,
    pub brand: String,
    pub style_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retail_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
}

/// One size of a catalog product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogVariantRecord {
    /// Marketplace variant id, used as the local variant's external id
    pub variant_id: String,
    pub product_id: String,
    pub name: String,
    /// Size label, e.g. "10.5"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Identifier of the `UPC` entry among the variant's GTINs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upc: Option<String>,
}

/// Parameters for the historical price series request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoricalRequest {
    /// Number of buckets the upstream should return
    pub interval_count: u32,
    /// Inclusive lower bound; `None` lets the upstream apply its default lookback
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound
    pub end_date: Option<NaiveDate>,
}

impl HistoricalRequest {
    pub fn new(interval_count: u32) -> Self {
        Self {
            interval_count,
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }
}
