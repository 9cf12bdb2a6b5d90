//! The marketplace source traits.
//!
//! [`MarketDataSource`] is the seam between the sync engine and the HTTP
//! client, so the engine can be tested against a scripted source.
//! [`CatalogSource`] plays the same role for product imports.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{
    HistoricalRequest, MarketSide, RawHistoricalPayload, RawPriceLevelPayload,
    RawProductSearchPayload, RawSalesPayload, RawVariantListPayload,
};

/// Authenticated access to the marketplace's market-data endpoint.
///
/// All methods return the raw payload; decoding is left to [`crate::mapper`].
/// Implementations own the token lifecycle, including the single retry after
/// an authorization failure.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Identifier used in logs and error messages, e.g. "STOCKX".
    fn id(&self) -> &'static str;

    /// Recent completed sales for a variant.
    async fn fetch_sales(&self, external_id: &str) -> Result<RawSalesPayload, MarketDataError>;

    /// Time-bucketed price series for a variant.
    async fn fetch_historical_prices(
        &self,
        external_id: &str,
        request: &HistoricalRequest,
    ) -> Result<RawHistoricalPayload, MarketDataError>;

    /// Open bids or asks for a variant, aggregated by price.
    async fn fetch_price_levels(
        &self,
        external_id: &str,
        side: MarketSide,
    ) -> Result<RawPriceLevelPayload, MarketDataError>;

    async fn fetch_bids(&self, external_id: &str) -> Result<RawPriceLevelPayload, MarketDataError> {
        self.fetch_price_levels(external_id, MarketSide::Bid).await
    }

    async fn fetch_asks(&self, external_id: &str) -> Result<RawPriceLevelPayload, MarketDataError> {
        self.fetch_price_levels(external_id, MarketSide::Ask).await
    }
}

/// Product and variant lookups against the marketplace catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn id(&self) -> &'static str;

    /// Full-text catalog search; a style id or UPC usually yields one product.
    async fn search_products(
        &self,
        query: &str,
    ) -> Result<RawProductSearchPayload, MarketDataError>;

    /// Every size of a catalog product.
    async fn fetch_variants(
        &self,
        product_id: &str,
    ) -> Result<RawVariantListPayload, MarketDataError>;
}
