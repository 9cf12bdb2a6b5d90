//! Market Data Client - Facade for the market-data crate.
//!
//! Fetches raw payloads through a [`MarketDataSource`], maps them with the
//! market-data crate's mapper and attaches the local variant id, so the rest
//! of core only sees domain records.
//!
//! ```text
//! VariantRef ─▶ MarketDataSource ─▶ Raw*Payload ─▶ mapper ─▶ *Record
//!            ─▶ Sale / HistoricalPricePoint
//! ```

use std::sync::Arc;

use log::debug;

use super::market_data_model::{HistoricalPricePoint, MarketSide, PriceLevel, Sale};
use crate::errors::Result;
use crate::variants::VariantRef;

use repricer_market_data::{
    map_historical_prices, map_price_levels, map_sales, HistoricalRequest, MarketDataSource,
    PriceLevelRecord, PricePointRecord, RawHistoricalPayload, RawPriceLevelPayload,
    RawSalesPayload, SaleRecord,
};

#[derive(Clone)]
pub struct MarketDataClient {
    source: Arc<dyn MarketDataSource>,
}

impl MarketDataClient {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }

    pub async fn fetch_sales(&self, variant: &VariantRef) -> Result<Vec<Sale>> {
        let payload = self.source.fetch_sales(&variant.external_id).await?;
        let sales = sales_for_variant(&payload, variant)?;
        debug!(
            "Fetched {} sales for variant {} from {}",
            sales.len(),
            variant.local_id,
            self.source.id()
        );
        Ok(sales)
    }

    pub async fn fetch_price_points(
        &self,
        variant: &VariantRef,
        request: &HistoricalRequest,
    ) -> Result<Vec<HistoricalPricePoint>> {
        let payload = self
            .source
            .fetch_historical_prices(&variant.external_id, request)
            .await?;
        let points = price_points_for_variant(&payload, variant)?;
        debug!(
            "Fetched {} price points for variant {} from {}",
            points.len(),
            variant.local_id,
            self.source.id()
        );
        Ok(points)
    }

    pub async fn fetch_price_levels(
        &self,
        variant: &VariantRef,
        side: MarketSide,
    ) -> Result<Vec<PriceLevel>> {
        let payload = match side {
            MarketSide::Bid => self.source.fetch_bids(&variant.external_id).await?,
            MarketSide::Ask => self.source.fetch_asks(&variant.external_id).await?,
        };
        price_levels_for_variant(&payload, side, variant)
    }
}

/// Maps a sales payload into sales owned by `variant`.
pub fn sales_for_variant(payload: &RawSalesPayload, variant: &VariantRef) -> Result<Vec<Sale>> {
    Ok(map_sales(payload)?
        .into_iter()
        .map(|record| sale_from_record(record, &variant.local_id))
        .collect())
}

/// Maps a chart payload into price points owned by `variant`.
pub fn price_points_for_variant(
    payload: &RawHistoricalPayload,
    variant: &VariantRef,
) -> Result<Vec<HistoricalPricePoint>> {
    Ok(map_historical_prices(payload)?
        .into_iter()
        .map(|record| price_point_from_record(record, &variant.local_id))
        .collect())
}

pub fn price_levels_for_variant(
    payload: &RawPriceLevelPayload,
    side: MarketSide,
    variant: &VariantRef,
) -> Result<Vec<PriceLevel>> {
    Ok(map_price_levels(payload, side)?
        .into_iter()
        .map(|record| price_level_from_record(record, &variant.local_id))
        .collect())
}

fn sale_from_record(record: SaleRecord, variant_id: &str) -> Sale {
    Sale {
        variant_id: variant_id.to_string(),
        sale_timestamp: record.timestamp,
        amount: record.amount,
        currency: record.currency,
        size: record.size,
        order_type: record.order_type,
    }
}

fn price_point_from_record(record: PricePointRecord, variant_id: &str) -> HistoricalPricePoint {
    HistoricalPricePoint {
        variant_id: variant_id.to_string(),
        point_timestamp: record.timestamp,
        price: record.price,
    }
}

fn price_level_from_record(record: PriceLevelRecord, variant_id: &str) -> PriceLevel {
    PriceLevel {
        variant_id: variant_id.to_string(),
        side: record.side,
        amount: record.amount,
        currency: record.currency,
        count: record.count,
        own_count: record.own_count,
        size: record.size,
        available_for_flex: record.available_for_flex,
    }
}
