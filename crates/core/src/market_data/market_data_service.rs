use async_trait::async_trait;
use chrono::NaiveDate;
use futures::StreamExt;
use log::{debug, warn};
use std::sync::Arc;

use super::market_data_client::MarketDataClient;
use super::market_data_constants::SYNC_ALL_CONCURRENCY;
use super::market_data_model::{
    HistoricalPricePoint, MarketSide, PriceLevel, Sale, SyncOutcome, SyncRequest,
};
use super::market_data_traits::{MarketDataServiceTrait, MarketHistoryStore};
use super::sync_engine::SyncEngine;
use crate::errors::{Error, Result};
use crate::variants::{VariantRef, VariantRepositoryTrait};

/// Caller-facing market history operations.
pub struct MarketDataService {
    variants: Arc<dyn VariantRepositoryTrait>,
    store: Arc<dyn MarketHistoryStore>,
    client: MarketDataClient,
    engine: SyncEngine,
}

impl MarketDataService {
    pub fn new(
        variants: Arc<dyn VariantRepositoryTrait>,
        store: Arc<dyn MarketHistoryStore>,
        client: MarketDataClient,
    ) -> Self {
        let engine = SyncEngine::new(variants.clone(), store.clone(), client.clone());
        Self::with_engine(variants, store, client, engine)
    }

    pub fn with_engine(
        variants: Arc<dyn VariantRepositoryTrait>,
        store: Arc<dyn MarketHistoryStore>,
        client: MarketDataClient,
        engine: SyncEngine,
    ) -> Self {
        Self {
            variants,
            store,
            client,
            engine,
        }
    }

    async fn resolve(&self, variant_id: &str) -> Result<VariantRef> {
        self.variants
            .find_by_id(variant_id)
            .await?
            .map(|v| v.to_ref())
            .ok_or_else(|| Error::NotFound(format!("Variant {}", variant_id)))
    }
}

fn check_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
    match (start, end) {
        (Some(s), Some(e)) if s > e => Err(Error::invalid_input(format!(
            "Start date {} is after end date {}",
            s, e
        ))),
        _ => Ok(()),
    }
}

#[async_trait]
impl MarketDataServiceTrait for MarketDataService {
    async fn sync(&self, variant_id: &str, request: SyncRequest) -> Result<SyncOutcome> {
        self.engine.sync(variant_id, request).await
    }

    async fn sync_all(&self, request: SyncRequest) -> Result<Vec<(String, Result<SyncOutcome>)>> {
        let variants = self.variants.list().await?;
        debug!("Syncing {} variants", variants.len());

        let results = futures::stream::iter(variants)
            .map(|variant| async move {
                let result = self.engine.sync(&variant.id, request).await;
                if let Err(e) = &result {
                    warn!("Sync failed for variant {}: {}", variant.id, e);
                }
                (variant.id, result)
            })
            .buffer_unordered(SYNC_ALL_CONCURRENCY)
            .collect::<Vec<_>>()
            .await;

        Ok(results)
    }

    async fn get_sales(
        &self,
        variant_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Sale>> {
        check_range(start, end)?;
        let variant = self.resolve(variant_id).await?;
        self.store.sales_in_range(&variant.local_id, start, end).await
    }

    async fn get_price_points(
        &self,
        variant_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<HistoricalPricePoint>> {
        check_range(start, end)?;
        let variant = self.resolve(variant_id).await?;
        self.store
            .price_points_in_range(&variant.local_id, start, end)
            .await
    }

    async fn get_price_levels(
        &self,
        variant_id: &str,
        side: MarketSide,
    ) -> Result<Vec<PriceLevel>> {
        let variant = self.resolve(variant_id).await?;
        self.client.fetch_price_levels(&variant, side).await
    }
}
