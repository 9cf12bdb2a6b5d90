//! Incremental market history sync.
//!
//! One call walks a fixed sequence of steps:
//!
//! ```text
//! resolve variant ─▶ determine window ─▶ fetch (sales ∥ chart) ─▶ map
//!        ─▶ dedup (per-variant lock held) ─▶ persist ─▶ report
//! ```
//!
//! The window is derived from what is stored, never cached, so a sync that
//! failed half way is repaired by simply running the next one.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use dashmap::DashMap;
use futures::{StreamExt, TryStreamExt};
use log::{debug, info};
use tokio::sync::Mutex;

use super::market_data_client::MarketDataClient;
use super::market_data_constants::{EXISTENCE_CHECK_CONCURRENCY, MAX_INTERVAL_COUNT};
use super::market_data_model::{
    HistoricalPricePoint, RecordKind, Sale, SyncOutcome, SyncRequest, SyncWindow,
};
use super::market_data_traits::MarketHistoryStore;
use crate::errors::{Error, Result};
use crate::variants::{VariantRef, VariantRepositoryTrait};

use repricer_market_data::HistoricalRequest;

type Today = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Computes the inferred window from the newest stored timestamp.
///
/// The start is the calendar day after `latest`; without history there is
/// no start. When history already reaches today the start lands after the
/// end and is passed on as is.
pub fn compute_window(latest: Option<DateTime<Utc>>, today: NaiveDate) -> SyncWindow {
    let window = SyncWindow {
        start_date: latest.and_then(|ts| ts.date_naive().checked_add_days(Days::new(1))),
        end_date: today,
    };
    if let Some(start) = window.start_date.filter(|start| *start > today) {
        debug!(
            "History already covers {}, window start {} is after its end",
            today, start
        );
    }
    window
}

/// Builds the window from caller-supplied bounds. A missing end means today.
pub fn explicit_window(request: &SyncRequest, today: NaiveDate) -> Result<SyncWindow> {
    let window = SyncWindow {
        start_date: request.start_date,
        end_date: request.end_date.unwrap_or(today),
    };
    if let Some(start) = window.start_date {
        if start > window.end_date {
            return Err(Error::invalid_input(format!(
                "Start date {} is after end date {}",
                start, window.end_date
            )));
        }
    }
    Ok(window)
}

/// Orchestrates one incremental sync per call.
///
/// Concurrent calls for different variants proceed independently. Calls for
/// the same variant serialize on a per-variant lock around dedup and persist.
pub struct SyncEngine {
    variants: Arc<dyn VariantRepositoryTrait>,
    store: Arc<dyn MarketHistoryStore>,
    client: MarketDataClient,
    locks: DashMap<String, Arc<Mutex<()>>>,
    today: Today,
}

impl SyncEngine {
    pub fn new(
        variants: Arc<dyn VariantRepositoryTrait>,
        store: Arc<dyn MarketHistoryStore>,
        client: MarketDataClient,
    ) -> Self {
        Self {
            variants,
            store,
            client,
            locks: DashMap::new(),
            today: Arc::new(|| Utc::now().date_naive()),
        }
    }

    /// Replaces the clock used for "today".
    pub fn with_today(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    pub async fn sync(&self, variant_id: &str, request: SyncRequest) -> Result<SyncOutcome> {
        if request.interval_count == 0 || request.interval_count > MAX_INTERVAL_COUNT {
            return Err(Error::invalid_input(format!(
                "Interval count must be between 1 and {}, got {}",
                MAX_INTERVAL_COUNT, request.interval_count
            )));
        }

        let variant = self.resolve_variant(variant_id).await?;
        let window = self.determine_window(&variant, &request).await?;
        info!(
            "Syncing variant {} ({}) for window {:?}..{}",
            variant.local_id, variant.external_id, window.start_date, window.end_date
        );

        let historical = HistoricalRequest::new(request.interval_count)
            .with_range(window.start_date, Some(window.end_date));
        let (sales, points) = futures::try_join!(
            self.client.fetch_sales(&variant),
            self.client.fetch_price_points(&variant, &historical),
        )?;

        let sales = collapse_duplicates(sales, Sale::key);
        let points = collapse_duplicates(points, HistoricalPricePoint::key);
        debug!(
            "Variant {}: {} candidate sales, {} candidate price points",
            variant.local_id,
            sales.len(),
            points.len()
        );

        let persisted = self.persist_new(&variant, sales, points).await;
        self.release_lock(&variant.local_id);
        let outcome = persisted?;

        info!(
            "Variant {} synced: {} new sales, {} new price points",
            variant.local_id, outcome.sales_count, outcome.price_points_count
        );
        Ok(outcome)
    }

    async fn resolve_variant(&self, variant_id: &str) -> Result<VariantRef> {
        self.variants
            .find_by_id(variant_id)
            .await?
            .map(|v| v.to_ref())
            .ok_or_else(|| Error::NotFound(format!("Variant {}", variant_id)))
    }

    async fn determine_window(
        &self,
        variant: &VariantRef,
        request: &SyncRequest,
    ) -> Result<SyncWindow> {
        let today = (self.today)();
        if request.is_explicit() {
            return explicit_window(request, today);
        }

        let (latest_sale, latest_point) = futures::try_join!(
            self.store
                .latest_timestamp(&variant.local_id, RecordKind::Sale),
            self.store
                .latest_timestamp(&variant.local_id, RecordKind::PricePoint),
        )?;
        let latest = latest_sale.max(latest_point);
        debug!(
            "Variant {}: latest sale {:?}, latest price point {:?}",
            variant.local_id, latest_sale, latest_point
        );

        Ok(compute_window(latest, today))
    }

    /// Dedup and persist under the variant's lock.
    async fn persist_new(
        &self,
        variant: &VariantRef,
        sales: Vec<Sale>,
        points: Vec<HistoricalPricePoint>,
    ) -> Result<SyncOutcome> {
        let lock = self.variant_lock(&variant.local_id);
        let _guard = lock.lock().await;

        let new_sales = self.new_sales(sales).await?;
        let new_points = self.new_price_points(points).await?;

        let written_sales = self.store.insert_sales(new_sales).await?;
        let written_points = self.store.insert_price_points(new_points).await?;

        Ok(SyncOutcome::new(written_sales, written_points))
    }

    fn variant_lock(&self, variant_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(variant_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drops the variant's lock entry once no other sync holds or awaits it.
    fn release_lock(&self, variant_id: &str) {
        self.locks.remove_if(variant_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Number of variants with a lock entry.
    pub fn tracked_locks(&self) -> usize {
        self.locks.len()
    }

    async fn new_sales(&self, candidates: Vec<Sale>) -> Result<Vec<Sale>> {
        let total = candidates.len();
        let store = &self.store;
        let fresh: Vec<Sale> = futures::stream::iter(candidates)
            .map(|sale| async move {
                let exists = store.sale_exists(&sale.key()).await?;
                Ok::<_, Error>((!exists).then_some(sale))
            })
            .buffered(EXISTENCE_CHECK_CONCURRENCY)
            .try_filter_map(|sale| async move { Ok(sale) })
            .try_collect()
            .await?;
        debug!("{} of {} sales already stored", total - fresh.len(), total);
        Ok(fresh)
    }

    async fn new_price_points(
        &self,
        candidates: Vec<HistoricalPricePoint>,
    ) -> Result<Vec<HistoricalPricePoint>> {
        let total = candidates.len();
        let store = &self.store;
        let fresh: Vec<HistoricalPricePoint> = futures::stream::iter(candidates)
            .map(|point| async move {
                let exists = store.price_point_exists(&point.key()).await?;
                Ok::<_, Error>((!exists).then_some(point))
            })
            .buffered(EXISTENCE_CHECK_CONCURRENCY)
            .try_filter_map(|point| async move { Ok(point) })
            .try_collect()
            .await?;
        debug!(
            "{} of {} price points already stored",
            total - fresh.len(),
            total
        );
        Ok(fresh)
    }
}

/// Keeps the first record for each key, preserving order.
fn collapse_duplicates<T, K, F>(records: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(key(record)))
        .collect()
}
