use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tempfile::TempDir;

use repricer_core::market_data::{MarketDataClient, MarketHistoryStore, SyncEngine, SyncRequest};
use repricer_core::variants::{NewVariant, VariantRepositoryTrait};
use repricer_market_data::{
    HistoricalRequest, MarketDataError, MarketDataSource, MarketSide, RawHistoricalPayload,
    RawPriceLevelPayload, RawSalesPayload,
};
use repricer_storage_sqlite::{
    create_pool, run_migrations, spawn_writer, MarketHistoryRepository, VariantRepository,
};

/// Serves whatever payloads are currently loaded, regardless of the window.
#[derive(Default)]
struct ReplaySource {
    sales: Mutex<Value>,
    series: Mutex<Value>,
}

impl ReplaySource {
    fn load(&self, sales: &[(Value, &str)], series: &[(&str, Value)]) {
        let edges: Vec<Value> = sales
            .iter()
            .map(|(amount, created_at)| {
                json!({ "node": {
                    "amount": amount,
                    "createdAt": created_at,
                    "orderType": "STANDARD",
                    "associatedVariant": { "traits": { "size": "10" } }
                } })
            })
            .collect();
        let points: Vec<Value> = series
            .iter()
            .map(|(x, y)| json!({ "xValue": x, "yValue": y }))
            .collect();

        *self.sales.lock().unwrap() = json!({
            "data": { "data": { "variant": { "market": { "sales": { "edges": edges } } } } }
        });
        *self.series.lock().unwrap() = json!({
            "data": { "data": { "variant": { "salesChart": { "series": points } } } }
        });
    }
}

#[async_trait]
impl MarketDataSource for ReplaySource {
    fn id(&self) -> &'static str {
        "REPLAY"
    }

    async fn fetch_sales(&self, _external_id: &str) -> Result<RawSalesPayload, MarketDataError> {
        Ok(RawSalesPayload(self.sales.lock().unwrap().clone()))
    }

    async fn fetch_historical_prices(
        &self,
        _external_id: &str,
        _request: &HistoricalRequest,
    ) -> Result<RawHistoricalPayload, MarketDataError> {
        Ok(RawHistoricalPayload(self.series.lock().unwrap().clone()))
    }

    async fn fetch_price_levels(
        &self,
        _external_id: &str,
        _side: MarketSide,
    ) -> Result<RawPriceLevelPayload, MarketDataError> {
        Ok(RawPriceLevelPayload(json!({})))
    }
}

struct Fixture {
    _dir: TempDir,
    store: Arc<MarketHistoryRepository>,
    source: Arc<ReplaySource>,
    engine: SyncEngine,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sync.db");
    let pool = create_pool(db_path.to_str().unwrap()).unwrap();
    run_migrations(&pool).unwrap();
    let writer = spawn_writer((*pool).clone());

    let variants = Arc::new(VariantRepository::new(pool.clone(), writer.clone()));
    variants
        .create(NewVariant {
            id: Some("v1".to_string()),
            external_id: "ext-1".to_string(),
            product_id: "prod-1".to_string(),
            name: "Jordan 1 Retro High".to_string(),
            value: Some("10".to_string()),
            upc: None,
        })
        .await
        .unwrap();

    let store = Arc::new(MarketHistoryRepository::new(pool, writer));
    let source = Arc::new(ReplaySource::default());
    let engine = SyncEngine::new(
        variants,
        store.clone(),
        MarketDataClient::new(source.clone()),
    )
    .with_today(|| NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

    Fixture {
        _dir: dir,
        store,
        source,
        engine,
    }
}

#[tokio::test]
async fn test_resync_of_same_history_writes_nothing() {
    let f = fixture().await;
    f.source.load(
        &[
            (json!(250), "2024-01-10T10:00:00Z"),
            (json!(199.5), "2024-01-11T12:30:00.250Z"),
            (json!("310"), "2024-01-12T08:00:00Z"),
        ],
        &[
            ("2024-01-10T00:00:00Z", json!(240)),
            ("2024-01-11T00:00:00Z", json!(245)),
        ],
    );

    let first = f.engine.sync("v1", SyncRequest::default()).await.unwrap();
    assert_eq!(first.sales_count, 3);
    assert_eq!(first.price_points_count, 2);

    let second = f.engine.sync("v1", SyncRequest::default()).await.unwrap();
    assert_eq!(second.sales_count, 0);
    assert_eq!(second.price_points_count, 0);

    assert_eq!(f.store.sales_in_range("v1", None, None).await.unwrap().len(), 3);
    assert_eq!(
        f.store.price_points_in_range("v1", None, None).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_resync_with_rescaled_amounts_writes_nothing() {
    let f = fixture().await;
    f.source.load(
        &[
            (json!(250), "2024-01-10T10:00:00Z"),
            (json!(199.5), "2024-01-11T12:30:00Z"),
        ],
        &[("2024-01-10T00:00:00Z", json!(240))],
    );
    let first = f.engine.sync("v1", SyncRequest::default()).await.unwrap();
    assert_eq!(first.sales_count, 2);

    // Same sales, amounts now as strings with trailing zeros and the
    // timestamps with an explicit offset.
    f.source.load(
        &[
            (json!("250.00"), "2024-01-10T10:00:00+00:00"),
            (json!("199.50"), "2024-01-11T14:30:00+02:00"),
        ],
        &[("2024-01-10T00:00:00.000Z", json!("240.0"))],
    );
    let second = f.engine.sync("v1", SyncRequest::default()).await.unwrap();
    assert_eq!(second.sales_count, 0);
    assert_eq!(second.price_points_count, 0);

    let stored = f.store.sales_in_range("v1", None, None).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().any(|s| s.amount == dec!(250)));
}

#[tokio::test]
async fn test_resync_writes_only_the_new_sale() {
    let f = fixture().await;
    f.source.load(&[(json!(250), "2024-01-10T10:00:00Z")], &[]);
    f.engine.sync("v1", SyncRequest::default()).await.unwrap();

    f.source.load(
        &[
            (json!("250.0"), "2024-01-10T10:00:00Z"),
            (json!(260), "2024-01-10T10:00:00Z"),
        ],
        &[],
    );
    let second = f.engine.sync("v1", SyncRequest::default()).await.unwrap();

    assert_eq!(second.sales_count, 1);
    assert_eq!(second.new_sales[0].amount, dec!(260));
    assert_eq!(f.engine.tracked_locks(), 0);
}
