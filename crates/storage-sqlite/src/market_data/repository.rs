use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::dsl::{exists, max};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use repricer_core::errors::Error;
use repricer_core::market_data::{
    HistoricalPricePoint, MarketHistoryStore, PricePointKey, RecordKind, Sale, SaleKey,
};
use repricer_core::Result;

use super::model::{HistoricalPriceDB, SaleDB};
use crate::db::{self, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::historical_prices::dsl as prices_dsl;
use crate::schema::sales::dsl as sales_dsl;
use crate::utils::{
    day_end_exclusive, day_start, decode_timestamp, encode_decimal, encode_timestamp,
};

/// SQLite-backed [`MarketHistoryStore`].
///
/// Reads go through the pool on the blocking thread pool. Inserts go through
/// the write actor and rely on the natural-key unique indexes, so a row that
/// is already stored is skipped rather than rejected.
pub struct MarketHistoryRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl MarketHistoryRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl MarketHistoryStore for MarketHistoryRepository {
    async fn latest_timestamp(
        &self,
        variant_id: &str,
        kind: RecordKind,
    ) -> Result<Option<DateTime<Utc>>> {
        let variant_id = variant_id.to_string();
        db::read(&self.pool, move |conn| {
            let latest: Option<String> = match kind {
                RecordKind::Sale => sales_dsl::sales
                    .filter(sales_dsl::variant_id.eq(&variant_id))
                    .select(max(sales_dsl::sale_timestamp))
                    .get_result::<Option<String>>(conn)
                    .into_core()?,
                RecordKind::PricePoint => prices_dsl::historical_prices
                    .filter(prices_dsl::variant_id.eq(&variant_id))
                    .select(max(prices_dsl::point_timestamp))
                    .get_result::<Option<String>>(conn)
                    .into_core()?,
            };
            latest
                .as_deref()
                .map(decode_timestamp)
                .transpose()
                .map_err(Error::from)
        })
        .await
    }

    async fn sale_exists(&self, key: &SaleKey) -> Result<bool> {
        let variant_id = key.variant_id.clone();
        let timestamp = encode_timestamp(&key.sale_timestamp);
        let amount = encode_decimal(&key.amount);
        db::read(&self.pool, move |conn| {
            diesel::select(exists(
                sales_dsl::sales
                    .filter(sales_dsl::variant_id.eq(variant_id))
                    .filter(sales_dsl::sale_timestamp.eq(timestamp))
                    .filter(sales_dsl::amount.eq(amount)),
            ))
            .get_result::<bool>(conn)
            .into_core()
        })
        .await
    }

    async fn price_point_exists(&self, key: &PricePointKey) -> Result<bool> {
        let variant_id = key.variant_id.clone();
        let timestamp = encode_timestamp(&key.point_timestamp);
        db::read(&self.pool, move |conn| {
            diesel::select(exists(
                prices_dsl::historical_prices
                    .filter(prices_dsl::variant_id.eq(variant_id))
                    .filter(prices_dsl::point_timestamp.eq(timestamp)),
            ))
            .get_result::<bool>(conn)
            .into_core()
        })
        .await
    }

    async fn insert_sales(&self, sales: Vec<Sale>) -> Result<Vec<Sale>> {
        if sales.is_empty() {
            return Ok(Vec::new());
        }
        let now = Utc::now().naive_utc();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Vec<Sale>> {
                let offered = sales.len();
                let mut written = Vec::with_capacity(offered);
                for sale in sales {
                    let row = SaleDB::from_domain(&sale, now);
                    let inserted = diesel::insert_or_ignore_into(sales_dsl::sales)
                        .values(&row)
                        .execute(conn)
                        .into_core()?;
                    if inserted > 0 {
                        written.push(sale);
                    }
                }
                debug!("Inserted {} of {} sales", written.len(), offered);
                Ok(written)
            })
            .await
    }

    async fn insert_price_points(
        &self,
        points: Vec<HistoricalPricePoint>,
    ) -> Result<Vec<HistoricalPricePoint>> {
        if points.is_empty() {
            return Ok(Vec::new());
        }
        let now = Utc::now().naive_utc();

        self.writer
            .exec(
                move |conn: &mut SqliteConnection| -> Result<Vec<HistoricalPricePoint>> {
                    let offered = points.len();
                    let mut written = Vec::with_capacity(offered);
                    for point in points {
                        let row = HistoricalPriceDB::from_domain(&point, now);
                        let inserted = diesel::insert_or_ignore_into(prices_dsl::historical_prices)
                            .values(&row)
                            .execute(conn)
                            .into_core()?;
                        if inserted > 0 {
                            written.push(point);
                        }
                    }
                    debug!("Inserted {} of {} price points", written.len(), offered);
                    Ok(written)
                },
            )
            .await
    }

    async fn sales_in_range(
        &self,
        variant_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Sale>> {
        let variant_id = variant_id.to_string();
        db::read(&self.pool, move |conn| {
            let mut query = sales_dsl::sales
                .filter(sales_dsl::variant_id.eq(variant_id))
                .select(SaleDB::as_select())
                .order((sales_dsl::sale_timestamp.asc(), sales_dsl::id.asc()))
                .into_boxed();
            if let Some(start) = start {
                query = query.filter(sales_dsl::sale_timestamp.ge(day_start(start)));
            }
            if let Some(bound) = end.and_then(day_end_exclusive) {
                query = query.filter(sales_dsl::sale_timestamp.lt(bound));
            }

            let rows = query.load::<SaleDB>(conn).into_core()?;
            rows.into_iter()
                .map(|row| Sale::try_from(row).map_err(Error::from))
                .collect()
        })
        .await
    }

    async fn price_points_in_range(
        &self,
        variant_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<HistoricalPricePoint>> {
        let variant_id = variant_id.to_string();
        db::read(&self.pool, move |conn| {
            let mut query = prices_dsl::historical_prices
                .filter(prices_dsl::variant_id.eq(variant_id))
                .select(HistoricalPriceDB::as_select())
                .order(prices_dsl::point_timestamp.asc())
                .into_boxed();
            if let Some(start) = start {
                query = query.filter(prices_dsl::point_timestamp.ge(day_start(start)));
            }
            if let Some(bound) = end.and_then(day_end_exclusive) {
                query = query.filter(prices_dsl::point_timestamp.lt(bound));
            }

            let rows = query.load::<HistoricalPriceDB>(conn).into_core()?;
            rows.into_iter()
                .map(|row| HistoricalPricePoint::try_from(row).map_err(Error::from))
                .collect()
        })
        .await
    }
}
