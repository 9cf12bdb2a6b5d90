//! Database models for sales and historical price points.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use repricer_core::market_data::{HistoricalPricePoint, Sale};

use crate::errors::StorageError;
use crate::utils::{decode_decimal, decode_timestamp, encode_decimal, encode_timestamp};

#[derive(Queryable, Identifiable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::sales)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SaleDB {
    pub id: String,
    pub variant_id: String,
    pub sale_timestamp: String,
    pub amount: String,
    pub currency: String,
    pub size: Option<String>,
    pub order_type: Option<String>,
    pub created_at: NaiveDateTime,
}

impl SaleDB {
    pub fn from_domain(sale: &Sale, now: NaiveDateTime) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            variant_id: sale.variant_id.clone(),
            sale_timestamp: encode_timestamp(&sale.sale_timestamp),
            amount: encode_decimal(&sale.amount),
            currency: sale.currency.clone(),
            size: sale.size.clone(),
            order_type: sale.order_type.clone(),
            created_at: now,
        }
    }
}

impl TryFrom<SaleDB> for Sale {
    type Error = StorageError;

    fn try_from(db: SaleDB) -> Result<Self, Self::Error> {
        Ok(Self {
            sale_timestamp: decode_timestamp(&db.sale_timestamp)?,
            amount: decode_decimal(&db.amount)?,
            variant_id: db.variant_id,
            currency: db.currency,
            size: db.size,
            order_type: db.order_type,
        })
    }
}

#[derive(Queryable, Identifiable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::historical_prices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HistoricalPriceDB {
    pub id: String,
    pub variant_id: String,
    pub point_timestamp: String,
    pub price: String,
    pub created_at: NaiveDateTime,
}

impl HistoricalPriceDB {
    pub fn from_domain(point: &HistoricalPricePoint, now: NaiveDateTime) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            variant_id: point.variant_id.clone(),
            point_timestamp: encode_timestamp(&point.point_timestamp),
            price: encode_decimal(&point.price),
            created_at: now,
        }
    }
}

impl TryFrom<HistoricalPriceDB> for HistoricalPricePoint {
    type Error = StorageError;

    fn try_from(db: HistoricalPriceDB) -> Result<Self, Self::Error> {
        Ok(Self {
            point_timestamp: decode_timestamp(&db.point_timestamp)?,
            price: decode_decimal(&db.price)?,
            variant_id: db.variant_id,
        })
    }
}
