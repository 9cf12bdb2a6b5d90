//! Column encodings shared by the repositories.
//!
//! Timestamps are stored as fixed-width UTC text so that `ORDER BY`, `MAX()`
//! and range filters on the text column follow time order. Decimals are stored
//! normalized so that `250` and `250.00` hit the same unique key.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::StorageError;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

pub fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_PARSE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| StorageError::Corrupt(format!("timestamp '{}': {}", raw, e)))
}

/// Encoded midnight UTC of `date`, the inclusive lower bound of that day.
pub fn day_start(date: NaiveDate) -> String {
    encode_timestamp(&date.and_time(NaiveTime::MIN).and_utc())
}

/// Exclusive upper bound covering all of `date`. `None` when there is no next day.
pub fn day_end_exclusive(date: NaiveDate) -> Option<String> {
    date.succ_opt().map(day_start)
}

pub fn encode_decimal(value: &Decimal) -> String {
    value.normalize().to_string()
}

pub fn decode_decimal(raw: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(raw).map_err(|e| StorageError::Corrupt(format!("decimal '{}': {}", raw, e)))
}
