//! Decoding of raw marketplace payloads into flat records.
//!
//! Containers are located with JSON pointers. A missing or non-array
//! container fails the whole call with [`MarketDataError::Mapping`]; inside
//! a container each element is parsed on its own into an [`ElementParse`],
//! and skipped elements are logged and dropped.
//!
//! The one exception is the price series: a point whose `xValue` is present
//! but unparsable fails the call, since it means the timestamp format changed.

mod catalog;
mod parse;

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::MarketDataError;
use crate::models::{
    MarketSide, PriceLevelRecord, PricePointRecord, RawHistoricalPayload, RawPriceLevelPayload,
    RawSalesPayload, SaleRecord, DEFAULT_CURRENCY,
};

pub use catalog::{map_product, map_variants, parse_catalog_variant};
pub use parse::{parse_decimal, parse_label, parse_timestamp};

const SALES_EDGES: &str = "/data/data/variant/market/sales/edges";
const PRICE_LEVEL_EDGES: &str = "/data/data/variant/market/priceLevels/edges";
const CHART_SERIES: &str = "/data/data/variant/salesChart/series";

/// Outcome of parsing one list element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementParse<T> {
    Parsed(T),
    Skip(String),
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Traits {
    size: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct VariantTraits {
    traits: Option<Traits>,
}

impl VariantTraits {
    fn size(&self) -> Option<String> {
        self.traits
            .as_ref()
            .and_then(|t| t.size.as_ref())
            .and_then(parse_label)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaleNode {
    amount: Option<Value>,
    created_at: Option<String>,
    order_type: Option<String>,
    associated_variant: Option<VariantTraits>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceLevelNode {
    amount: Option<Value>,
    #[serde(default)]
    count: Option<u32>,
    #[serde(default)]
    own_count: Option<u32>,
    #[serde(default)]
    available_for_flex: Option<bool>,
    variant: Option<VariantTraits>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesPoint {
    x_value: Option<Value>,
    y_value: Option<Value>,
}

fn container<'a>(payload: &'a Value, pointer: &str) -> Result<&'a Vec<Value>, MarketDataError> {
    let pointer_label = if pointer.is_empty() { "/" } else { pointer };
    match payload.pointer(pointer) {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(MarketDataError::mapping(format!(
            "Expected '{}' to be a list, got {}",
            pointer_label,
            json_type(other)
        ))),
        None => Err(MarketDataError::mapping(format!(
            "Missing container '{}'",
            pointer_label
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn edge_node(element: &Value) -> Result<Value, String> {
    let edge: Edge =
        serde_json::from_value(element.clone()).map_err(|e| format!("malformed edge: {}", e))?;
    match edge.node {
        Some(Value::Null) | None => Err("edge has no node".to_string()),
        Some(node) => Ok(node),
    }
}

fn collect<T>(kind: &str, parsed: Vec<ElementParse<T>>) -> Vec<T> {
    let total = parsed.len();
    let mut records = Vec::with_capacity(total);
    for (index, element) in parsed.into_iter().enumerate() {
        match element {
            ElementParse::Parsed(record) => records.push(record),
            ElementParse::Skip(reason) => {
                warn!("Skipping {} element {}: {}", kind, index, reason);
            }
        }
    }
    debug!("Mapped {} of {} {} elements", records.len(), total, kind);
    records
}

/// Parses one sales edge.
pub fn parse_sale_edge(element: &Value) -> ElementParse<SaleRecord> {
    let node = match edge_node(element) {
        Ok(node) => node,
        Err(reason) => return ElementParse::Skip(reason),
    };
    let node: SaleNode = match serde_json::from_value(node) {
        Ok(node) => node,
        Err(e) => return ElementParse::Skip(format!("malformed sale node: {}", e)),
    };

    let Some(amount) = node.amount.as_ref().and_then(parse_decimal) else {
        return ElementParse::Skip("missing or invalid amount".to_string());
    };
    let Some(timestamp) = node.created_at.as_deref().and_then(parse_timestamp) else {
        return ElementParse::Skip("missing or invalid createdAt".to_string());
    };

    ElementParse::Parsed(SaleRecord {
        timestamp,
        amount,
        currency: DEFAULT_CURRENCY.to_string(),
        size: node.associated_variant.as_ref().and_then(VariantTraits::size),
        order_type: node.order_type.filter(|t| !t.is_empty()),
    })
}

/// Parses one bid/ask price-level edge.
pub fn parse_price_level_edge(element: &Value, side: MarketSide) -> ElementParse<PriceLevelRecord> {
    let node = match edge_node(element) {
        Ok(node) => node,
        Err(reason) => return ElementParse::Skip(reason),
    };
    let node: PriceLevelNode = match serde_json::from_value(node) {
        Ok(node) => node,
        Err(e) => return ElementParse::Skip(format!("malformed price level node: {}", e)),
    };

    let Some(amount) = node.amount.as_ref().and_then(parse_decimal) else {
        return ElementParse::Skip("missing or invalid amount".to_string());
    };

    ElementParse::Parsed(PriceLevelRecord {
        side,
        amount,
        currency: DEFAULT_CURRENCY.to_string(),
        count: node.count.unwrap_or(0),
        own_count: node.own_count.unwrap_or(0),
        size: node.variant.as_ref().and_then(VariantTraits::size),
        available_for_flex: node.available_for_flex.unwrap_or(false),
    })
}

/// Parses one price-series point.
///
/// Returns `Err` only for a present but unparsable `xValue`.
pub fn parse_series_point(
    element: &Value,
) -> Result<ElementParse<PricePointRecord>, MarketDataError> {
    if element.is_null() {
        return Ok(ElementParse::Skip("null point".to_string()));
    }
    let point: SeriesPoint = match serde_json::from_value(element.clone()) {
        Ok(point) => point,
        Err(e) => return Ok(ElementParse::Skip(format!("malformed point: {}", e))),
    };

    let timestamp = match point.x_value {
        None | Some(Value::Null) => return Ok(ElementParse::Skip("missing xValue".to_string())),
        Some(Value::String(raw)) => parse_timestamp(&raw).ok_or_else(|| {
            MarketDataError::mapping(format!("Unparsable series timestamp '{}'", raw))
        })?,
        Some(other) => {
            return Err(MarketDataError::mapping(format!(
                "Unexpected series timestamp {}",
                other
            )))
        }
    };

    let Some(price) = point.y_value.as_ref().and_then(parse_decimal) else {
        return Ok(ElementParse::Skip("missing or non-numeric yValue".to_string()));
    };

    Ok(ElementParse::Parsed(PricePointRecord { timestamp, price }))
}

/// Maps a sales payload. One bad node never fails the batch.
pub fn map_sales(payload: &RawSalesPayload) -> Result<Vec<SaleRecord>, MarketDataError> {
    let edges = container(&payload.0, SALES_EDGES)?;
    Ok(collect("sale", edges.iter().map(parse_sale_edge).collect()))
}

/// Maps a bids or asks payload.
pub fn map_price_levels(
    payload: &RawPriceLevelPayload,
    side: MarketSide,
) -> Result<Vec<PriceLevelRecord>, MarketDataError> {
    let edges = container(&payload.0, PRICE_LEVEL_EDGES)?;
    Ok(collect(
        "price level",
        edges
            .iter()
            .map(|edge| parse_price_level_edge(edge, side))
            .collect(),
    ))
}

/// Maps the sales chart series.
pub fn map_historical_prices(
    payload: &RawHistoricalPayload,
) -> Result<Vec<PricePointRecord>, MarketDataError> {
    let series = container(&payload.0, CHART_SERIES)?;
    let parsed = series
        .iter()
        .map(parse_series_point)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(collect("price point", parsed))
}
