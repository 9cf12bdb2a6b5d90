use serde::Deserialize;
use serde_json::Value;

use super::{collect, container, parse_decimal, parse_label, parse_timestamp, ElementParse};
use crate::errors::MarketDataError;
use crate::models::{
    CatalogVariantRecord, ProductRecord, RawProductSearchPayload, RawVariantListPayload,
};

const SEARCH_PRODUCTS: &str = "/products";
const UPC_GTIN_TYPE: &str = "UPC";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductNode {
    product_id: Option<String>,
    title: Option<String>,
    brand: Option<String>,
    style_id: Option<String>,
    product_type: Option<String>,
    url_key: Option<String>,
    product_attributes: Option<ProductAttributes>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductAttributes {
    retail_price: Option<Value>,
    release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantNode {
    variant_id: Option<String>,
    product_id: Option<String>,
    variant_name: Option<String>,
    variant_value: Option<Value>,
    #[serde(default)]
    gtins: Vec<Gtin>,
}

#[derive(Debug, Deserialize)]
struct Gtin {
    identifier: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Maps the best match of a product search, `None` when nothing matched.
///
/// Only the first product is used. Unlike list elements elsewhere, a first
/// product without an id, title, brand or style id fails the call.
pub fn map_product(
    payload: &RawProductSearchPayload,
) -> Result<Option<ProductRecord>, MarketDataError> {
    let products = container(&payload.0, SEARCH_PRODUCTS)?;
    let Some(first) = products.first() else {
        return Ok(None);
    };

    let node: ProductNode = serde_json::from_value(first.clone())
        .map_err(|e| MarketDataError::mapping(format!("Malformed product: {}", e)))?;
    let required = |value: Option<String>, field: &str| {
        non_empty(value)
            .ok_or_else(|| MarketDataError::mapping(format!("Product is missing '{}'", field)))
    };

    let attributes = node.product_attributes.as_ref();
    Ok(Some(ProductRecord {
        product_id: required(node.product_id, "productId")?,
        title: required(node.title, "title")?,
        brand: required(node.brand, "brand")?,
        style_id: required(node.style_id, "styleId")?,
        product_type: non_empty(node.product_type),
        url_key: non_empty(node.url_key),
        retail_price: attributes
            .and_then(|a| a.retail_price.as_ref())
            .and_then(parse_decimal),
        release_date: attributes
            .and_then(|a| a.release_date.as_deref())
            .and_then(parse_timestamp)
            .map(|dt| dt.date_naive()),
    }))
}

/// Parses one element of the variant list.
pub fn parse_catalog_variant(element: &Value) -> ElementParse<CatalogVariantRecord> {
    let node: VariantNode = match serde_json::from_value(element.clone()) {
        Ok(node) => node,
        Err(e) => return ElementParse::Skip(format!("malformed variant: {}", e)),
    };

    let Some(variant_id) = non_empty(node.variant_id) else {
        return ElementParse::Skip("missing variantId".to_string());
    };
    let Some(product_id) = non_empty(node.product_id) else {
        return ElementParse::Skip("missing productId".to_string());
    };
    let Some(name) = non_empty(node.variant_name) else {
        return ElementParse::Skip("missing variantName".to_string());
    };

    let upc = node
        .gtins
        .into_iter()
        .find(|g| g.kind.as_deref() == Some(UPC_GTIN_TYPE))
        .and_then(|g| non_empty(g.identifier));

    ElementParse::Parsed(CatalogVariantRecord {
        variant_id,
        product_id,
        name,
        value: node.variant_value.as_ref().and_then(parse_label),
        upc,
    })
}

/// Maps the variant list of a product.
pub fn map_variants(
    payload: &RawVariantListPayload,
) -> Result<Vec<CatalogVariantRecord>, MarketDataError> {
    let variants = container(&payload.0, "")?;
    Ok(collect(
        "catalog variant",
        variants.iter().map(parse_catalog_variant).collect(),
    ))
}
