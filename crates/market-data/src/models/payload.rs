use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw body of a `type: "sales"` response.
///
/// Kept as untyped JSON until [`crate::mapper`] navigates it, so that one
/// malformed node never fails deserialization of the whole response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSalesPayload(pub Value);

/// Raw body of a `type: "historical"` response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawHistoricalPayload(pub Value);

/// Raw body of a `type: "bid"` or `type: "ask"` response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPriceLevelPayload(pub Value);

/// Raw body of `GET /v2/catalog/search`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawProductSearchPayload(pub Value);

/// Raw body of `GET /v2/catalog/products/{productId}/variants`, a bare JSON array.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawVariantListPayload(pub Value);

macro_rules! impl_from_value {
    ($($ty:ident),*) => {
        $(
            impl From<Value> for $ty {
                fn from(value: Value) -> Self {
                    $ty(value)
                }
            }
        )*
    };
}

impl_from_value!(
    RawSalesPayload,
    RawHistoricalPayload,
    RawPriceLevelPayload,
    RawProductSearchPayload,
    RawVariantListPayload
);
