//! Variant domain models.

use chrono::NaiveDateTime;
use repricer_market_data::{CatalogVariantRecord, ProductRecord};
use serde::{Deserialize, Serialize};

use crate::{errors::ValidationError, Error, Result};

/// A sellable unit (a product at a given size) tracked on the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    /// Marketplace variant UUID
    pub external_id: String,
    /// Marketplace product UUID
    pub product_id: String,
    pub name: String,
    /// Size label, e.g. "10.5"
    pub value: Option<String>,
    pub upc: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Variant {
    pub fn to_ref(&self) -> VariantRef {
        VariantRef {
            local_id: self.id.clone(),
            external_id: self.external_id.clone(),
        }
    }
}

/// The two identifiers a sync needs, resolved once per call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantRef {
    pub local_id: String,
    pub external_id: String,
}

/// Input model for registering a variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVariant {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub external_id: String,
    pub product_id: String,
    pub name: String,
    pub value: Option<String>,
    pub upc: Option<String>,
}

impl NewVariant {
    /// Validates the new variant data.
    pub fn validate(&self) -> Result<()> {
        if self.external_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "externalId".to_string(),
            )));
        }
        if self.product_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "productId".to_string(),
            )));
        }
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Variant name cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}

impl From<CatalogVariantRecord> for NewVariant {
    fn from(record: CatalogVariantRecord) -> Self {
        Self {
            id: None,
            external_id: record.variant_id,
            product_id: record.product_id,
            name: record.name,
            value: record.value,
            upc: record.upc,
        }
    }
}

/// Outcome of registering the variants of one catalog product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImport {
    pub product: ProductRecord,
    /// Variants registered by this import
    pub created: Vec<Variant>,
    /// External ids that were already registered and left untouched
    pub existing: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_variant() -> NewVariant {
        NewVariant {
            id: None,
            external_id: "ext-1".to_string(),
            product_id: "prod-1".to_string(),
            name: "Jordan 1 Retro High".to_string(),
            value: Some("10".to_string()),
            upc: None,
        }
    }

    #[test]
    fn test_validate_accepts_complete_input() {
        assert!(new_variant().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let mut v = new_variant();
        v.external_id = " ".to_string();
        assert!(matches!(
            v.validate(),
            Err(Error::Validation(ValidationError::MissingField(f))) if f == "externalId"
        ));

        let mut v = new_variant();
        v.name = String::new();
        assert!(v.validate().is_err());
    }
}
