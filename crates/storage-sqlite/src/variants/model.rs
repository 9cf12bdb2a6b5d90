//! Database model for variants.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use repricer_core::variants::{NewVariant, Variant};

#[derive(Queryable, Identifiable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::variants)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VariantDB {
    pub id: String,
    pub external_id: String,
    pub product_id: String,
    pub name: String,
    pub value: Option<String>,
    pub upc: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl VariantDB {
    /// Builds the row for a new variant; a missing id gets a time-ordered UUID.
    pub fn from_new(new_variant: NewVariant, now: NaiveDateTime) -> Self {
        Self {
            id: new_variant
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::now_v7().to_string()),
            external_id: new_variant.external_id.trim().to_string(),
            product_id: new_variant.product_id.trim().to_string(),
            name: new_variant.name,
            value: new_variant.value,
            upc: new_variant.upc,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<VariantDB> for Variant {
    fn from(db: VariantDB) -> Self {
        Self {
            id: db.id,
            external_id: db.external_id,
            product_id: db.product_id,
            name: db.name,
            value: db.value,
            upc: db.upc,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
