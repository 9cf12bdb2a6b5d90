use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use repricer_core::variants::{NewVariant, Variant, VariantRepositoryTrait};
use repricer_core::Result;

use super::model::VariantDB;
use crate::db::{self, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::variants::dsl as variants_dsl;

pub struct VariantRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl VariantRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl VariantRepositoryTrait for VariantRepository {
    async fn create(&self, new_variant: NewVariant) -> Result<Variant> {
        new_variant.validate()?;
        let row = VariantDB::from_new(new_variant, Utc::now().naive_utc());

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Variant> {
                diesel::insert_into(variants_dsl::variants)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(row.into())
            })
            .await
    }

    async fn find_by_id(&self, variant_id: &str) -> Result<Option<Variant>> {
        let variant_id = variant_id.to_string();
        db::read(&self.pool, move |conn| {
            let row = variants_dsl::variants
                .find(variant_id)
                .select(VariantDB::as_select())
                .first::<VariantDB>(conn)
                .optional()
                .into_core()?;
            Ok(row.map(Variant::from))
        })
        .await
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Variant>> {
        let external_id = external_id.to_string();
        db::read(&self.pool, move |conn| {
            let row = variants_dsl::variants
                .filter(variants_dsl::external_id.eq(external_id))
                .select(VariantDB::as_select())
                .first::<VariantDB>(conn)
                .optional()
                .into_core()?;
            Ok(row.map(Variant::from))
        })
        .await
    }

    async fn list(&self) -> Result<Vec<Variant>> {
        db::read(&self.pool, |conn| {
            let rows = variants_dsl::variants
                .select(VariantDB::as_select())
                .order((variants_dsl::name.asc(), variants_dsl::id.asc()))
                .load::<VariantDB>(conn)
                .into_core()?;
            Ok(rows.into_iter().map(Variant::from).collect())
        })
        .await
    }
}
