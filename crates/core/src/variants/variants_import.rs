use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::Arc;

use repricer_market_data::{map_product, map_variants, CatalogSource};

use super::variants_model::{NewVariant, ProductImport};
use super::variants_traits::{VariantImportServiceTrait, VariantRepositoryTrait};
use crate::errors::{DatabaseError, Error, Result};

/// Registers the variants of a catalog product.
pub struct VariantImportService {
    repository: Arc<dyn VariantRepositoryTrait>,
    catalog: Arc<dyn CatalogSource>,
}

impl VariantImportService {
    pub fn new(
        repository: Arc<dyn VariantRepositoryTrait>,
        catalog: Arc<dyn CatalogSource>,
    ) -> Self {
        Self {
            repository,
            catalog,
        }
    }
}

#[async_trait]
impl VariantImportServiceTrait for VariantImportService {
    async fn import_product(&self, query: &str) -> Result<ProductImport> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::invalid_input("Catalog query cannot be empty"));
        }

        let payload = self.catalog.search_products(query).await?;
        let product = map_product(&payload)?
            .ok_or_else(|| Error::NotFound(format!("Catalog product matching '{}'", query)))?;
        debug!(
            "Catalog match for '{}': {} ({})",
            query, product.title, product.product_id
        );

        let payload = self.catalog.fetch_variants(&product.product_id).await?;
        let records = map_variants(&payload)?;

        let mut created = Vec::new();
        let mut existing = Vec::new();
        for record in records {
            if record.product_id != product.product_id {
                warn!(
                    "Skipping catalog variant {} of product {}, expected {}",
                    record.variant_id, record.product_id, product.product_id
                );
                continue;
            }
            let external_id = record.variant_id.clone();
            if self
                .repository
                .find_by_external_id(&external_id)
                .await?
                .is_some()
            {
                existing.push(external_id);
                continue;
            }
            match self.repository.create(NewVariant::from(record)).await {
                Ok(variant) => created.push(variant),
                // Registered by a concurrent import since the lookup.
                Err(Error::Database(DatabaseError::UniqueViolation(_))) => {
                    existing.push(external_id)
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Imported product {} from {}: {} new, {} already registered",
            product.style_id,
            self.catalog.id(),
            created.len(),
            existing.len()
        );
        Ok(ProductImport {
            product,
            created,
            existing,
        })
    }
}
