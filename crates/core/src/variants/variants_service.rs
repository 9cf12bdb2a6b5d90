use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

use super::variants_model::{NewVariant, Variant};
use super::variants_traits::{VariantRepositoryTrait, VariantServiceTrait};
use crate::errors::{Error, Result};

/// Service for registering and looking up variants.
pub struct VariantService {
    repository: Arc<dyn VariantRepositoryTrait>,
}

impl VariantService {
    pub fn new(repository: Arc<dyn VariantRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl VariantServiceTrait for VariantService {
    async fn create_variant(&self, new_variant: NewVariant) -> Result<Variant> {
        new_variant.validate()?;
        debug!(
            "Creating variant {} (external {})",
            new_variant.name, new_variant.external_id
        );
        let variant = self.repository.create(new_variant).await?;
        info!("Registered variant {} as {}", variant.external_id, variant.id);
        Ok(variant)
    }

    async fn get_variant(&self, variant_id: &str) -> Result<Variant> {
        self.repository
            .find_by_id(variant_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Variant {}", variant_id)))
    }

    async fn list_variants(&self) -> Result<Vec<Variant>> {
        self.repository.list().await
    }
}
