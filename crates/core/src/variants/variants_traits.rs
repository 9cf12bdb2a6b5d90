//! Variant repository and service traits.

use async_trait::async_trait;

use super::variants_model::{NewVariant, ProductImport, Variant};
use crate::errors::Result;

/// Trait defining the contract for Variant repository operations.
///
/// Sync never creates variants; `create` is only reached through
/// [`VariantServiceTrait::create_variant`].
#[async_trait]
pub trait VariantRepositoryTrait: Send + Sync {
    async fn create(&self, new_variant: NewVariant) -> Result<Variant>;

    /// Looks a variant up by its local id.
    async fn find_by_id(&self, variant_id: &str) -> Result<Option<Variant>>;

    /// Looks a variant up by its marketplace id.
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Variant>>;

    async fn list(&self) -> Result<Vec<Variant>>;
}

/// Trait defining the contract for Variant service operations.
#[async_trait]
pub trait VariantServiceTrait: Send + Sync {
    async fn create_variant(&self, new_variant: NewVariant) -> Result<Variant>;

    /// Fails with `Error::NotFound` for an unknown id.
    async fn get_variant(&self, variant_id: &str) -> Result<Variant>;

    async fn list_variants(&self) -> Result<Vec<Variant>>;
}

/// Registers variants from the marketplace catalog.
#[async_trait]
pub trait VariantImportServiceTrait: Send + Sync {
    /// Looks up the best catalog match for `query` (style id, UPC or text)
    /// and registers each of its variants that is not registered yet.
    ///
    /// Fails with `Error::NotFound` when the search has no match.
    async fn import_product(&self, query: &str) -> Result<ProductImport>;
}
