//! Variants module - domain models, services, and traits.

mod variants_import;
mod variants_model;
mod variants_service;
mod variants_traits;

// Re-export the public interface
pub use variants_import::VariantImportService;
pub use variants_model::{NewVariant, ProductImport, Variant, VariantRef};
pub use variants_service::VariantService;
pub use variants_traits::{VariantImportServiceTrait, VariantRepositoryTrait, VariantServiceTrait};
