mod model;
mod repository;

pub use model::VariantDB;
pub use repository::VariantRepository;
