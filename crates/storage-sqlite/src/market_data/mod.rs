mod model;
mod repository;

pub use model::{HistoricalPriceDB, SaleDB};
pub use repository::MarketHistoryRepository;
