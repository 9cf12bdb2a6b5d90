//! Market data module - marketplace history sync.
//!
//! - `market_data_model` - Sale, HistoricalPricePoint, PriceLevel and sync value types
//! - `market_data_traits` - [`MarketHistoryStore`] (persistence) and the service trait
//! - `market_data_client` - Facade over the market-data crate
//! - `sync_engine` - [`SyncEngine`], the incremental sync orchestrator
//! - `market_data_service` - [`MarketDataService`], the caller-facing operations
//!
//! ```text
//! MarketDataService ─▶ SyncEngine ─▶ MarketDataClient ─▶ market-data crate
//!                          │
//!                          ├─▶ VariantRepositoryTrait (resolve)
//!                          └─▶ MarketHistoryStore (window, dedup, persist)
//! ```

mod market_data_client;
mod market_data_constants;
mod market_data_model;
mod market_data_service;
mod market_data_traits;
mod sync_engine;


// Re-export the public interface
pub use market_data_client::{
    price_levels_for_variant, price_points_for_variant, sales_for_variant, MarketDataClient,
};
pub use market_data_constants::*;
pub use market_data_model::{
    HistoricalPricePoint, MarketSide, PriceLevel, PricePointKey, RecordKind, Sale, SaleKey,
    SyncOutcome, SyncRequest, SyncWindow,
};
pub use market_data_service::MarketDataService;
pub use market_data_traits::{MarketDataServiceTrait, MarketHistoryStore};
pub use sync_engine::{compute_window, explicit_window, SyncEngine};
