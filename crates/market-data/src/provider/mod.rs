//! Marketplace clients.
//!
//! - `traits` - The [`MarketDataSource`] and [`CatalogSource`] traits
//! - `stockx` - HTTP client for the StockX market-data proxy and catalog API

pub mod stockx;
mod traits;

pub use stockx::{MarketClientConfig, StockXMarketClient};
pub use traits::{CatalogSource, MarketDataSource};
