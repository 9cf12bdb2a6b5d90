//! Repricer Market Data Crate
//!
//! This crate talks to the marketplace and turns its payloads into typed
//! records. It knows nothing about local storage.
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |    TokenCache    | --> |  TokenFetcher    |  (OAuth refresh-token exchange)
//! +------------------+     +------------------+
//!          ^
//!          |
//! +------------------+
//! | MarketDataSource |  (StockXMarketClient: bearer auth, retry once on 401)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |   Raw payloads   |  (RawSalesPayload, RawHistoricalPayload, RawPriceLevelPayload)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |      mapper      |  (skip bad elements, fail on missing containers)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |     Records      |  (SaleRecord, PricePointRecord, PriceLevelRecord)
//! +------------------+
//! ```
//!
//! Catalog lookups (`CatalogSource`) follow the same path against the
//! marketplace's public catalog API and produce `ProductRecord` and
//! `CatalogVariantRecord`.

pub mod auth;
pub mod errors;
pub mod mapper;
pub mod models;
pub mod provider;

pub use auth::{Credential, CredentialConfig, HttpTokenFetcher, TokenCache, TokenFetcher};
pub use errors::{MarketDataError, RetryClass};
pub use mapper::{
    map_historical_prices, map_price_levels, map_product, map_sales, map_variants, ElementParse,
};
pub use models::{
    CatalogVariantRecord, HistoricalRequest, MarketSide, PriceLevelRecord, PricePointRecord,
    ProductRecord, RawHistoricalPayload, RawPriceLevelPayload, RawProductSearchPayload,
    RawSalesPayload, RawVariantListPayload, SaleRecord,
};
pub use provider::{CatalogSource, MarketClientConfig, MarketDataSource, StockXMarketClient};
