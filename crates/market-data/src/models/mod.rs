//! Market data models
//!
//! This module contains the data types exchanged with the marketplace:
//! - `payload` - Raw response bodies, kept as JSON until mapped
//! - `records` - Flat, typed records produced by the mapper
//!   (SaleRecord, PricePointRecord, PriceLevelRecord, ProductRecord, CatalogVariantRecord)

mod payload;
mod records;

pub use payload::{
    RawHistoricalPayload, RawPriceLevelPayload, RawProductSearchPayload, RawSalesPayload,
    RawVariantListPayload,
};
pub use records::{
    CatalogVariantRecord, HistoricalRequest, MarketSide, PriceLevelRecord, PricePointRecord,
    ProductRecord, SaleRecord, DEFAULT_CURRENCY,
};
