//! Repricer Core - Domain entities, services, and traits.
//!
//! This crate contains the marketplace history sync logic. It is
//! database-agnostic and defines traits that are implemented by the
//! `storage-sqlite` crate.

pub mod errors;
pub mod market_data;
pub mod variants;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
