//! SQLite storage for the repricer.
//!
//! This crate is the only place where Diesel appears. It implements the
//! repository traits defined in `repricer-core`:
//! - [`variants::VariantRepository`] for `VariantRepositoryTrait`
//! - [`market_data::MarketHistoryRepository`] for `MarketHistoryStore`
//!
//! # Architecture
//!
//! ```text
//!        core (domain, sync engine)
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!           │                │
//!     pool (reads)    write actor (inserts)
//!           └───────┬────────┘
//!                   ▼
//!               SQLite DB
//! ```
//!
//! All writes are serialized through a single connection owned by the write
//! actor; reads use the r2d2 pool on the blocking thread pool.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod market_data;
pub mod variants;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use market_data::MarketHistoryRepository;
pub use variants::VariantRepository;

// Re-export from repricer-core for convenience
pub use repricer_core::errors::{DatabaseError, Error, Result};
