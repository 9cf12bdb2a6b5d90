use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use repricer_core::market_data::{MarketDataClient, MarketDataService, MarketDataServiceTrait};
use repricer_core::variants::{
    VariantImportService, VariantImportServiceTrait, VariantService, VariantServiceTrait,
};
use repricer_market_data::{StockXMarketClient, TokenCache};
use repricer_storage_sqlite::db;
use repricer_storage_sqlite::{MarketHistoryRepository, VariantRepository};

use crate::config::{Config, LogFormat};

pub struct AppState {
    pub variant_service: Arc<dyn VariantServiceTrait>,
    pub import_service: Arc<dyn VariantImportServiceTrait>,
    pub market_data_service: Arc<dyn MarketDataServiceTrait>,
}

/// Logs go to stderr; stdout carries command output only.
pub fn init_tracing(log_format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Opens the database and wires repositories, the marketplace client and services.
///
/// Must run inside the Tokio runtime: it spawns the write actor.
pub fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());

    let variant_repository = Arc::new(VariantRepository::new(pool.clone(), writer.clone()));
    let history_repository = Arc::new(MarketHistoryRepository::new(pool, writer));

    let tokens = Arc::new(TokenCache::new(config.credentials.clone()));
    let source = Arc::new(StockXMarketClient::new(config.market.clone(), tokens));
    tracing::debug!(
        "Market data API: {}, catalog API: {}",
        config.market.base_url,
        config.market.catalog_base_url
    );

    let variant_service = Arc::new(VariantService::new(variant_repository.clone()));
    let import_service = Arc::new(VariantImportService::new(
        variant_repository.clone(),
        source.clone(),
    ));
    let market_data_service = Arc::new(MarketDataService::new(
        variant_repository,
        history_repository,
        MarketDataClient::new(source),
    ));

    Ok(AppState {
        variant_service,
        import_service,
        market_data_service,
    })
}
