use std::time::Duration;

use repricer_market_data::auth::{
    DEFAULT_AUDIENCE, DEFAULT_EXPIRY_BUFFER_SECS, DEFAULT_GRANT_TYPE, DEFAULT_TOKEN_URL,
};
use repricer_market_data::provider::stockx::{DEFAULT_BASE_URL, DEFAULT_CATALOG_BASE_URL};
use repricer_market_data::{CredentialConfig, MarketClientConfig};

const DEFAULT_DB_PATH: &str = "./db/repricer.db";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub log_format: LogFormat,
    pub market: MarketClientConfig,
    pub credentials: CredentialConfig,
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let log_format = match get("REPRICER_LOG_FORMAT") {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        let timeout_ms: u64 = get("MARKET_DATA_REQUEST_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
        let expiry_buffer_secs: i64 = get("REPRICER_TOKEN_BUFFER_SECS")
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs >= 0)
            .unwrap_or(DEFAULT_EXPIRY_BUFFER_SECS);

        Self {
            db_path: get("REPRICER_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.into()),
            log_format,
            market: MarketClientConfig {
                base_url: get("MARKET_DATA_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
                catalog_base_url: get("STOCKX_API_URL")
                    .unwrap_or_else(|| DEFAULT_CATALOG_BASE_URL.into()),
                api_key: get("STOCKX_API_KEY"),
                timeout: Duration::from_millis(timeout_ms),
            },
            credentials: CredentialConfig {
                token_url: get("STOCKX_AUTH_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.into()),
                client_id: get("STOCKX_CLIENT_ID"),
                client_secret: get("STOCKX_CLIENT_SECRET"),
                refresh_token: get("STOCKX_REFRESH_TOKEN"),
                grant_type: get("STOCKX_GRANT_TYPE").unwrap_or_else(|| DEFAULT_GRANT_TYPE.into()),
                audience: get("STOCKX_AUDIENCE").unwrap_or_else(|| DEFAULT_AUDIENCE.into()),
                expiry_buffer_secs,
            },
        }
    }
}
