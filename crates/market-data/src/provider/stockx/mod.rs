//! StockX clients.
//!
//! Market data goes to a single endpoint, `POST {base}/api/stockx-clean/market-data`,
//! with the record type selected by the `type` field of the JSON body:
//! - `sales` - recent completed sales
//! - `historical` - the bucketed sales chart
//! - `bid` / `ask` - open orders aggregated by price level
//!
//! Catalog lookups are plain `GET`s on the public API:
//! - `/v2/catalog/search?query=` - product search by style id, UPC or text
//! - `/v2/catalog/products/{productId}/variants` - sizes of one product
//!
//! Requests carry a bearer token from the shared [`TokenCache`]. A 401 answer
//! drops the cached token, forces one refresh and replays the request once.

mod models;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::auth::TokenCache;
use crate::errors::{MarketDataError, RetryClass};
use crate::models::{
    HistoricalRequest, MarketSide, RawHistoricalPayload, RawPriceLevelPayload,
    RawProductSearchPayload, RawSalesPayload, RawVariantListPayload,
};
use crate::provider::{CatalogSource, MarketDataSource};

use models::MarketDataRequest;

pub const DEFAULT_BASE_URL: &str = "https://stockxbackend.solobuilderhub.com";
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://api.stockx.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER_ID: &str = "STOCKX";
const MARKET_DATA_PATH: &str = "/api/stockx-clean/market-data";
const CATALOG_SEARCH_PATH: &str = "/v2/catalog/search";

/// Connection settings for [`StockXMarketClient`].
#[derive(Debug, Clone)]
pub struct MarketClientConfig {
    /// Market-data proxy
    pub base_url: String,
    /// Public catalog API
    pub catalog_base_url: String,
    /// Sent as `x-api-key` when present
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for MarketClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            catalog_base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub struct StockXMarketClient {
    client: Client,
    market_endpoint: String,
    catalog_base: String,
    api_key: Option<String>,
    tokens: Arc<TokenCache>,
}

impl StockXMarketClient {
    pub fn new(config: MarketClientConfig, tokens: Arc<TokenCache>) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        let base_url = config.base_url.trim_end_matches('/');

        Self {
            client,
            market_endpoint: format!("{}{}", base_url, MARKET_DATA_PATH),
            catalog_base: config.catalog_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.filter(|k| !k.is_empty()),
            tokens,
        }
    }

    /// Sends the request built by `build` with the cached token, refreshing
    /// it once on a 401. `build` is called again for the replay.
    async fn execute<F>(&self, label: &str, build: F) -> Result<Value, MarketDataError>
    where
        F: Fn(&str) -> RequestBuilder + Send + Sync,
    {
        let token = self.tokens.get_token(false).await?;

        match self.send(label, build(&token)).await {
            Err(e) if e.retry_class() == RetryClass::RefreshCredentials => {
                warn!(
                    "{} rejected the access token for {} request, refreshing",
                    PROVIDER_ID, label
                );
                self.tokens.invalidate().await;
                let token = self.tokens.get_token(true).await?;

                match self.send(label, build(&token)).await {
                    Err(MarketDataError::Unauthorized { .. }) => {
                        error!("{} rejected a freshly issued access token", PROVIDER_ID);
                        Err(MarketDataError::Upstream {
                            provider: PROVIDER_ID.to_string(),
                            status: Some(StatusCode::UNAUTHORIZED.as_u16()),
                            message: "Authentication failed even after token refresh".to_string(),
                        })
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    async fn post_market_data(
        &self,
        body: &MarketDataRequest<'_>,
    ) -> Result<Value, MarketDataError> {
        let label = format!("'{}' productId={}", body.kind, body.product_id);
        self.execute(&label, |token| {
            self.client
                .post(&self.market_endpoint)
                .bearer_auth(token)
                .json(body)
        })
        .await
    }

    async fn get_catalog(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, MarketDataError> {
        let url = format!("{}{}", self.catalog_base, path);
        let label = format!("GET {}", path);
        self.execute(&label, |token| {
            self.client.get(&url).bearer_auth(token).query(query)
        })
        .await
    }

    async fn send(&self, label: &str, request: RequestBuilder) -> Result<Value, MarketDataError> {
        debug!("{} request: {}", PROVIDER_ID, label);

        let request = match &self.api_key {
            Some(api_key) => request.header("x-api-key", api_key),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                MarketDataError::Network(e)
            }
        })?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(MarketDataError::Unauthorized {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("{} request failed with status {}: {}", PROVIDER_ID, status, body);
            return Err(MarketDataError::Upstream {
                provider: PROVIDER_ID.to_string(),
                status: Some(status.as_u16()),
                message: format!("HTTP {} - {}", status, body),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| MarketDataError::Upstream {
                provider: PROVIDER_ID.to_string(),
                status: Some(status.as_u16()),
                message: format!("Failed to decode response: {}", e),
            })
    }
}

#[async_trait]
impl MarketDataSource for StockXMarketClient {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_sales(&self, external_id: &str) -> Result<RawSalesPayload, MarketDataError> {
        let body = MarketDataRequest::variant(external_id, "sales");
        self.post_market_data(&body).await.map(RawSalesPayload)
    }

    async fn fetch_historical_prices(
        &self,
        external_id: &str,
        request: &HistoricalRequest,
    ) -> Result<RawHistoricalPayload, MarketDataError> {
        let body = MarketDataRequest {
            intervals: Some(request.interval_count),
            start_date: request.start_date.map(|d| d.format("%Y-%m-%d").to_string()),
            end_date: request.end_date.map(|d| d.format("%Y-%m-%d").to_string()),
            ..MarketDataRequest::variant(external_id, "historical")
        };
        self.post_market_data(&body).await.map(RawHistoricalPayload)
    }

    async fn fetch_price_levels(
        &self,
        external_id: &str,
        side: MarketSide,
    ) -> Result<RawPriceLevelPayload, MarketDataError> {
        let body = MarketDataRequest::variant(external_id, side.as_request_type());
        self.post_market_data(&body).await.map(RawPriceLevelPayload)
    }
}

#[async_trait]
impl CatalogSource for StockXMarketClient {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn search_products(
        &self,
        query: &str,
    ) -> Result<RawProductSearchPayload, MarketDataError> {
        self.get_catalog(CATALOG_SEARCH_PATH, &[("query", query)])
            .await
            .map(RawProductSearchPayload)
    }

    async fn fetch_variants(
        &self,
        product_id: &str,
    ) -> Result<RawVariantListPayload, MarketDataError> {
        let path = format!("/v2/catalog/products/{}/variants", product_id);
        self.get_catalog(&path, &[]).await.map(RawVariantListPayload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialConfig, TokenFetcher, TokenGrant, TokenRequest};
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Issues "token-1", "token-2", ... in order.
    struct SequenceFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenFetcher for SequenceFetcher {
        async fn fetch_token(
            &self,
            _request: &TokenRequest<'_>,
        ) -> Result<TokenGrant, MarketDataError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(TokenGrant {
                access_token: format!("token-{}", n),
                expires_in: 3600,
            })
        }
    }

    fn credentials() -> CredentialConfig {
        CredentialConfig {
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            refresh_token: Some("refresh".to_string()),
            ..Default::default()
        }
    }

    fn client_for(
        server: &MockServer,
        api_key: Option<&str>,
    ) -> (StockXMarketClient, Arc<SequenceFetcher>) {
        let fetcher = Arc::new(SequenceFetcher {
            calls: AtomicUsize::new(0),
        });
        let tokens = Arc::new(TokenCache::with_fetcher(credentials(), fetcher.clone()));
        let config = MarketClientConfig {
            base_url: server.base_url(),
            catalog_base_url: server.base_url(),
            api_key: api_key.map(str::to_string),
            timeout: Duration::from_secs(5),
        };
        (StockXMarketClient::new(config, tokens), fetcher)
    }

    #[tokio::test]
    async fn test_fetch_sales_sends_bearer_and_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(MARKET_DATA_PATH)
                    .header("authorization", "Bearer token-1")
                    .header("x-api-key", "key-1")
                    .json_body(json!({ "productId": "var-1", "type": "sales", "isVariant": true }));
                then.status(200).json_body(json!({ "data": { "ok": true } }));
            })
            .await;

        let (client, fetcher) = client_for(&server, Some("key-1"));
        let payload = client.fetch_sales("var-1").await.unwrap();

        mock.assert_hits_async(1).await;
        assert_eq!(payload.0, json!({ "data": { "ok": true } }));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_historical_sends_interval_and_dates() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(MARKET_DATA_PATH).json_body(json!({
                    "productId": "var-1",
                    "type": "historical",
                    "isVariant": true,
                    "intervals": 400,
                    "startDate": "2024-01-13",
                    "endDate": "2024-03-01"
                }));
                then.status(200).json_body(json!({}));
            })
            .await;

        let (client, _) = client_for(&server, None);
        let request = HistoricalRequest::new(400).with_range(
            NaiveDate::from_ymd_opt(2024, 1, 13),
            NaiveDate::from_ymd_opt(2024, 3, 1),
        );
        client.fetch_historical_prices("var-1", &request).await.unwrap();

        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_fetch_asks_uses_ask_type() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(MARKET_DATA_PATH)
                    .json_body(json!({ "productId": "var-1", "type": "ask", "isVariant": true }));
                then.status(200).json_body(json!({}));
            })
            .await;

        let (client, _) = client_for(&server, None);
        client.fetch_asks("var-1").await.unwrap();

        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_unauthorized_refreshes_token_and_retries_once() {
        let server = MockServer::start_async().await;
        let rejected = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(MARKET_DATA_PATH)
                    .header("authorization", "Bearer token-1");
                then.status(401).json_body(json!({ "error": "expired" }));
            })
            .await;
        let accepted = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(MARKET_DATA_PATH)
                    .header("authorization", "Bearer token-2");
                then.status(200).json_body(json!({ "data": {} }));
            })
            .await;

        let (client, fetcher) = client_for(&server, None);
        let result = client.fetch_sales("var-1").await;

        assert!(result.is_ok());
        rejected.assert_hits_async(1).await;
        accepted.assert_hits_async(1).await;
        // Initial fetch plus exactly one forced refresh.
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_upstream_error() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(MARKET_DATA_PATH);
                then.status(401);
            })
            .await;

        let (client, fetcher) = client_for(&server, None);
        let err = client.fetch_sales("var-1").await.unwrap_err();

        mock.assert_hits_async(2).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        match err {
            MarketDataError::Upstream { status, message, .. } => {
                assert_eq!(status, Some(401));
                assert!(message.contains("even after token refresh"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(MARKET_DATA_PATH);
                then.status(503).body("maintenance");
            })
            .await;

        let (client, fetcher) = client_for(&server, None);
        let err = client.fetch_sales("var-1").await.unwrap_err();

        mock.assert_hits_async(1).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(err.status(), Some(503));
        assert!(matches!(err, MarketDataError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(MARKET_DATA_PATH);
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .json_body(json!({}));
            })
            .await;

        let (mut client, _) = client_for(&server, None);
        client.client = Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        let err = client.fetch_sales("var-1").await.unwrap_err();
        assert!(matches!(err, MarketDataError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_search_products_sends_query_and_auth() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(CATALOG_SEARCH_PATH)
                    .query_param("query", "DZ5485-612")
                    .header("authorization", "Bearer token-1")
                    .header("x-api-key", "key-1");
                then.status(200)
                    .json_body(json!({ "count": 1, "products": [{ "productId": "p-1" }] }));
            })
            .await;

        let (client, _) = client_for(&server, Some("key-1"));
        let payload = client.search_products("DZ5485-612").await.unwrap();

        mock.assert_hits_async(1).await;
        assert_eq!(payload.0["products"][0]["productId"], "p-1");
    }

    #[tokio::test]
    async fn test_fetch_variants_retries_once_on_unauthorized() {
        let server = MockServer::start_async().await;
        let rejected = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v2/catalog/products/p-1/variants")
                    .header("authorization", "Bearer token-1");
                then.status(401);
            })
            .await;
        let accepted = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v2/catalog/products/p-1/variants")
                    .header("authorization", "Bearer token-2");
                then.status(200).json_body(json!([{ "variantId": "v-1" }]));
            })
            .await;

        let (client, fetcher) = client_for(&server, None);
        let payload = client.fetch_variants("p-1").await.unwrap();

        rejected.assert_hits_async(1).await;
        accepted.assert_hits_async(1).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert!(payload.0.is_array());
    }
}
