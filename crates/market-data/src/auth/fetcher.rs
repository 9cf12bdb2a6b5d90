use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use super::config::TokenRequest;
use crate::errors::MarketDataError;

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

const DEFAULT_TOKEN_TIMEOUT: Duration = Duration::from_secs(30);

/// A freshly issued bearer token.
#[derive(Clone)]
pub struct TokenGrant {
    pub access_token: String,
    /// Lifetime in seconds as reported by the endpoint
    pub expires_in: i64,
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Performs the network exchange of client credentials for a bearer token.
///
/// Split out of [`super::TokenCache`] so the caching and single-flight logic
/// can be exercised without a token server.
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch_token(&self, request: &TokenRequest<'_>) -> Result<TokenGrant, MarketDataError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// OAuth refresh-token exchange over HTTP (form-encoded POST).
pub struct HttpTokenFetcher {
    client: reqwest::Client,
}

impl HttpTokenFetcher {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TOKEN_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

impl Default for HttpTokenFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenFetcher for HttpTokenFetcher {
    async fn fetch_token(&self, request: &TokenRequest<'_>) -> Result<TokenGrant, MarketDataError> {
        debug!("Requesting access token from {}", request.token_url);

        let form = [
            ("grant_type", request.grant_type),
            ("client_id", request.client_id),
            ("client_secret", request.client_secret),
            ("audience", request.audience),
            ("refresh_token", request.refresh_token),
        ];

        let response = self
            .client
            .post(request.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MarketDataError::auth("Token request timed out")
                } else {
                    MarketDataError::auth(format!("Token request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::auth(format!(
                "Token endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::auth(format!("Invalid token response: {}", e)))?;

        let access_token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| MarketDataError::auth("Token response did not contain access_token"))?;

        Ok(TokenGrant {
            access_token,
            expires_in: body.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    fn config(url: String) -> CredentialConfig {
        CredentialConfig {
            token_url: url,
            client_id: Some("client-1".to_string()),
            client_secret: Some("s3cret".to_string()),
            refresh_token: Some("rt-abc".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_posts_form_and_reads_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/oauth/token")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body_contains("grant_type=refresh_token")
                    .body_contains("client_id=client-1")
                    .body_contains("refresh_token=rt-abc")
                    .body_contains("audience=gateway.stockx.com");
                then.status(200)
                    .json_body(json!({ "access_token": "tok-1", "expires_in": 7200 }));
            })
            .await;

        let config = config(server.url("/oauth/token"));
        let request = config.token_request().unwrap();
        let grant = HttpTokenFetcher::new().fetch_token(&request).await.unwrap();

        mock.assert_hits_async(1).await;
        assert_eq!(grant.access_token, "tok-1");
        assert_eq!(grant.expires_in, 7200);
    }

    #[tokio::test]
    async fn test_missing_expires_in_defaults_to_an_hour() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth/token");
                then.status(200).json_body(json!({ "access_token": "tok-2" }));
            })
            .await;

        let config = config(server.url("/oauth/token"));
        let grant = HttpTokenFetcher::new()
            .fetch_token(&config.token_request().unwrap())
            .await
            .unwrap();
        assert_eq!(grant.expires_in, DEFAULT_EXPIRES_IN_SECS);
    }

    #[tokio::test]
    async fn test_non_success_status_is_auth_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth/token");
                then.status(400).body("invalid_grant");
            })
            .await;

        let config = config(server.url("/oauth/token"));
        let err = HttpTokenFetcher::new()
            .fetch_token(&config.token_request().unwrap())
            .await
            .unwrap_err();
        match err {
            MarketDataError::Auth { message } => {
                assert!(message.contains("400"));
                assert!(message.contains("invalid_grant"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_response_without_token_is_auth_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth/token");
                then.status(200).json_body(json!({ "token_type": "Bearer" }));
            })
            .await;

        let config = config(server.url("/oauth/token"));
        let err = HttpTokenFetcher::new()
            .fetch_token(&config.token_request().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, MarketDataError::Auth { .. }));
    }
}
