use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use tokio::sync::{Mutex, RwLock};

use super::config::CredentialConfig;
use super::fetcher::{HttpTokenFetcher, TokenFetcher};
use crate::errors::MarketDataError;

/// A bearer token together with the instant after which it must not be used.
#[derive(Clone)]
pub struct Credential {
    pub token: String,
    /// Already reduced by the configured safety buffer
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Default)]
struct CachedState {
    credential: Option<Credential>,
    /// Bumped on every successful fetch. A caller that waited on the refresh
    /// lock compares it with the value it saw before waiting.
    generation: u64,
}

/// Process-wide holder of the marketplace bearer token.
///
/// Reads of a valid token only take the read lock. Refreshes are serialized
/// behind a separate mutex so concurrent callers that find the token missing
/// or expired share a single round trip to the token endpoint.
pub struct TokenCache {
    config: CredentialConfig,
    fetcher: Arc<dyn TokenFetcher>,
    state: RwLock<CachedState>,
    refresh_lock: Mutex<()>,
}

impl TokenCache {
    pub fn new(config: CredentialConfig) -> Self {
        Self::with_fetcher(config, Arc::new(HttpTokenFetcher::new()))
    }

    pub fn with_fetcher(config: CredentialConfig, fetcher: Arc<dyn TokenFetcher>) -> Self {
        Self {
            config,
            fetcher,
            state: RwLock::new(CachedState::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Returns a usable bearer token.
    ///
    /// Without `force_refresh` a cached, unexpired token is returned as is.
    /// With it, a new token is fetched unless another caller completed a
    /// refresh while this one was waiting for the refresh lock.
    pub async fn get_token(&self, force_refresh: bool) -> Result<String, MarketDataError> {
        let observed_generation = {
            let state = self.state.read().await;
            if !force_refresh {
                if let Some(credential) = valid(&state, Utc::now()) {
                    return Ok(credential.token.clone());
                }
            }
            state.generation
        };

        let _guard = self.refresh_lock.lock().await;

        {
            let state = self.state.read().await;
            let refreshed_meanwhile = state.generation != observed_generation;
            if !force_refresh || refreshed_meanwhile {
                if let Some(credential) = valid(&state, Utc::now()) {
                    debug!("Reusing token refreshed by a concurrent caller");
                    return Ok(credential.token.clone());
                }
            }
        }

        let request = self.config.token_request()?;
        let grant = self.fetcher.fetch_token(&request).await?;

        let expires_at =
            expiry_instant(Utc::now(), grant.expires_in, self.config.expiry_buffer_secs);
        let credential = Credential {
            token: grant.access_token,
            expires_at,
        };

        let mut state = self.state.write().await;
        state.credential = Some(credential.clone());
        state.generation += 1;
        info!("Access token refreshed, valid until {}", expires_at);

        Ok(credential.token)
    }

    /// Drops the cached token. The next `get_token` always fetches.
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        if state.credential.take().is_some() {
            debug!("Cached access token invalidated");
        }
    }

    /// Snapshot of the cached credential, if any.
    pub async fn current(&self) -> Option<Credential> {
        self.state.read().await.credential.clone()
    }
}

/// Upper bound on the lifetime accepted from the token endpoint (one year).
const MAX_TOKEN_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

/// `now + expires_in - buffer`, with both inputs clamped so an absurd
/// `expires_in` cannot overflow the timestamp arithmetic.
fn expiry_instant(now: DateTime<Utc>, expires_in: i64, buffer_secs: i64) -> DateTime<Utc> {
    let lifetime = expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS);
    let buffer = buffer_secs.clamp(0, MAX_TOKEN_LIFETIME_SECS);
    Duration::try_seconds(lifetime - buffer)
        .and_then(|offset| now.checked_add_signed(offset))
        .unwrap_or(now)
}

fn valid(state: &CachedState, now: DateTime<Utc>) -> Option<&Credential> {
    state.credential.as_ref().filter(|c| c.is_valid_at(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{TokenGrant, TokenRequest};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
        expires_in: i64,
        delay_ms: u64,
    }

    impl CountingFetcher {
        fn new(expires_in: i64) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                expires_in,
                delay_ms: 0,
            }
        }

        fn slow(expires_in: i64, delay_ms: u64) -> Self {
            Self {
                delay_ms,
                ..Self::new(expires_in)
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenFetcher for CountingFetcher {
        async fn fetch_token(
            &self,
            _request: &TokenRequest<'_>,
        ) -> Result<TokenGrant, MarketDataError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
            }
            Ok(TokenGrant {
                access_token: format!("token-{}", n),
                expires_in: self.expires_in,
            })
        }
    }

    fn config() -> CredentialConfig {
        CredentialConfig {
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            refresh_token: Some("refresh".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_cached_token_is_reused() {
        let fetcher = Arc::new(CountingFetcher::new(3600));
        let cache = TokenCache::with_fetcher(config(), fetcher.clone());

        assert_eq!(cache.get_token(false).await.unwrap(), "token-1");
        assert_eq!(cache.get_token(false).await.unwrap(), "token-1");
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_expiry_includes_safety_buffer() {
        let fetcher = Arc::new(CountingFetcher::new(3600));
        let cache = TokenCache::with_fetcher(config(), fetcher);

        let before = Utc::now();
        cache.get_token(false).await.unwrap();
        let credential = cache.current().await.unwrap();

        let lower = before + Duration::seconds(3600 - 300);
        assert!(credential.expires_at >= lower);
        assert!(credential.expires_at <= Utc::now() + Duration::seconds(3600 - 300));
    }

    #[tokio::test]
    async fn test_huge_expires_in_is_clamped() {
        let fetcher = Arc::new(CountingFetcher::new(1_000_000_000_000_000));
        let cache = TokenCache::with_fetcher(config(), fetcher.clone());

        assert_eq!(cache.get_token(false).await.unwrap(), "token-1");
        let credential = cache.current().await.unwrap();
        assert!(credential.expires_at <= Utc::now() + Duration::days(366));
        assert!(credential.is_valid_at(Utc::now()));

        // Still cached on the next call.
        assert_eq!(cache.get_token(false).await.unwrap(), "token-1");
        assert_eq!(fetcher.calls(), 1);
    }

    #[test]
    fn test_negative_expires_in_expires_immediately() {
        let now = Utc::now();
        assert_eq!(expiry_instant(now, -50, 300), now - Duration::seconds(300));
        assert_eq!(expiry_instant(now, i64::MAX, i64::MIN), now + Duration::days(365));
    }

    #[tokio::test]
    async fn test_token_inside_buffer_is_refetched() {
        // Lifetime shorter than the buffer: expired as soon as it is cached.
        let fetcher = Arc::new(CountingFetcher::new(120));
        let cache = TokenCache::with_fetcher(config(), fetcher.clone());

        assert_eq!(cache.get_token(false).await.unwrap(), "token-1");
        assert_eq!(cache.get_token(false).await.unwrap(), "token-2");
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_cache() {
        let fetcher = Arc::new(CountingFetcher::new(3600));
        let cache = TokenCache::with_fetcher(config(), fetcher.clone());

        cache.get_token(false).await.unwrap();
        assert_eq!(cache.get_token(true).await.unwrap(), "token-2");
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent_and_forces_refetch() {
        let fetcher = Arc::new(CountingFetcher::new(3600));
        let cache = TokenCache::with_fetcher(config(), fetcher.clone());

        cache.invalidate().await;
        cache.get_token(false).await.unwrap();
        cache.invalidate().await;
        cache.invalidate().await;
        assert!(cache.current().await.is_none());

        assert_eq!(cache.get_token(false).await.unwrap(), "token-2");
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let fetcher = Arc::new(CountingFetcher::slow(3600, 50));
        let cache = Arc::new(TokenCache::with_fetcher(config(), fetcher.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_token(false).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "token-1");
        }
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_forced_refreshes_coalesce() {
        let fetcher = Arc::new(CountingFetcher::slow(3600, 50));
        let cache = TokenCache::with_fetcher(config(), fetcher.clone());
        cache.get_token(false).await.unwrap();

        cache.invalidate().await;
        let (a, b) = tokio::join!(cache.get_token(true), cache.get_token(true));

        assert_eq!(a.unwrap(), "token-2");
        assert_eq!(b.unwrap(), "token-2");
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_on_first_use() {
        let fetcher = Arc::new(CountingFetcher::new(3600));
        let cache = TokenCache::with_fetcher(CredentialConfig::default(), fetcher.clone());

        let err = cache.get_token(false).await.unwrap_err();
        assert!(matches!(err, MarketDataError::Auth { .. }));
        assert_eq!(fetcher.calls(), 0);
    }
}
