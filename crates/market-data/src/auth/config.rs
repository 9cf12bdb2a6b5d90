use crate::errors::MarketDataError;

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.stockx.com/oauth/token";
pub const DEFAULT_GRANT_TYPE: &str = "refresh_token";
pub const DEFAULT_AUDIENCE: &str = "gateway.stockx.com";

/// Seconds subtracted from the server-reported lifetime before a token is
/// treated as expired.
pub const DEFAULT_EXPIRY_BUFFER_SECS: i64 = 300;

/// Client credentials for the OAuth token endpoint.
///
/// Secret fields are optional here: a missing value is reported as an
/// [`MarketDataError::Auth`] on the first token fetch, not at construction.
#[derive(Clone)]
pub struct CredentialConfig {
    pub token_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub grant_type: String,
    pub audience: String,
    pub expiry_buffer_secs: i64,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            token_url: DEFAULT_TOKEN_URL.to_string(),
            client_id: None,
            client_secret: None,
            refresh_token: None,
            grant_type: DEFAULT_GRANT_TYPE.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            expiry_buffer_secs: DEFAULT_EXPIRY_BUFFER_SECS,
        }
    }
}

// Secrets stay out of debug output.
impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id.as_ref().map(|_| "<set>"))
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<set>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<set>"))
            .field("grant_type", &self.grant_type)
            .field("audience", &self.audience)
            .field("expiry_buffer_secs", &self.expiry_buffer_secs)
            .finish()
    }
}

/// The complete set of values sent to the token endpoint.
pub struct TokenRequest<'a> {
    pub token_url: &'a str,
    pub grant_type: &'a str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub audience: &'a str,
    pub refresh_token: &'a str,
}

impl CredentialConfig {
    /// Checks that every required credential is present.
    pub fn token_request(&self) -> Result<TokenRequest<'_>, MarketDataError> {
        let mut missing = Vec::new();
        if is_blank(&self.client_id) {
            missing.push("client_id");
        }
        if is_blank(&self.client_secret) {
            missing.push("client_secret");
        }
        if is_blank(&self.refresh_token) {
            missing.push("refresh_token");
        }
        if !missing.is_empty() {
            return Err(MarketDataError::auth(format!(
                "Missing credentials: {}",
                missing.join(", ")
            )));
        }

        Ok(TokenRequest {
            token_url: &self.token_url,
            grant_type: &self.grant_type,
            client_id: self.client_id.as_deref().unwrap_or_default(),
            client_secret: self.client_secret.as_deref().unwrap_or_default(),
            audience: &self.audience,
            refresh_token: self.refresh_token.as_deref().unwrap_or_default(),
        })
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).map_or(true, str::is_empty)
}
