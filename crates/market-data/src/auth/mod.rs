//! Bearer-token lifecycle for the marketplace API.
//!
//! - `config` - Client credentials and token endpoint settings
//! - `fetcher` - The HTTP exchange of credentials for a token
//! - `cache` - [`TokenCache`], the single shared holder of the current token

mod cache;
mod config;
mod fetcher;

pub use cache::{Credential, TokenCache};
pub use config::{
    CredentialConfig, TokenRequest, DEFAULT_AUDIENCE, DEFAULT_EXPIRY_BUFFER_SECS,
    DEFAULT_GRANT_TYPE, DEFAULT_TOKEN_URL,
};
pub use fetcher::{HttpTokenFetcher, TokenFetcher, TokenGrant, DEFAULT_EXPIRES_IN_SECS};
