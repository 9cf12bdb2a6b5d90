//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while talking to the marketplace or decoding its payloads.
///
/// Each variant is classified into a [`RetryClass`] via the [`retry_class`](Self::retry_class)
/// method, which determines whether the client attempts its single token-refresh retry.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// Credentials are missing, or the token endpoint refused to issue a token.
    #[error("Authentication failed: {message}")]
    Auth {
        /// What went wrong while acquiring the token
        message: String,
    },

    /// The marketplace answered 401 for the bearer token we sent.
    /// Triggers one forced token refresh and a replay of the request.
    #[error("Unauthorized: {provider}")]
    Unauthorized {
        /// The upstream that rejected the token
        provider: String,
    },

    /// The marketplace returned a non-success status other than 401,
    /// or rejected the request again after a token refresh.
    #[error("Upstream error: {provider} - {message}")]
    Upstream {
        /// The upstream that failed
        provider: String,
        /// HTTP status code, when one was received
        status: Option<u16>,
        /// Response body or failure detail
        message: String,
    },

    /// The request to the marketplace timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The upstream that timed out
        provider: String,
    },

    /// The payload does not have the structure we rely on.
    /// Raised for missing containers and unparsable series timestamps,
    /// never for a single malformed list element.
    #[error("Mapping failed: {message}")]
    Mapping {
        /// Description of the structural problem
        message: String,
    },

    /// A transport-level error occurred while communicating with the marketplace.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use repricer_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::Unauthorized { provider: "STOCKX".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::RefreshCredentials);
    ///
    /// let error = MarketDataError::Timeout { provider: "STOCKX".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Unauthorized { .. } => RetryClass::RefreshCredentials,

            Self::Auth { .. }
            | Self::Upstream { .. }
            | Self::Timeout { .. }
            | Self::Mapping { .. }
            | Self::Network(_) => RetryClass::Never,
        }
    }

    /// HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Upstream { status, .. } => *status,
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub(crate) fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping {
            message: message.into(),
        }
    }

    pub(crate) fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }
}
