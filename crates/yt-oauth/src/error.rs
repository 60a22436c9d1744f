use std::path::Path;

use thiserror::Error;

/// Errors produced while loading client identity or obtaining tokens
#[derive(Error, Debug)]
pub enum OAuthError {
    /// The client secrets file is missing, unreadable or malformed.
    #[error("Failed to load client secrets file '{path}': {message}")]
    Configuration { path: String, message: String },

    /// No authorization code could be obtained from the user.
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// The token endpoint rejected a code exchange or refresh.
    #[error("Token endpoint returned status {status}: {body}")]
    TokenEndpoint {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The token endpoint answered 2xx with an unusable body.
    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    /// Reading or writing the persisted token failed.
    #[error("OAuth token file '{path}': {message}")]
    TokenFile { path: String, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl OAuthError {
    pub(crate) fn configuration(path: &Path, message: impl Into<String>) -> Self {
        Self::Configuration {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn token_file(path: &Path, message: impl Into<String>) -> Self {
        Self::TokenFile {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    /// Whether this error stems from local configuration rather than the exchange
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}
