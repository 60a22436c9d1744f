//! OAuth 2.0 support for the YouTube Data API.
//!
//! Loads the client identity from a Google "installed app" secrets file,
//! reuses a persisted token when one exists and otherwise runs an
//! authorization-code exchange through a pluggable [`CodeProvider`].

mod authenticator;
mod code;
mod error;
mod flow;
#[cfg(test)]
mod test_support;

pub use authenticator::{Authenticator, Credential};
pub use code::{CodeProvider, LoopbackCodeProvider, PromptCodeProvider};
pub use error::OAuthError;
pub use flow::{exchange_code, generate_auth_url, generate_pkce, refresh_token};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default OAuth callback port
pub const OAUTH_CALLBACK_PORT: u16 = 8080;

/// Scope required to change the rating of a video
pub const YOUTUBE_FORCE_SSL_SCOPE: &str = "https://www.googleapis.com/auth/youtube.force-ssl";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Seconds since the Unix epoch
pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// OAuth 2.0 token information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    /// Access token for API requests
    pub access_token: String,
    /// Refresh token for getting new access tokens
    pub refresh_token: String,
    /// Token type (usually "Bearer")
    pub token_type: String,
    /// Expiry time as Unix timestamp (seconds since epoch)
    pub expires_at: u64,
}

impl OAuthToken {
    /// Check if the token is expired or will expire soon (within 60 seconds)
    pub fn is_expired(&self) -> bool {
        now_secs() + 60 >= self.expires_at
    }

    /// Load token from file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, OAuthError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| OAuthError::token_file(path, format!("failed to read: {}", e)))?;
        serde_json::from_str(&content)
            .map_err(|e| OAuthError::token_file(path, format!("failed to parse: {}", e)))
    }

    /// Load token from file, returning `None` when the file does not exist
    pub fn load_if_present(path: impl AsRef<Path>) -> Result<Option<Self>, OAuthError> {
        let path = path.as_ref();
        match std::fs::metadata(path) {
            Ok(_) => Self::load_from_file(path).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(OAuthError::token_file(path, e.to_string())),
        }
    }

    /// Save token to file with secure permissions
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), OAuthError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| OAuthError::token_file(path, e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| OAuthError::token_file(path, format!("failed to write: {}", e)))?;

        // Owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, permissions).map_err(|e| {
                OAuthError::token_file(path, format!("failed to set permissions: {}", e))
            })?;
        }

        Ok(())
    }
}

/// OAuth configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Redirect URI for OAuth callback
    pub redirect_uri: String,
    /// OAuth scope(s)
    pub scope: String,
    /// Authorization endpoint the user is sent to
    pub auth_uri: String,
    /// Token endpoint used for code exchange and refresh
    pub token_uri: String,
}

/// Layout of a Google client secrets file (`credentials.json`)
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

#[derive(Debug, Deserialize)]
struct ClientSecrets {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

impl OAuthConfig {
    /// Create new OAuth configuration with YouTube defaults
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri: format!("http://localhost:{}/oauth2callback", OAUTH_CALLBACK_PORT),
            scope: YOUTUBE_FORCE_SSL_SCOPE.to_string(),
            auth_uri: DEFAULT_AUTH_URI.to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
        }
    }

    /// Load the client identity from a client secrets file.
    ///
    /// The file must hold an `installed` (or `web`) object. The first entry
    /// of `redirect_uris` becomes the redirect URI; the endpoints fall back to
    /// Google's when the file omits them.
    pub fn from_client_secrets_file(
        path: impl AsRef<Path>,
        scope: impl Into<String>,
    ) -> Result<Self, OAuthError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| OAuthError::configuration(path, e.to_string()))?;
        let file: ClientSecretsFile = serde_json::from_str(&content)
            .map_err(|e| OAuthError::configuration(path, e.to_string()))?;
        let secrets = file.installed.or(file.web).ok_or_else(|| {
            OAuthError::configuration(path, "missing 'installed' client section")
        })?;

        let mut config = Self::new(secrets.client_id, secrets.client_secret);
        config.scope = scope.into();
        if let Some(redirect_uri) = secrets.redirect_uris.into_iter().next() {
            config.redirect_uri = redirect_uri;
        }
        if let Some(auth_uri) = secrets.auth_uri {
            config.auth_uri = auth_uri;
        }
        if let Some(token_uri) = secrets.token_uri {
            config.token_uri = token_uri;
        }
        Ok(config)
    }

    /// Replace the redirect URI (the loopback flow needs its own callback)
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }
}
