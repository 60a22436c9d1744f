use std::path::PathBuf;

use tokio::sync::Mutex;

use crate::flow::{exchange_code, generate_auth_url, refresh_token};
use crate::{CodeProvider, OAuthConfig, OAuthError, OAuthToken};

/// Authorized client identity handed to API clients
#[derive(Debug)]
pub struct Credential {
    config: OAuthConfig,
    token: Mutex<OAuthToken>,
    http: reqwest::Client,
}

impl Credential {
    pub fn new(config: OAuthConfig, token: OAuthToken) -> Self {
        Self {
            config,
            token: Mutex::new(token),
            http: reqwest::Client::new(),
        }
    }

    /// Snapshot of the current token
    pub async fn token(&self) -> OAuthToken {
        self.token.lock().await.clone()
    }

    /// Get valid access token, refreshing if necessary
    pub async fn access_token(&self) -> Result<String, OAuthError> {
        let mut token = self.token.lock().await;

        if token.is_expired() {
            tracing::info!("Access token expired, refreshing...");
            *token = refresh_token(&self.http, &self.config, &token).await?;
        }

        Ok(token.access_token.clone())
    }
}

/// Produces a [`Credential`] from a persisted token or an interactive exchange
pub struct Authenticator<P> {
    config: OAuthConfig,
    token_path: PathBuf,
    provider: P,
    http: reqwest::Client,
}

impl<P: CodeProvider> Authenticator<P> {
    pub fn new(config: OAuthConfig, token_path: impl Into<PathBuf>, provider: P) -> Self {
        Self {
            config,
            token_path: token_path.into(),
            provider,
            http: reqwest::Client::new(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Reuse the persisted token when it can be read, otherwise authorize.
    ///
    /// The persisted token's expiry is not checked here; [`Credential::access_token`]
    /// refreshes it on first use.
    pub async fn authenticate(&self) -> Result<Credential, OAuthError> {
        tracing::info!("Checking for existing token...");
        match OAuthToken::load_if_present(&self.token_path) {
            Ok(Some(token)) => {
                tracing::info!("Using existing token.");
                return Ok(Credential::new(self.config.clone(), token));
            }
            Ok(None) => tracing::info!("Token not found. Generating a new one..."),
            Err(e) => tracing::warn!("Ignoring unusable token file: {}", e),
        }

        self.authorize().await
    }

    /// Run the authorization-code exchange and persist the resulting token.
    ///
    /// Failing to write the token file is logged; the credential is still
    /// returned for the current run.
    pub async fn authorize(&self) -> Result<Credential, OAuthError> {
        let (auth_url, verifier) = generate_auth_url(&self.config);
        let code = self.provider.authorization_code(&auth_url).await?;
        let token = exchange_code(&self.http, &self.config, &code, &verifier).await?;

        match token.save_to_file(&self.token_path) {
            Ok(()) => tracing::info!("Token stored to {}", self.token_path.display()),
            Err(e) => tracing::error!("Failed to store token: {}", e),
        }

        Ok(Credential::new(self.config.clone(), token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_token_server;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Hands out a fixed code and counts how often it was asked
    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CodeProvider for CountingProvider {
        async fn authorization_code(&self, auth_url: &str) -> Result<String, OAuthError> {
            assert!(auth_url.contains("scope="));
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("code-from-user".to_string())
        }
    }

    fn persisted_token() -> OAuthToken {
        OAuthToken {
            access_token: "persisted-access".to_string(),
            refresh_token: "persisted-refresh".to_string(),
            token_type: "Bearer".to_string(),
            expires_at: crate::now_secs() + 3600,
        }
    }

    #[tokio::test]
    async fn existing_token_skips_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token.json");
        persisted_token().save_to_file(&token_path).unwrap();

        let config = OAuthConfig::new("client-1".to_string(), "secret-1".to_string());
        let authenticator = Authenticator::new(config, &token_path, CountingProvider::new());

        let credential = authenticator.authenticate().await.unwrap();
        assert_eq!(authenticator.provider().calls(), 0);
        assert_eq!(credential.token().await, persisted_token());
    }

    #[tokio::test]
    async fn expired_persisted_token_is_still_reused() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token.json");
        let mut token = persisted_token();
        token.expires_at = 0;
        token.save_to_file(&token_path).unwrap();

        let config = OAuthConfig::new("client-1".to_string(), "secret-1".to_string());
        let authenticator = Authenticator::new(config, &token_path, CountingProvider::new());

        authenticator.authenticate().await.unwrap();
        assert_eq!(authenticator.provider().calls(), 0);
    }

    #[tokio::test]
    async fn missing_token_prompts_once_and_persists() {
        let server = spawn_token_server(StatusCode::OK).await;
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token.json");

        let authenticator = Authenticator::new(server.config(), &token_path, CountingProvider::new());
        let credential = authenticator.authenticate().await.unwrap();

        assert_eq!(authenticator.provider().calls(), 1);
        assert_eq!(server.requests()[0]["code"], "code-from-user");

        let exchanged = credential.token().await;
        assert_eq!(exchanged.access_token, "access-from-code");
        assert_eq!(OAuthToken::load_from_file(&token_path).unwrap(), exchanged);
    }

    #[tokio::test]
    async fn unparseable_token_file_triggers_authorization() {
        let server = spawn_token_server(StatusCode::OK).await;
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token.json");
        std::fs::write(&token_path, "{}").unwrap();

        let authenticator = Authenticator::new(server.config(), &token_path, CountingProvider::new());
        authenticator.authenticate().await.unwrap();

        assert_eq!(authenticator.provider().calls(), 1);
        assert!(OAuthToken::load_from_file(&token_path).is_ok());
    }

    #[tokio::test]
    async fn failed_exchange_writes_no_token() {
        let server = spawn_token_server(StatusCode::BAD_REQUEST).await;
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token.json");

        let authenticator = Authenticator::new(server.config(), &token_path, CountingProvider::new());
        let err = authenticator.authenticate().await.unwrap_err();

        assert!(matches!(err, OAuthError::TokenEndpoint { .. }));
        assert!(!err.is_configuration());
        assert!(!token_path.exists());
    }

    #[tokio::test]
    async fn token_write_failure_is_not_fatal() {
        let server = spawn_token_server(StatusCode::OK).await;
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("missing-dir").join("token.json");

        let authenticator = Authenticator::new(server.config(), &token_path, CountingProvider::new());
        let credential = authenticator.authenticate().await.unwrap();

        assert_eq!(credential.token().await.access_token, "access-from-code");
        assert!(!token_path.exists());
    }

    #[tokio::test]
    async fn access_token_refreshes_when_expired() {
        let server = spawn_token_server(StatusCode::OK).await;
        let mut token = persisted_token();
        token.expires_at = 0;

        let credential = Credential::new(server.config(), token);
        assert_eq!(credential.access_token().await.unwrap(), "access-refreshed");
        assert_eq!(credential.token().await.refresh_token, "persisted-refresh");

        // Fresh token is served without another round trip
        assert_eq!(credential.access_token().await.unwrap(), "access-refreshed");
        assert_eq!(server.requests().len(), 1);
    }
}
