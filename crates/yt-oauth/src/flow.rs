use serde::Deserialize;

use crate::{OAuthConfig, OAuthError, OAuthToken, now_secs};

/// Successful answer of the token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: u64,
    #[serde(default)]
    token_type: Option<String>,
}

/// Generate PKCE verifier and challenge
pub fn generate_pkce() -> (String, String) {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use rand::Rng;
    use rand::distributions::Alphanumeric;
    use sha2::{Digest, Sha256};

    // Generate random verifier (43-128 characters) using cryptographically secure RNG
    let verifier: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();

    // Generate challenge: base64url(SHA256(verifier))
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let hash = hasher.finalize();
    let challenge = URL_SAFE_NO_PAD.encode(hash);

    (verifier, challenge)
}

/// Generate authorization URL, returning it together with the PKCE verifier
pub fn generate_auth_url(config: &OAuthConfig) -> (String, String) {
    let (verifier, challenge) = generate_pkce();

    let auth_url = format!(
        "{}?\
        client_id={}&\
        redirect_uri={}&\
        response_type=code&\
        scope={}&\
        code_challenge={}&\
        code_challenge_method=S256&\
        access_type=offline&\
        prompt=consent",
        config.auth_uri,
        urlencoding::encode(&config.client_id),
        urlencoding::encode(&config.redirect_uri),
        urlencoding::encode(&config.scope),
        urlencoding::encode(&challenge),
    );

    (auth_url, verifier)
}

async fn post_token_request(
    client: &reqwest::Client,
    config: &OAuthConfig,
    params: &[(&str, &str)],
) -> Result<TokenResponse, OAuthError> {
    let response = client.post(&config.token_uri).form(params).send().await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(OAuthError::TokenEndpoint { status, body });
    }

    serde_json::from_str(&body).map_err(|e| OAuthError::InvalidTokenResponse(e.to_string()))
}

/// Exchange authorization code for tokens
pub async fn exchange_code(
    client: &reqwest::Client,
    config: &OAuthConfig,
    code: &str,
    verifier: &str,
) -> Result<OAuthToken, OAuthError> {
    tracing::info!("Exchanging authorization code for tokens...");

    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("code", code),
        ("code_verifier", verifier),
        ("grant_type", "authorization_code"),
        ("redirect_uri", config.redirect_uri.as_str()),
    ];

    let response = post_token_request(client, config, &params).await?;
    let refresh_token = response.refresh_token.ok_or_else(|| {
        OAuthError::InvalidTokenResponse("missing refresh_token in token response".to_string())
    })?;

    let token = OAuthToken {
        access_token: response.access_token,
        refresh_token,
        token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
        expires_at: now_secs() + response.expires_in,
    };

    tracing::info!("Successfully obtained OAuth tokens");

    Ok(token)
}

/// Refresh the access token, keeping the existing refresh token
pub async fn refresh_token(
    client: &reqwest::Client,
    config: &OAuthConfig,
    current: &OAuthToken,
) -> Result<OAuthToken, OAuthError> {
    tracing::info!("Refreshing OAuth token...");

    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("refresh_token", current.refresh_token.as_str()),
        ("grant_type", "refresh_token"),
    ];

    let response = post_token_request(client, config, &params).await?;

    let token = OAuthToken {
        access_token: response.access_token,
        refresh_token: response
            .refresh_token
            .unwrap_or_else(|| current.refresh_token.clone()),
        token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
        expires_at: now_secs() + response.expires_in,
    };

    tracing::info!("OAuth token refreshed successfully");

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_token_server;
    use reqwest::StatusCode;

    #[test]
    fn pkce_challenge_matches_verifier() {
        use base64::Engine;
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;
        use sha2::{Digest, Sha256};

        let (verifier, challenge) = generate_pkce();
        assert_eq!(verifier.len(), 64);
        assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(challenge, URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes())));
    }

    #[test]
    fn auth_url_carries_scope_and_offline_access() {
        let config = OAuthConfig::new("client id".to_string(), "secret".to_string());
        let (url, verifier) = generate_auth_url(&config);

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client%20id"));
        assert!(url.contains(&format!(
            "scope={}",
            urlencoding::encode(crate::YOUTUBE_FORCE_SSL_SCOPE)
        )));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(!url.contains(&verifier));
    }

    #[tokio::test]
    async fn exchange_code_builds_token() {
        let server = spawn_token_server(StatusCode::OK).await;
        let config = server.config();

        let token = exchange_code(&reqwest::Client::new(), &config, "code-1", "verifier-1")
            .await
            .unwrap();

        assert_eq!(token.access_token, "access-from-code");
        assert_eq!(token.refresh_token, "refresh-from-code");
        assert_eq!(token.token_type, "Bearer");
        assert!(!token.is_expired());

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["grant_type"], "authorization_code");
        assert_eq!(requests[0]["code"], "code-1");
        assert_eq!(requests[0]["code_verifier"], "verifier-1");
    }

    #[tokio::test]
    async fn exchange_code_rejected_by_endpoint() {
        let server = spawn_token_server(StatusCode::BAD_REQUEST).await;

        let err = exchange_code(&reqwest::Client::new(), &server.config(), "bad", "v")
            .await
            .unwrap_err();

        match err {
            OAuthError::TokenEndpoint { status, body } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert!(body.contains("invalid_grant"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_keeps_refresh_token() {
        let server = spawn_token_server(StatusCode::OK).await;
        let current = OAuthToken {
            access_token: "stale".to_string(),
            refresh_token: "refresh-1".to_string(),
            token_type: "Bearer".to_string(),
            expires_at: 0,
        };

        let token = refresh_token(&reqwest::Client::new(), &server.config(), &current)
            .await
            .unwrap();

        assert_eq!(token.access_token, "access-refreshed");
        assert_eq!(token.refresh_token, "refresh-1");
        assert_eq!(server.requests()[0]["refresh_token"], "refresh-1");
    }
}
