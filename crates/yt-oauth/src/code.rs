use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    extract::Query,
    response::{Html, IntoResponse},
    routing::get,
};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

use crate::{OAUTH_CALLBACK_PORT, OAuthError};

/// Source of the one-time authorization code the user obtains from the consent page
#[async_trait]
pub trait CodeProvider: Send + Sync {
    /// Present `auth_url` to the user and return the authorization code
    async fn authorization_code(&self, auth_url: &str) -> Result<String, OAuthError>;
}

/// Prints the authorization URL and reads the code as one line of input
pub struct PromptCodeProvider<R> {
    reader: Mutex<R>,
}

impl PromptCodeProvider<BufReader<Stdin>> {
    /// Prompt on the console
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> PromptCodeProvider<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(reader),
        }
    }
}

#[async_trait]
impl<R> CodeProvider for PromptCodeProvider<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn authorization_code(&self, auth_url: &str) -> Result<String, OAuthError> {
        println!("Authorize this app by visiting this url: {}", auth_url);
        print!("Enter the code from that page here: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        self.reader.lock().await.read_line(&mut line).await?;

        let code = line.trim();
        if code.is_empty() {
            return Err(OAuthError::Authorization(
                "no authorization code entered".to_string(),
            ));
        }
        Ok(code.to_string())
    }
}

/// Receives the code through a temporary local callback server
#[derive(Debug, Clone)]
pub struct LoopbackCodeProvider {
    port: u16,
    timeout: Duration,
}

impl Default for LoopbackCodeProvider {
    fn default() -> Self {
        Self::new(OAUTH_CALLBACK_PORT)
    }
}

#[derive(Deserialize)]
struct AuthCallback {
    code: Option<String>,
    error: Option<String>,
}

type CallbackSlot = Arc<Mutex<Option<Result<String, String>>>>;

impl LoopbackCodeProvider {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Redirect URI the consent page must send the browser back to
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/oauth2callback", self.port)
    }

    fn router(slot: CallbackSlot) -> Router {
        let callback_handler = move |Query(params): Query<AuthCallback>| async move {
            if let Some(error) = params.error {
                let page = format!(
                    "<html><body><h1>Authorization Failed</h1><p>Error: {}</p>\
                    <p>You can close this window.</p></body></html>",
                    error
                );
                *slot.lock().await = Some(Err(error));
                return Html(page).into_response();
            }

            if let Some(code) = params.code {
                *slot.lock().await = Some(Ok(code));
                return Html(
                    "<html><body><h1>Authorization Successful!</h1>\
                    <p>You can close this window and return to the application.</p></body></html>",
                )
                .into_response();
            }

            Html("<html><body><h1>Authorization Failed</h1><p>No code received</p></body></html>")
                .into_response()
        };

        Router::new().route("/oauth2callback", get(callback_handler))
    }

    async fn wait_for_code(
        &self,
        listener: tokio::net::TcpListener,
    ) -> Result<String, OAuthError> {
        let slot = CallbackSlot::default();
        let server = axum::serve(listener, Self::router(slot.clone()));
        let server_handle = tokio::spawn(async move {
            server.await.ok();
        });

        let start = tokio::time::Instant::now();
        let outcome = loop {
            if start.elapsed() > self.timeout {
                break Err(OAuthError::Authorization(format!(
                    "timed out after {} seconds waiting for the OAuth callback",
                    self.timeout.as_secs()
                )));
            }

            if let Some(result) = slot.lock().await.take() {
                break result.map_err(OAuthError::Authorization);
            }

            tokio::time::sleep(Duration::from_millis(500)).await;
        };

        server_handle.abort();
        outcome
    }
}

#[async_trait]
impl CodeProvider for LoopbackCodeProvider {
    async fn authorization_code(&self, auth_url: &str) -> Result<String, OAuthError> {
        println!("\n=================================================");
        println!("OAuth 2.0 Authorization Required");
        println!("=================================================");
        println!("\nPlease visit the following URL to authorize the application:\n");
        println!("{}\n", auth_url);
        println!("Waiting for authorization...");
        println!("=================================================\n");

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", self.port)).await?;
        self.wait_for_code(listener).await
    }
}
