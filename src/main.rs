use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use yt_like_purger::{DEFAULT_API_ADDRESS, Error, LikeRetractor, RetractorConfig, YouTubeClient};
use yt_oauth::{
    Authenticator, CodeProvider, Credential, LoopbackCodeProvider, OAUTH_CALLBACK_PORT,
    OAuthConfig, PromptCodeProvider, YOUTUBE_FORCE_SSL_SCOPE,
};

/// How the authorization code is obtained on first run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AuthMode {
    /// Paste the code shown by the consent page
    Stdin,
    /// Catch the redirect on a local callback server
    Loopback,
}

/// YouTube Like Purger - Removes the like from every video the account has liked
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the client secrets file (holds the `installed` client)
    #[arg(long, default_value = "credentials.json")]
    credentials_path: String,

    /// Path of the persisted OAuth token (created on first authorization)
    #[arg(long, default_value = "token.json")]
    token_path: String,

    /// Number of liked videos requested per page (default: 10)
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=50))]
    page_size: u32,

    /// Seconds to wait before each page request after the first (default: 60)
    #[arg(long, default_value_t = 60)]
    page_delay_secs: u64,

    /// Milliseconds to wait between two unlike calls (default: 6000)
    #[arg(long, default_value_t = 6000)]
    item_delay_ms: u64,

    /// Keep going after a failed unlike call instead of stopping
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    continue_on_error: bool,

    /// How to obtain the authorization code when no token is stored
    #[arg(long, value_enum, default_value_t = AuthMode::Stdin)]
    auth_mode: AuthMode,

    /// Port of the local callback server used with --auth-mode loopback
    #[arg(long, default_value_t = OAUTH_CALLBACK_PORT)]
    callback_port: u16,

    /// YouTube Data API address
    #[arg(long, env = "REST_API_ADDRESS", default_value = DEFAULT_API_ADDRESS)]
    api_base_url: String,
}

impl Args {
    fn retractor_config(&self) -> RetractorConfig {
        RetractorConfig {
            page_size: self.page_size,
            page_delay: Duration::from_secs(self.page_delay_secs),
            item_delay: Duration::from_millis(self.item_delay_ms),
            continue_on_error: self.continue_on_error,
        }
    }
}

async fn authenticate<P: CodeProvider>(
    config: OAuthConfig,
    token_path: &str,
    provider: P,
) -> Result<Credential, Error> {
    let authenticator = Authenticator::new(config, token_path, provider);
    Ok(authenticator.authenticate().await?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yt_like_purger=info,yt_oauth=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("Loading client secret file...");
    let config =
        OAuthConfig::from_client_secrets_file(&args.credentials_path, YOUTUBE_FORCE_SSL_SCOPE)
            .map_err(Error::from)?;

    tracing::info!("Authorizing with credentials...");
    let credential = match args.auth_mode {
        AuthMode::Stdin => {
            authenticate(config, &args.token_path, PromptCodeProvider::stdin()).await?
        }
        AuthMode::Loopback => {
            let provider = LoopbackCodeProvider::new(args.callback_port);
            let config = config.with_redirect_uri(provider.redirect_uri());
            authenticate(config, &args.token_path, provider).await?
        }
    };
    tracing::info!("Authentication successful.");

    tracing::info!("Using YouTube Data API at: {}", args.api_base_url);

    let config = args.retractor_config();
    tracing::info!(
        "Page size {}, {:?} between pages, {:?} between unlike calls, continue on error: {}",
        config.page_size,
        config.page_delay,
        config.item_delay,
        config.continue_on_error
    );

    let client = YouTubeClient::new(args.api_base_url.clone(), Arc::new(credential));
    let report = LikeRetractor::new(client, config).run().await;

    if report.halted {
        tracing::warn!("Stopped early after a failed unlike call");
    }

    Ok(())
}
