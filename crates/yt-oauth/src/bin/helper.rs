use clap::Parser;
use yt_oauth::{
    Authenticator, LoopbackCodeProvider, OAUTH_CALLBACK_PORT, OAuthConfig, PromptCodeProvider,
    YOUTUBE_FORCE_SSL_SCOPE,
};

/// OAuth 2.0 helper tool for YouTube API authentication
///
/// Always runs a fresh authorization and overwrites the token file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the client secrets file downloaded from the Google console
    #[arg(long, default_value = "credentials.json")]
    credentials_path: String,

    /// Path to save the OAuth token file
    #[arg(long, default_value = "token.json")]
    token_path: String,

    /// Receive the code through a local callback server instead of pasting it
    #[arg(long)]
    loopback: bool,

    /// Port of the local callback server used with --loopback
    #[arg(long, default_value_t = OAUTH_CALLBACK_PORT)]
    callback_port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yt_oauth=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config =
        OAuthConfig::from_client_secrets_file(&args.credentials_path, YOUTUBE_FORCE_SSL_SCOPE)?;

    let credential = if args.loopback {
        let provider = LoopbackCodeProvider::new(args.callback_port);
        let config = config.with_redirect_uri(provider.redirect_uri());
        Authenticator::new(config, &args.token_path, provider)
            .authorize()
            .await?
    } else {
        Authenticator::new(config, &args.token_path, PromptCodeProvider::stdin())
            .authorize()
            .await?
    };

    // authorize() only logs a failed write; the helper exists to produce the file
    credential.token().await.save_to_file(&args.token_path)?;

    eprintln!("\nOAuth token saved to: {}", args.token_path);
    eprintln!("You can now use this token with yt-like-purger");

    Ok(())
}
