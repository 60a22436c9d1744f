//! Error kinds of the like-retraction pipeline.

use thiserror::Error;
use yt_oauth::OAuthError;

/// Failure of a single call to the YouTube Data API
#[derive(Error, Debug)]
pub enum ApiError {
    /// The API answered with a non-success status.
    #[error("API returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// No usable access token could be obtained.
    #[error("failed to obtain access token: {0}")]
    Auth(#[from] OAuthError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Pipeline-level error
#[derive(Error, Debug)]
pub enum Error {
    /// The client secrets file is missing or unreadable.
    #[error("configuration error: {0}")]
    Configuration(#[source] OAuthError),

    /// The authorization code could not be obtained or exchanged.
    #[error("authorization failed: {0}")]
    Auth(#[source] OAuthError),

    /// A page of liked videos could not be fetched.
    #[error("failed to list liked videos: {0}")]
    RemoteList(#[source] ApiError),

    /// Removing the like from one video failed.
    #[error("failed to remove like from video '{video_id}': {source}")]
    RemoteMutation {
        video_id: String,
        #[source]
        source: ApiError,
    },
}

impl From<OAuthError> for Error {
    fn from(err: OAuthError) -> Self {
        if err.is_configuration() {
            Self::Configuration(err)
        } else {
            Self::Auth(err)
        }
    }
}
