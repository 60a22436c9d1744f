//! Access to the liked-videos collection of the authenticated account.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use yt_oauth::Credential;

use crate::error::ApiError;

/// Default YouTube Data API address
pub const DEFAULT_API_ADDRESS: &str = "https://www.googleapis.com";

/// A video the account has liked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikedVideo {
    pub id: String,
    pub title: String,
}

/// One page of the liked-videos listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikedPage {
    pub items: Vec<LikedVideo>,
    /// Continuation cursor; `None` on the last page
    pub next_page_token: Option<String>,
}

/// Remote operations the retraction pipeline needs
#[async_trait]
pub trait LikesApi: Send + Sync {
    /// List one page of videos rated "like"
    async fn list_liked(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<LikedPage, ApiError>;

    /// Set the rating of `video_id` to "none"
    async fn remove_like(&self, video_id: &str) -> Result<(), ApiError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<Video>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Video {
    id: String,
    snippet: Option<VideoSnippet>,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    #[serde(default)]
    title: String,
}

impl From<Video> for LikedVideo {
    fn from(video: Video) -> Self {
        Self {
            id: video.id,
            title: video.snippet.map(|s| s.title).unwrap_or_default(),
        }
    }
}

/// YouTube Data API v3 REST client authorized by an OAuth credential
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
    credential: Arc<Credential>,
}

impl YouTubeClient {
    pub fn new(base_url: impl Into<String>, credential: Arc<Credential>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            return Err(ApiError::Status { status, body });
        }
        Ok(response)
    }
}

#[async_trait]
impl LikesApi for YouTubeClient {
    async fn list_liked(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<LikedPage, ApiError> {
        let access_token = self.credential.access_token().await?;

        let mut query = vec![
            ("part", "id,snippet".to_string()),
            ("myRating", "like".to_string()),
            ("maxResults", page_size.to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        let response = self
            .http
            .get(format!("{}/youtube/v3/videos", self.base_url))
            .bearer_auth(access_token)
            .query(&query)
            .send()
            .await?;

        let body: VideoListResponse = Self::check_status(response).await?.json().await?;

        Ok(LikedPage {
            items: body.items.into_iter().map(LikedVideo::from).collect(),
            next_page_token: body.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn remove_like(&self, video_id: &str) -> Result<(), ApiError> {
        let access_token = self.credential.access_token().await?;

        let response = self
            .http
            .post(format!("{}/youtube/v3/videos/rate", self.base_url))
            .bearer_auth(access_token)
            .query(&[("id", video_id), ("rating", "none")])
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(())
    }
}
