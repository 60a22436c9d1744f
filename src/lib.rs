//! Removes every like from a YouTube account.
//!
//! [`yt_oauth::Authenticator`] produces the credential, [`api::YouTubeClient`]
//! talks to the Data API, and [`retractor::LikeRetractor`] pages through the
//! liked videos and rates each one "none".

pub mod api;
pub mod error;
pub mod retractor;

pub use api::{DEFAULT_API_ADDRESS, LikedPage, LikedVideo, LikesApi, YouTubeClient};
pub use error::{ApiError, Error};
pub use retractor::{DrainReport, LikeRetractor, PendingQueue, RetractorConfig};
