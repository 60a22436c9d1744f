//! Paginate-then-drain loop that removes every like from the account.
//!
//! The fetch phase walks the liked-videos listing page by page into a
//! [`PendingQueue`]; the drain phase pops the queue head and issues one
//! "rating=none" call per video. Every remote call is awaited before the next
//! one is issued, and configured sleeps separate consecutive page requests and
//! consecutive mutations to stay within the API quota.

use std::collections::VecDeque;
use std::time::Duration;

use crate::api::{LikedVideo, LikesApi};
use crate::error::Error;

/// Page size and delay settings of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetractorConfig {
    /// `maxResults` of each listing request
    pub page_size: u32,
    /// Sleep before every page request after the first
    pub page_delay: Duration,
    /// Sleep before every mutation after the first
    pub item_delay: Duration,
    /// Keep draining after a failed mutation instead of halting
    pub continue_on_error: bool,
}

impl Default for RetractorConfig {
    /// Ten videos per page, one page per minute, the minute spread over the page
    fn default() -> Self {
        Self {
            page_size: 10,
            page_delay: Duration::from_secs(60),
            item_delay: Duration::from_secs(60) / 10,
            continue_on_error: true,
        }
    }
}

/// Videos waiting for their like to be removed, plus the listing cursor
#[derive(Debug, Default)]
pub struct PendingQueue {
    items: VecDeque<LikedVideo>,
    next_page_token: Option<String>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, video: LikedVideo) {
        self.items.push_back(video);
    }

    pub fn pop(&mut self) -> Option<LikedVideo> {
        self.items.pop_front()
    }

    pub fn next_page_token(&self) -> Option<&str> {
        self.next_page_token.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LikedVideo> {
        self.items.iter()
    }
}

/// Outcome of a drain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Number of videos whose like was removed
    pub removed: usize,
    /// Ids whose mutation failed, in the order attempted
    pub failed: Vec<String>,
    /// Draining stopped at a failure with items still queued
    pub halted: bool,
}

pub struct LikeRetractor<A> {
    api: A,
    config: RetractorConfig,
}

impl<A: LikesApi> LikeRetractor<A> {
    pub fn new(api: A, config: RetractorConfig) -> Self {
        Self { api, config }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn config(&self) -> &RetractorConfig {
        &self.config
    }

    /// Fetch everything, then drain whatever was fetched.
    ///
    /// A failed page ends the fetch phase; the videos gathered so far are still
    /// drained.
    pub async fn run(&self) -> DrainReport {
        let mut queue = PendingQueue::new();

        if let Err(e) = self.fetch_all(&mut queue).await {
            tracing::error!("{}", e);
            tracing::warn!(
                "Continuing with the {} liked videos fetched before the error",
                queue.len()
            );
        }

        self.drain_queue(&mut queue).await
    }

    /// Append every page of liked videos to `queue` in server order.
    ///
    /// On error the pages already received stay queued and the failed page is
    /// not requested again.
    pub async fn fetch_all(&self, queue: &mut PendingQueue) -> Result<(), Error> {
        let mut first = true;

        loop {
            if !first {
                tracing::debug!(
                    "Waiting {:?} before requesting the next page",
                    self.config.page_delay
                );
                tokio::time::sleep(self.config.page_delay).await;
            }
            first = false;

            tracing::info!("Fetching liked videos...");
            let page = match self
                .api
                .list_liked(self.config.page_size, queue.next_page_token())
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    // Pagination is over; the failed cursor is not kept for a retry
                    queue.next_page_token = None;
                    return Err(Error::RemoteList(e));
                }
            };

            tracing::info!("Fetched {} liked videos.", page.items.len());
            for video in page.items {
                queue.push(video);
            }

            queue.next_page_token = page.next_page_token;
            if queue.next_page_token.is_none() {
                break;
            }
        }

        tracing::info!("Total liked videos to remove: {}", queue.len());
        Ok(())
    }

    /// Remove the like of every queued video, head first.
    ///
    /// Each video leaves the queue before its call is made, so a failed video
    /// is never offered again.
    pub async fn drain_queue(&self, queue: &mut PendingQueue) -> DrainReport {
        let mut report = DrainReport::default();
        let mut first = true;

        while let Some(video) = queue.pop() {
            if !first {
                tokio::time::sleep(self.config.item_delay).await;
            }
            first = false;

            tracing::info!("Removing like from video: {}", video.title);
            match self.api.remove_like(&video.id).await {
                Ok(()) => {
                    tracing::info!("Removed like from {}", video.id);
                    report.removed += 1;
                }
                Err(source) => {
                    let err = Error::RemoteMutation {
                        video_id: video.id.clone(),
                        source,
                    };
                    tracing::error!("{}", err);
                    report.failed.push(video.id);

                    if !self.config.continue_on_error {
                        report.halted = !queue.is_empty();
                        tracing::warn!(
                            "Stopping after failure, {} liked videos left untouched",
                            queue.len()
                        );
                        break;
                    }
                }
            }
        }

        tracing::info!(
            "All liked videos processed: {} removed, {} failed",
            report.removed,
            report.failed.len()
        );
        report
    }
}
