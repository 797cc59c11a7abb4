use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use log2::{debug, warn};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::fetch::{ContentFetcherRef, FetchOutcome};
use super::limiter::ConcurrencyLimiter;
use super::scrape::LinkParserRef;
use super::storage::ContentStorageRef;

/// Everything a page task shares with the rest of the crawl.
/// Cheap to clone, every field is reference counted.
#[derive(Clone)]
pub struct TaskContext {
    pub fetcher: ContentFetcherRef,
    pub parser: LinkParserRef,
    pub storage: ContentStorageRef,
    pub limiter: ConcurrencyLimiter,
    /// Pages that made it to storage, across all waves
    pub pages_saved: Arc<AtomicUsize>,
    /// Fired on forced shutdown, running tasks give up and report nothing
    pub cancel: CancellationToken,
}

/// Fetch, save and (optionally) mine a single URL.
#[derive(Debug, Clone)]
pub struct CrawlTask {
    pub url: Url,
    pub depth: usize,
    pub extract_links: bool,
}

impl CrawlTask {
    pub fn new(url: Url, depth: usize, extract_links: bool) -> Self {
        Self { url, depth, extract_links }
    }

    /// Links found on the page in document order. Any failure along the way
    /// results in an empty list, nothing is raised to the caller.
    pub async fn run(self, ctx: TaskContext) -> Vec<Url> {
        let cancel = ctx.cancel.clone();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Task for {} at depth {} cancelled", self.url, self.depth);
                Vec::new()
            }
            links = self.process(&ctx) => links,
        }
    }

    async fn process(&self, ctx: &TaskContext) -> Vec<Url> {
        // held across fetch retries, save and parse
        let _permit = match ctx.limiter.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                warn!("Task for {} could not start: {}", self.url, e);
                return Vec::new();
            }
        };

        debug!("Starting task for {} at depth {}", self.url, self.depth);

        let content = match ctx.fetcher.fetch(&self.url).await {
            FetchOutcome::Content(content) => content,
            FetchOutcome::Unavailable => return Vec::new(),
        };

        if let Err(e) = ctx.storage.save(&self.url, &content, self.depth).await {
            warn!("Task failed for {}: {:#}", self.url, e);
            return Vec::new();
        }
        ctx.pages_saved.fetch_add(1, Ordering::Relaxed);

        if !self.extract_links {
            return Vec::new();
        }

        ctx.parser.extract_links(&self.url, &content)
    }
}
