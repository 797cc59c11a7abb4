use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use log2::*;
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::config::{CrawlerConfig, CrawlerConfigRef};
use super::dedup::{UrlDedup, UrlDedupRef};
use super::fetch::ContentFetcherRef;
use super::limiter::ConcurrencyLimiter;
use super::normalize::normalize;
use super::scrape::LinkParserRef;
use super::storage::ContentStorageRef;
use super::task::{CrawlTask, TaskContext};

/// What a finished crawl reports back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Pages fetched and saved successfully
    pub pages_saved: usize,
    /// Tasks dispatched over all waves, failed ones included
    pub pages_attempted: usize,
    /// Size of the visited registry, always 0 without global uniqueness
    pub visited: usize,
    /// Deepest wave that was dispatched
    pub depth_reached: usize,
    pub elapsed: Duration,
}

/// Builds the next wave from the link lists of the previous one.
///
/// Each page contributes at most `max_links_per_page` links, taken from the
/// front of its list. The cap is applied before the dedup gate, so an already
/// visited link still uses up one slot of its page. With a gate only newly
/// admitted links are kept. The result has set semantics and keeps the order
/// in which links were first kept.
pub fn build_frontier(
    page_links: Vec<Vec<Url>>,
    max_links_per_page: usize,
    dedup: Option<&dyn UrlDedup>,
) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut next = Vec::new();

    for links in page_links {
        for link in links.into_iter().take(max_links_per_page) {
            let link = normalize(&link);
            let admitted = match dedup {
                Some(gate) => gate.visit(&link),
                None => true,
            };
            if admitted && seen.insert(link.clone()) {
                next.push(link);
            }
        }
    }

    next
}

/// Depth synchronous crawler: every wave is dispatched in full and awaited
/// before the next one is built.
pub struct Crawler {
    config: CrawlerConfigRef,
    dedup: UrlDedupRef,
    ctx: TaskContext,
    /// Stops new waves from being dispatched
    stop: CancellationToken,
    running: watch::Sender<bool>,
}

impl Crawler {
    pub fn new(
        config: CrawlerConfig,
        fetcher: ContentFetcherRef,
        parser: LinkParserRef,
        storage: ContentStorageRef,
        dedup: UrlDedupRef,
    ) -> Self {
        let ctx = TaskContext {
            fetcher,
            parser,
            storage,
            limiter: ConcurrencyLimiter::new(config.concurrency_limit),
            pages_saved: Arc::new(AtomicUsize::new(0)),
            cancel: CancellationToken::new(),
        };
        let (running, _) = watch::channel(false);

        Self {
            config: Arc::new(config),
            dedup,
            ctx,
            stop: CancellationToken::new(),
            running,
        }
    }

    pub fn pages_saved(&self) -> usize {
        self.ctx.pages_saved.load(Ordering::Relaxed)
    }

    pub async fn crawl(&self) -> CrawlSummary {
        let started = Instant::now();
        self.running.send_replace(true);

        let max_depth = self.config.max_depth;
        let seed = normalize(&self.config.seed_url);
        let mut frontier = Vec::new();
        if !self.config.is_unique || self.dedup.visit(&seed) {
            frontier.push(seed);
        }

        let mut depth = 0;
        let mut depth_reached = 0;
        let mut pages_attempted = 0;

        while depth <= max_depth && !frontier.is_empty() {
            if self.stop.is_cancelled() {
                warn!("Shutdown requested, depth {} is not dispatched", depth);
                break;
            }
            info!("Processing depth {}/{}: {} URLs", depth, max_depth, frontier.len());

            let extract_links = depth < max_depth;
            pages_attempted += frontier.len();
            depth_reached = depth;

            let page_links = self.run_wave(frontier, depth, extract_links).await;

            frontier = if extract_links {
                let gate = if self.config.is_unique {
                    Some(&*self.dedup)
                } else {
                    None
                };
                build_frontier(page_links, self.config.max_links_per_page, gate)
            } else {
                Vec::new()
            };
            depth += 1;
        }

        let pages_saved = self.pages_saved();
        info!("Crawl finished. Total pages successfully processed: {}", pages_saved);
        self.running.send_replace(false);

        CrawlSummary {
            pages_saved,
            pages_attempted,
            visited: self.dedup.size(),
            depth_reached,
            elapsed: started.elapsed(),
        }
    }

    /// Spawns one task per URL and waits for all of them. The returned lists
    /// follow dispatch order.
    async fn run_wave(&self, frontier: Vec<Url>, depth: usize, extract_links: bool) -> Vec<Vec<Url>> {
        let mut handles = Vec::with_capacity(frontier.len());
        for url in frontier {
            let task = CrawlTask::new(url, depth, extract_links);
            handles.push(tokio::spawn(task.run(self.ctx.clone())));
        }

        let mut page_links = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(links) => page_links.push(links),
                Err(e) => {
                    warn!("Failed to get results from a task at depth {}: {}", depth, e);
                    page_links.push(Vec::new());
                }
            }
        }

        debug!(
            "Depth {} done, {} permits free",
            depth,
            self.ctx.limiter.available()
        );
        page_links
    }

    /// Stops dispatching new waves and gives the running one `grace` to
    /// finish. Whatever is still running afterwards is cancelled.
    pub async fn shutdown(&self, grace: Duration) {
        self.stop.cancel();

        let mut running = self.running.subscribe();
        let finished = timeout(grace, running.wait_for(|active| !*active))
            .await
            .is_ok();

        if finished {
            debug!("Crawler stopped");
        } else {
            warn!("Crawl did not finish within {:?}, cancelling outstanding tasks", grace);
            self.ctx.cancel.cancel();
        }
    }
}
