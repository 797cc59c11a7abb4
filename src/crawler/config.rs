use std::sync::Arc;
use std::time::Duration;
use anyhow::{bail, Result};
use url::Url;

/// Default number of simultaneously active page tasks
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 50;
/// How long shutdown waits for outstanding work before cancelling it
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(60);

/// Configuration of a single crawl. Built once and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub seed_url: Url,
    /// How many extracted links of each page may enter the next wave
    pub max_links_per_page: usize,
    /// Last depth that is fetched, the seed lives at depth 0
    pub max_depth: usize,
    /// Global uniqueness: a URL is fetched at most once per crawl
    pub is_unique: bool,
    pub concurrency_limit: usize,
}

impl CrawlerConfig {
    pub fn new(seed_url: Url, max_links_per_page: usize, max_depth: usize, is_unique: bool) -> Result<Self> {
        if !matches!(seed_url.scheme(), "http" | "https") {
            bail!("seed url must use http or https, got {}", seed_url.scheme());
        }
        if seed_url.host().is_none() {
            bail!("seed url {} has no host", seed_url);
        }
        Ok(Self {
            seed_url,
            max_links_per_page,
            max_depth,
            is_unique,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
        })
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Result<Self> {
        if limit == 0 {
            bail!("concurrency limit must be greater than 0");
        }
        self.concurrency_limit = limit;
        Ok(self)
    }
}

pub type CrawlerConfigRef = Arc<CrawlerConfig>;
