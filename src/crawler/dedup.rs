use std::sync::Arc;
use dashmap::DashSet;
use url::Url;

/// Admission control for the frontier.
pub trait UrlDedup: Send + Sync {
    /// Marks `url` as visited. Returns `true` only for the first caller,
    /// every later call for the same URL returns `false`.
    fn visit(&self, url: &Url) -> bool;

    /// Number of distinct URLs visited so far
    fn size(&self) -> usize;
}

/// Visited registry shared by every task of a crawl.
/// Expects already normalized URLs and never forgets an entry.
#[derive(Debug, Default)]
pub struct ConcurrentDedup {
    visited: DashSet<String>,
}

impl ConcurrentDedup {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UrlDedup for ConcurrentDedup {
    fn visit(&self, url: &Url) -> bool {
        // DashSet::insert locks the owning shard, so test and set happen together
        self.visited.insert(url.as_str().to_owned())
    }

    fn size(&self) -> usize {
        self.visited.len()
    }
}

pub type UrlDedupRef = Arc<dyn UrlDedup>;
