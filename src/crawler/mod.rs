pub mod config;
pub mod dedup;
pub mod fetch;
pub mod limiter;
pub mod normalize;
pub mod runner;
pub mod scrape;
pub mod storage;
pub mod task;


pub use config::{CrawlerConfig, CrawlerConfigRef, DEFAULT_CONCURRENCY_LIMIT, SHUTDOWN_GRACE};
pub use dedup::{ConcurrentDedup, UrlDedup, UrlDedupRef};
pub use fetch::{ContentFetcher, ContentFetcherRef, FetchOutcome, FetchPolicy, HttpFetcher};
pub use limiter::ConcurrencyLimiter;
pub use normalize::{normalize, normalize_str};
pub use runner::{build_frontier, CrawlSummary, Crawler};
pub use scrape::{construct_url, HtmlLinkParser, LinkParser, LinkParserRef};
pub use storage::{to_filename, ContentStorage, ContentStorageRef, LocalFileStorage};
pub use task::{CrawlTask, TaskContext};
