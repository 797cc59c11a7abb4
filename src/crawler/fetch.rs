use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;
use async_trait::async_trait;
use log2::{debug, error, warn};
use rand::Rng;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{redirect, Client, StatusCode};
use tokio::time::sleep;
use url::Url;

/// Attempts made for a single URL before it is dropped
pub const MAX_RETRIES: usize = 3;
/// Politeness delay before the first attempt, jitter is added on top
pub const BASE_DELAY_MS: u64 = 50;
pub const JITTER_MS: u64 = 100;
/// Retry `n` waits `2^n` times this
pub const BACKOFF_UNIT_MS: u64 = 500;
pub const REQUEST_TIMEOUT_SEC: u64 = 15;
pub const CONNECT_TIMEOUT_SEC: u64 = 10;
const MAX_REDIRECTS: usize = 10;
const USER_AGENT: &str = "VoyagerCrawler/1.0";

/// Result of fetching one page. Fetching never fails loudly, a page is either
/// there or it is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Content(String),
    Unavailable,
}

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> FetchOutcome;
}

pub type ContentFetcherRef = Arc<dyn ContentFetcher>;

/// Timing knobs of [`HttpFetcher`]
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub jitter_ms: u64,
    pub backoff_unit_ms: u64,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            base_delay_ms: BASE_DELAY_MS,
            jitter_ms: JITTER_MS,
            backoff_unit_ms: BACKOFF_UNIT_MS,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SEC),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SEC),
        }
    }
}

impl FetchPolicy {
    /// Same attempt budget and timeouts, but no sleeping between attempts
    pub fn without_delays(self) -> Self {
        Self {
            base_delay_ms: 0,
            jitter_ms: 0,
            backoff_unit_ms: 0,
            ..self
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Pause taken before `attempt` (0 based)
    pub fn delay_before(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            let jitter = rand::rng().random_range(0..=self.jitter_ms);
            Duration::from_millis(self.base_delay_ms + jitter)
        } else {
            let factor = 1u64.checked_shl(attempt as u32).unwrap_or(u64::MAX);
            Duration::from_millis(self.backoff_unit_ms.saturating_mul(factor))
        }
    }
}

enum Attempt {
    Done(FetchOutcome),
    Retry,
}

/// Fetcher backed by a pooled reqwest client. Redirects are followed.
pub struct HttpFetcher {
    client: Client,
    policy: FetchPolicy,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_policy(FetchPolicy::default())
    }

    pub fn with_policy(policy: FetchPolicy) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(policy.connect_timeout)
            .timeout(policy.request_timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client, policy })
    }

    async fn attempt(&self, url: &Url) -> Attempt {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Error fetching {}: {}", url, e);
                return Attempt::Retry;
            }
        };

        let status = response.status();
        if status.is_success() {
            if !is_html(response.headers().get(CONTENT_TYPE)) {
                debug!("Skipping non-html content at {}", url);
                return Attempt::Done(FetchOutcome::Unavailable);
            }
            return match response.text().await {
                Ok(body) => Attempt::Done(FetchOutcome::Content(body)),
                Err(e) => {
                    warn!("Error reading body of {}: {}", url, e);
                    Attempt::Retry
                }
            };
        }

        if is_retryable(status) {
            warn!("Fetch failed for {}. Status code: {}. Retrying...", url, status.as_u16());
            Attempt::Retry
        } else {
            warn!("Fetch failed for {}. Status code: {}. Giving up.", url, status.as_u16());
            Attempt::Done(FetchOutcome::Unavailable)
        }
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        for attempt in 0..self.policy.max_attempts {
            sleep(self.policy.delay_before(attempt)).await;
            match self.attempt(url).await {
                Attempt::Done(outcome) => return outcome,
                Attempt::Retry => continue,
            }
        }
        error!("Dropping URL after {} attempts: {}", self.policy.max_attempts, url);
        FetchOutcome::Unavailable
    }
}

/// Statuses worth another try: rate limiting and transient server trouble
pub fn is_retryable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
    )
}

/// A missing Content-Type is given the benefit of the doubt
fn is_html(content_type: Option<&HeaderValue>) -> bool {
    match content_type {
        None => true,
        Some(value) => value
            .to_str()
            .map(|v| v.to_ascii_lowercase().contains("text/html"))
            .unwrap_or(false),
    }
}
