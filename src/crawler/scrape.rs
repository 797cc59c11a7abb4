use std::collections::HashSet;
use std::sync::Arc;
use anyhow::{anyhow, Result};
use log2::debug;
use scraper::{Html, Selector};
use url::Url;

use super::normalize::normalize;

/// Pulls outbound links out of a fetched page.
pub trait LinkParser: Send + Sync {
    /// Absolute, fragment free http(s) links of `html` in document order,
    /// each link reported once. Never fails, a broken page yields fewer links.
    fn extract_links(&self, base_url: &Url, html: &str) -> Vec<Url>;
}

pub type LinkParserRef = Arc<dyn LinkParser>;

/// If `href` is a full URL, returns it as-is. Otherwise resolves it against
/// `base_url`. The result is normalized, only http and https survive.
pub fn construct_url(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let url = match Url::parse(href) {
        Ok(parsed_url) if parsed_url.has_host() => parsed_url,
        _ => base_url.join(href).ok()?,
    };
    match url.scheme() {
        "http" | "https" => Some(normalize(&url)),
        _ => None,
    }
}

/// [`LinkParser`] over `<a href>` elements, backed by scraper.
pub struct HtmlLinkParser {
    anchors: Selector,
}

impl HtmlLinkParser {
    pub fn new() -> Result<Self> {
        let anchors = Selector::parse("a[href]")
            .map_err(|e| anyhow!("Failed to parse <a> selector: {}", e))?;
        Ok(Self { anchors })
    }
}

impl LinkParser for HtmlLinkParser {
    fn extract_links(&self, base_url: &Url, html: &str) -> Vec<Url> {
        let document = Html::parse_document(html);

        let mut seen = HashSet::new();
        let mut found_urls = Vec::new();
        for element in document.select(&self.anchors) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            match construct_url(href, base_url) {
                Some(url) => {
                    if seen.insert(url.clone()) {
                        found_urls.push(url);
                    }
                }
                None => debug!("Skipped link {:?} on {}", href, base_url),
            }
        }

        debug!("Found {} urls on page {}", found_urls.len(), base_url);
        found_urls
    }
}
