use clap::{ArgAction, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::crawler::{CrawlerConfig, DEFAULT_CONCURRENCY_LIMIT};

const OUTPUT_BASE_DIR: &str = "crawled_data";
const OUTPUT_DIR_PREFIX: &str = "crawler_output_";

/// Log levels as defined in log2 crate
#[derive(Debug, Serialize, Deserialize, Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}
/// This struct is supposed to receive all program arguments while CrawlerConfig
/// describes only the crawl itself
#[derive(Parser, Debug, Serialize, Deserialize)]
#[command(author, version, about = "Bounded breadth-first web crawler", long_about = None)]
pub struct Config {
    /// The starting URL (e.g. https://example.com)
    pub seed_url: String,
    /// Maximum number of links to follow from each page
    #[arg(allow_negative_numbers = true, value_parser = parse_non_negative)]
    pub max_links_per_page: usize,
    /// Traversal depth (0 = only the seed)
    #[arg(allow_negative_numbers = true, value_parser = parse_non_negative)]
    pub max_depth: usize,
    /// true for global uniqueness, false for per-level uniqueness
    #[arg(action = ArgAction::Set, value_parser = parse_bool_strict)]
    pub is_unique: bool,
    /// Directory the pages are written to, timestamped under crawled_data/ by default
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Maximum number of pages processed at the same time
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY_LIMIT)]
    pub concurrency: usize,
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", value_enum)]
    pub log_level: LogLevel,
}

impl Config {
    pub fn from_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let seed = self.seed_url.trim();
        if seed.is_empty() {
            anyhow::bail!("seed_url must not be empty");
        }
        if !seed.starts_with("http://") && !seed.starts_with("https://") {
            anyhow::bail!("seed_url must start with http:// or https://");
        }
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be greater than 0");
        }
        Ok(())
    }

    pub fn crawler_config(&self) -> anyhow::Result<CrawlerConfig> {
        self.validate()?;
        let seed_url = Url::parse(self.seed_url.trim())
            .map_err(|e| anyhow::anyhow!("Invalid seed_url '{}': {}", self.seed_url, e))?;
        CrawlerConfig::new(seed_url, self.max_links_per_page, self.max_depth, self.is_unique)?
            .with_concurrency_limit(self.concurrency)
    }

    /// `--output-dir` if given, otherwise `crawled_data/crawler_output_<yyyyMMdd_HHmmss>`
    pub fn output_dir(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => {
                let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
                PathBuf::from(OUTPUT_BASE_DIR).join(format!("{}{}", OUTPUT_DIR_PREFIX, timestamp))
            }
        }
    }
}

fn parse_non_negative(value: &str) -> Result<usize, String> {
    let parsed: i64 = value
        .trim()
        .parse()
        .map_err(|_| "must be an integer".to_string())?;
    if parsed < 0 {
        return Err("must be non-negative".to_string());
    }
    usize::try_from(parsed).map_err(|_| "is too large".to_string())
}

fn parse_bool_strict(value: &str) -> Result<bool, String> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err("must be 'true' or 'false'".to_string())
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, clap::Error> {
        Config::try_parse_from(std::iter::once("voyager").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_arguments_valid_order() {
        let cfg = parse(&["https://example.com", "5", "2", "false"]).unwrap();
        assert_eq!(cfg.seed_url, "https://example.com");
        assert_eq!(cfg.max_links_per_page, 5);
        assert_eq!(cfg.max_depth, 2);
        assert!(!cfg.is_unique);
        assert_eq!(cfg.concurrency, DEFAULT_CONCURRENCY_LIMIT);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_requires_four_arguments() {
        assert!(parse(&["https://example.com", "5", "2"]).is_err());
    }

    #[test]
    fn test_is_unique_is_case_insensitive() {
        let cfg = parse(&["https://example.com", "1", "1", "TRUE"]).unwrap();
        assert!(cfg.is_unique);
        let cfg = parse(&["https://example.com", "1", "1", "False"]).unwrap();
        assert!(!cfg.is_unique);
        assert!(parse(&["https://example.com", "1", "1", "yes"]).is_err());
    }

    #[test]
    fn test_rejects_negative_limits() {
        assert!(parse(&["https://example.com", "-1", "2", "true"]).is_err());
        assert!(parse(&["https://example.com", "1", "-2", "true"]).is_err());
        assert!(parse(&["https://example.com", "one", "2", "true"]).is_err());
    }

    #[test]
    fn test_rejects_seed_without_http_scheme() {
        let cfg = parse(&["ftp://example.com", "1", "1", "true"]).unwrap();
        assert!(cfg.validate().is_err());
        assert!(cfg.crawler_config().is_err());
    }

    #[test]
    fn test_crawler_config_carries_arguments() {
        let cfg = parse(&["http://example.com/start", "3", "4", "true", "--concurrency", "7"]).unwrap();
        let crawler_config = cfg.crawler_config().unwrap();
        assert_eq!(crawler_config.seed_url.as_str(), "http://example.com/start");
        assert_eq!(crawler_config.max_links_per_page, 3);
        assert_eq!(crawler_config.max_depth, 4);
        assert!(crawler_config.is_unique);
        assert_eq!(crawler_config.concurrency_limit, 7);
    }

    #[test]
    fn test_default_output_dir_is_timestamped() {
        let cfg = parse(&["https://example.com", "1", "1", "true"]).unwrap();
        let dir = cfg.output_dir();
        assert!(dir.starts_with(OUTPUT_BASE_DIR));
        let name = dir.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(OUTPUT_DIR_PREFIX));

        let cfg = parse(&["https://example.com", "1", "1", "true", "-o", "out"]).unwrap();
        assert_eq!(cfg.output_dir(), PathBuf::from("out"));
    }
}
