use log2::*;
use anyhow::{Context, Result};
use clap::CommandFactory;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use voyager::config::Config;
use voyager::crawler::{
    ConcurrentDedup, CrawlSummary, Crawler, CrawlerConfig, HtmlLinkParser, HttpFetcher,
    LocalFileStorage, SHUTDOWN_GRACE,
};

/// Indicates start time of a project, lazily initialized
pub static START_TIME: once_cell::sync::Lazy<Instant> = once_cell::sync::Lazy::new(Instant::now);

#[tokio::main]
async fn main() -> ExitCode {
    let _ = *START_TIME;
    let cfg = match Config::from_args() {
        Ok(cfg) => cfg,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures
            return if e.use_stderr() { ExitCode::from(1) } else { ExitCode::SUCCESS };
        }
    };

    let _log2 = stdout()
        .module(true) // include module name
        .module_with_line(true) // include line number from module
        .module_filter(|module| module.starts_with("voyager")) // include only our own modules
        .compress(false) // compress output
        .level(cfg.log_level.to_string())
        .start();

    let crawler_config = match cfg.crawler_config() {
        Ok(crawler_config) => crawler_config,
        Err(e) => {
            error!("{:#}", e);
            info!("{}", Config::command().render_usage());
            return ExitCode::from(1);
        }
    };

    let output_dir = cfg.output_dir();
    match run(crawler_config, &output_dir).await {
        Ok(summary) => {
            print_summary(&summary, &output_dir);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Crawling failed: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(crawler_config: CrawlerConfig, output_dir: &Path) -> Result<CrawlSummary> {
    print_banner(&crawler_config, output_dir);

    let fetcher = Arc::new(HttpFetcher::new()?);
    let parser = Arc::new(HtmlLinkParser::new()?);
    let storage = Arc::new(LocalFileStorage::new(output_dir));
    let dedup = Arc::new(ConcurrentDedup::new());
    let crawler = Arc::new(Crawler::new(crawler_config, fetcher, parser, storage, dedup));

    let mut handle = tokio::spawn({
        let crawler = Arc::clone(&crawler);
        async move { crawler.crawl().await }
    });

    let joined = tokio::select! {
        joined = &mut handle => joined,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, waiting up to {:?} for running pages", SHUTDOWN_GRACE);
            crawler.shutdown(SHUTDOWN_GRACE).await;
            handle.await
        }
    };
    crawler.shutdown(SHUTDOWN_GRACE).await;

    joined.context("crawl task did not complete")
}

fn print_banner(config: &CrawlerConfig, output_dir: &Path) {
    info!("Voyager Crawler");
    info!("----------------");
    info!("{:<18} {}", "Seed URL:", config.seed_url);
    info!("{:<18} {}", "Max Depth:", config.max_depth);
    info!("{:<18} {}", "Max Links/Page:", config.max_links_per_page);
    info!("{:<18} {}", "Unique:", config.is_unique);
    info!("{:<18} {}", "Concurrency:", config.concurrency_limit);
    info!("{:<18} {}", "Output Directory:", output_dir.display());
}

fn print_summary(summary: &CrawlSummary, output_dir: &Path) {
    let total = START_TIME.elapsed();
    info!("Results:");
    info!("Crawl complete.");
    info!("{:<18} {}", "Pages saved:", summary.pages_saved);
    info!("{:<18} {}", "Pages attempted:", summary.pages_attempted);
    info!("{:<18} {}", "Visited URLs:", summary.visited);
    info!("{:<18} {}", "Deepest level:", summary.depth_reached);
    info!(
        "Crawl time: {:.2} s ({} ms)",
        summary.elapsed.as_secs_f64(),
        summary.elapsed.as_millis()
    );
    info!("Total execution time: {:.2} s ({} ms)", total.as_secs_f64(), total.as_millis());
    info!("Output directory: {}", output_dir.display());
}
