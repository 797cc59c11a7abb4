use std::sync::Arc;
use std::time::Duration;
use url::Url;
use voyager::crawler::{
    to_filename, ConcurrentDedup, Crawler, CrawlerConfig, FetchPolicy, HtmlLinkParser, HttpFetcher,
    LocalFileStorage,
};
use wiremock::matchers::path;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

fn crawler_for(config: CrawlerConfig, root: &std::path::Path) -> Result<Crawler, Box<dyn std::error::Error>> {
    let fetcher = HttpFetcher::with_policy(
        FetchPolicy::default()
            .without_delays()
            .with_request_timeout(Duration::from_secs(2)),
    )?;
    Ok(Crawler::new(
        config,
        Arc::new(fetcher),
        Arc::new(HtmlLinkParser::new()?),
        Arc::new(LocalFileStorage::new(root)),
        Arc::new(ConcurrentDedup::new()),
    ))
}

#[tokio::test]
async fn test_self_link_refetched_per_wave_when_not_unique() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(html(r#"<a href="/">home</a> <a href="/#footer">footer</a>"#))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let seed = Url::parse(&server.uri())?;
    let crawler = crawler_for(CrawlerConfig::new(seed.clone(), 5, 1, false)?, dir.path())?;

    let summary = crawler.crawl().await;

    assert_eq!(summary.pages_saved, 2);
    let name = format!("{}.html", to_filename(&seed));
    assert!(dir.path().join("0").join(&name).exists());
    assert!(dir.path().join("1").join(&name).exists());
    Ok(())
}

#[tokio::test]
async fn test_links_per_page_cap_against_live_server() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;

    let mut page = String::new();
    for i in 0..20 {
        page += &format!(r#"<a href="/link{}">Link</a>"#, i);
        let expected = if i < 5 { 1 } else { 0 };
        Mock::given(path(format!("/link{}", i)))
            .respond_with(html(""))
            .expect(expected)
            .mount(&server)
            .await;
    }
    Mock::given(path("/root"))
        .respond_with(html(&page))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let seed = Url::parse(&format!("{}/root", server.uri()))?;
    let crawler = crawler_for(CrawlerConfig::new(seed, 5, 3, true)?, dir.path())?;

    let summary = crawler.crawl().await;

    assert_eq!(summary.pages_saved, 6);
    assert_eq!(summary.visited, 6);
    assert_eq!(std::fs::read_dir(dir.path().join("1"))?.count(), 5);
    Ok(())
}
