//! Integration tests for the scraping strategy
//!
//! These tests use wiremock to stand in for the certificate search site and
//! exercise listing, fetching, and extraction end-to-end.

use san_crawler::config::{self, Config};
use san_crawler::crawler::{
    crawl, run_scrape, CertPageExtractor, CrtShSource, DispatchSettings, Dispatcher,
    FailureKind, HttpFetcher, IdentifierSource,
};
use san_crawler::SanError;
use std::io::Write;
use std::sync::Arc;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn create_test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.source.base_url = format!("{}/", server.uri());
    config.source.timeout_secs = 5;
    config.crawler.pool_size = 4;
    config
}

fn listing_page(ids: &[u32]) -> String {
    let rows: String = ids
        .iter()
        .map(|id| format!(r#"<tr><td><a href="?id={id}">{id}</a></td></tr>"#))
        .collect();
    format!("<html><body><table>{}</table></body></html>", rows)
}

fn certificate_page(issuer: &str, names: &[&str]) -> String {
    let mut text = format!(
        "Certificate:<BR>&nbsp;Issuer:<BR>&nbsp;&nbsp;commonName&nbsp;=&nbsp;{}<BR>",
        issuer
    );
    if let Some(first) = names.first() {
        text.push_str(&format!(
            "&nbsp;Subject:<BR>&nbsp;&nbsp;commonName&nbsp;=&nbsp;{}<BR>",
            first
        ));
    }
    text.push_str("&nbsp;X509v3 Subject Alternative Name:<BR>");
    for name in names {
        text.push_str(&format!("&nbsp;&nbsp;DNS:{}<BR>", name));
    }
    format!(
        r#"<html><body><table><tr><th>Certificate:</th><td class="text">{}</td></tr></table></body></html>"#,
        text
    )
}

async fn mount_listing(server: &MockServer, field: &str, seed: &str, ids: &[u32]) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param(field, seed))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(ids)))
        .mount(server)
        .await;
}

async fn mount_certificate(server: &MockServer, id: u32, names: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("id", id.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(certificate_page("Test Issuing CA", names)),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_scrape_collects_names() {
    let server = MockServer::start().await;

    mount_listing(&server, "O", "acme", &[1, 2]).await;
    mount_listing(&server, "OU", "acme", &[2, 3]).await;
    mount_certificate(&server, 1, &["www.acme.com", "acme.com"]).await;
    mount_certificate(&server, 2, &["mail.acme.com"]).await;
    mount_certificate(&server, 3, &["*.api.acme.com", "www.acme.com"]).await;

    let config = create_test_config(&server);
    let report = crawl(&config, "acme").await.unwrap();

    let names: Vec<&str> = report.records.iter().collect();
    assert_eq!(
        names,
        vec!["*.api.acme.com", "acme.com", "mail.acme.com", "www.acme.com"]
    );
    // Identifier 2 appears in both listings but is crawled once
    assert_eq!(report.statistics.identifiers_total, 3);
    assert_eq!(report.statistics.units_finished, 3);
    assert!(report.is_complete());
}

#[tokio::test]
async fn test_failed_certificate_page_is_reported() {
    let server = MockServer::start().await;

    mount_listing(&server, "O", "acme", &[1, 2]).await;
    mount_listing(&server, "OU", "acme", &[]).await;
    mount_certificate(&server, 1, &["www.acme.com"]).await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("id", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = create_test_config(&server);
    let report = crawl(&config, "acme").await.unwrap();

    assert!(report.records.contains("www.acme.com"));
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].identifier, "2");
    assert_eq!(report.failures[0].kind, FailureKind::Fetch);
    assert_eq!(report.statistics.fetch_failures, 1);
}

#[tokio::test]
async fn test_page_without_certificate_is_an_extract_failure() {
    let server = MockServer::start().await;

    mount_listing(&server, "O", "acme", &[9]).await;
    mount_listing(&server, "OU", "acme", &[]).await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("id", "9"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>gone</body></html>"))
        .mount(&server)
        .await;

    let config = create_test_config(&server);
    let report = crawl(&config, "acme").await.unwrap();

    assert!(report.records.is_empty());
    assert_eq!(report.statistics.extract_failures, 1);
    assert_eq!(report.failures[0].kind, FailureKind::Extract);
}

#[tokio::test]
async fn test_listing_failure_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("O", "acme"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = create_test_config(&server);
    let result = crawl(&config, "acme").await;

    assert!(matches!(result, Err(SanError::SourceUnavailable { .. })));
}

#[tokio::test]
async fn test_empty_listing_yields_empty_result() {
    let server = MockServer::start().await;

    mount_listing(&server, "O", "nobody", &[]).await;
    mount_listing(&server, "OU", "nobody", &[]).await;

    let config = create_test_config(&server);
    let report = crawl(&config, "nobody").await.unwrap();

    assert!(report.records.is_empty());
    assert_eq!(report.statistics.identifiers_total, 0);
    assert!(report.is_complete());
}

#[tokio::test]
async fn test_source_lists_identifiers_in_first_seen_order() {
    let server = MockServer::start().await;

    mount_listing(&server, "O", "acme", &[5, 3, 5]).await;
    mount_listing(&server, "OU", "acme", &[3, 8]).await;

    let config = create_test_config(&server);
    let client = san_crawler::crawler::build_http_client(&config.user_agent, &config.source)
        .unwrap();
    let source = CrtShSource::from_config(client, &config.source).unwrap();

    let ids = source.list_identifiers("acme").await.unwrap();
    assert_eq!(ids, vec!["5", "3", "8"]);
}

#[tokio::test]
async fn test_run_scrape_applies_exclusions() {
    let server = MockServer::start().await;

    mount_listing(&server, "O", "acme", &[1]).await;
    mount_listing(&server, "OU", "acme", &[]).await;
    mount_certificate(
        &server,
        1,
        &["www.acme.com", "a.cdn.acme.com", "b.cdn.acme.com"],
    )
    .await;

    let config = create_test_config(&server);
    let client = san_crawler::crawler::build_http_client(&config.user_agent, &config.source)
        .unwrap();
    let base_url = Url::parse(&config.source.base_url).unwrap();
    let source = CrtShSource::new(client.clone(), base_url.clone(), vec!["O".into(), "OU".into()]);
    let dispatcher = Dispatcher::new(
        Arc::new(HttpFetcher::new(client, base_url)),
        Arc::new(CertPageExtractor::default()),
        DispatchSettings::default().with_pool_size(2),
    )
    .unwrap();

    let exclude = vec!["*.cdn.acme.com".to_string()];
    let report = run_scrape(&source, &dispatcher, "acme", &exclude)
        .await
        .unwrap();

    let names: Vec<&str> = report.records.iter().collect();
    assert_eq!(names, vec!["www.acme.com"]);
    assert_eq!(report.statistics.unique_records, 1);
}

#[tokio::test]
async fn test_crawl_with_config_file() {
    let server = MockServer::start().await;

    mount_listing(&server, "O", "acme", &[1]).await;
    mount_certificate(&server, 1, &["vpn.acme.com", "intranet.acme.com"]).await;

    let toml = format!(
        r#"
[crawler]
pool-size = 2

[source]
base-url = "{}/"
search-fields = ["O"]

[filter]
exclude = ["intranet.acme.com"]
"#,
        server.uri()
    );

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(toml.as_bytes()).unwrap();

    let (config, hash) = config::load_config_with_hash(file.path()).unwrap();
    assert_eq!(config.crawler.pool_size, 2);
    assert_eq!(hash.len(), 64);

    let report = crawl(&config, "acme").await.unwrap();
    let names: Vec<&str> = report.records.iter().collect();
    assert_eq!(names, vec!["vpn.acme.com"]);
}
