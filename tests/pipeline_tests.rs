//! End-to-end pipeline tests against mocked arXiv, Scholar and Twitter endpoints.

use rustarxiv::arxiv::{ArxivClient, QueryOptions};
use rustarxiv::enrich::{DelayRange, Enricher};
use rustarxiv::gscholar::CitationClient;
use rustarxiv::http::HttpSettings;
use rustarxiv::mentions::{estimate_mentions, MentionSource, TwitterClient};
use rustarxiv::pipeline::{self, CollectRequest};
use rustarxiv::store::{PaperStore, SqliteBackend};
use rustarxiv::ArxivError;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const THREE_ENTRY_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">
  <opensearch:totalResults>3</opensearch:totalResults>
  <entry>
    <id>http://arxiv.org/abs/2405.11111v1</id>
    <published>2024-05-20T09:00:00Z</published>
    <title>Indirect Prompt Injection in Tool-Using Agents</title>
    <summary>We attack agents.</summary>
    <author><name>Grace Hopper</name></author>
    <link href="http://arxiv.org/abs/2405.11111v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2405.11111v1" rel="related" type="application/pdf"/>
    <category term="cs.CR"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/hep-th/9901001v1</id>
    <published>2024-05-19T09:00:00Z</published>
    <title>Entry Without A Modern Identifier</title>
    <summary>Legacy.</summary>
    <author><name>Someone</name></author>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2405.22222v2</id>
    <published>2024-05-18T09:00:00Z</published>
    <title>Jailbreak Benchmarks Revisited</title>
    <summary>We benchmark jailbreaks.</summary>
    <author><name>Barbara Liskov</name></author>
    <link href="http://arxiv.org/abs/2405.22222v2" rel="alternate" type="text/html"/>
    <category term="cs.CL"/>
  </entry>
</feed>"#;

const EMPTY_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">
  <opensearch:totalResults>0</opensearch:totalResults>
</feed>"#;

const SCHOLAR_PAGE: &str = r#"<html><body>
  <div class="gs_r"><div class="gs_fl"><a href="/scholar?cites=9">Cited by 12</a></div></div>
</body></html>"#;

fn settings() -> HttpSettings {
    HttpSettings::default()
}

fn arxiv_client(server: &MockServer) -> ArxivClient {
    ArxivClient::new(&settings())
        .expect("Failed to create arXiv client")
        .with_base_url(format!("{}/api/query", server.uri()))
}

fn scholar_client(server: &MockServer) -> CitationClient {
    CitationClient::new(&settings(), &[])
        .expect("Failed to create Scholar client")
        .with_base_url(server.uri())
}

fn keywords() -> Vec<String> {
    vec!["prompt injection".to_string(), "jailbreak".to_string()]
}

#[tokio::test]
async fn test_collect_stores_only_identified_papers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("sortBy", "submittedDate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(THREE_ENTRY_FEED))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SCHOLAR_PAGE))
        .expect(2)
        .mount(&server)
        .await;

    let enricher = Enricher::new(scholar_client(&server), MentionSource::Estimated)
        .with_delay(DelayRange::none());
    let store = PaperStore::new(SqliteBackend::open_in_memory().expect("in-memory db"));
    let request = CollectRequest {
        keywords: keywords(),
        query: QueryOptions::default(),
        keep_existing: false,
    };

    let report = pipeline::collect(&arxiv_client(&server), &enricher, &store, &request)
        .await
        .expect("collect failed");

    assert_eq!(report.papers.len(), 3);
    assert_eq!(report.accepted, 2);
    assert_eq!(store.count().expect("count"), 2);

    let stored = store.get("2405.11111").expect("get").expect("paper stored");
    assert_eq!(stored.citations, Some(12));
    assert_eq!(stored.mentions, Some(estimate_mentions("2405.11111")));
    assert!(stored.last_store_update.is_some());
    assert!(store.get("2405.22222").expect("get").is_some());
}

#[tokio::test]
async fn test_collect_fresh_run_replaces_previous_papers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string(THREE_ENTRY_FEED))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SCHOLAR_PAGE))
        .mount(&server)
        .await;

    let store = PaperStore::new(SqliteBackend::open_in_memory().expect("in-memory db"));
    store
        .upsert(rustarxiv::Paper {
            paper_id: Some("1999.00001".to_string()),
            title: "Stale".to_string(),
            ..Default::default()
        })
        .expect("seed");

    let enricher = Enricher::new(scholar_client(&server), MentionSource::Estimated)
        .with_delay(DelayRange::none());
    let request = CollectRequest {
        keywords: keywords(),
        query: QueryOptions::default(),
        keep_existing: false,
    };
    let report = pipeline::collect(&arxiv_client(&server), &enricher, &store, &request)
        .await
        .expect("collect failed");

    assert_eq!(report.cleared, 1);
    assert!(store.get("1999.00001").expect("get").is_none());
    assert_eq!(store.count().expect("count"), 2);
}

#[tokio::test]
async fn test_arxiv_error_status_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = arxiv_client(&server)
        .search(&keywords(), &QueryOptions::default())
        .await;
    assert!(matches!(result, Err(ArxivError::Fetch { status: 503, .. })));
}

#[tokio::test]
async fn test_empty_feed_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_FEED))
        .mount(&server)
        .await;

    let mut feed = arxiv_client(&server)
        .search(&keywords(), &QueryOptions::default())
        .await
        .expect("search failed");
    assert_eq!(feed.by_ref().count(), 0);
    assert_eq!(feed.total_results(), Some(0));
}

#[tokio::test]
async fn test_collect_with_empty_feed_reports_no_papers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_FEED))
        .mount(&server)
        .await;

    let enricher = Enricher::new(scholar_client(&server), MentionSource::Estimated)
        .with_delay(DelayRange::none());
    let store = PaperStore::new(SqliteBackend::open_in_memory().expect("in-memory db"));
    let request = CollectRequest {
        keywords: keywords(),
        query: QueryOptions::default(),
        keep_existing: true,
    };

    let result = pipeline::collect(&arxiv_client(&server), &enricher, &store, &request).await;
    assert!(matches!(result, Err(ArxivError::NoPapers(_))));
}

#[tokio::test]
async fn test_scholar_failure_degrades_to_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    assert_eq!(scholar_client(&server).citation_count("2405.11111").await, 0);
}

#[tokio::test]
async fn test_scholar_captcha_degrades_to_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>Our systems have detected unusual traffic</html>"),
        )
        .mount(&server)
        .await;

    assert_eq!(scholar_client(&server).citation_count("2405.11111").await, 0);
}

#[tokio::test]
async fn test_twitter_mentions_use_result_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .and(query_param("query", "\"2405.11111\""))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"id": "1", "text": "read 2405.11111"}],
            "meta": {"result_count": 7}
        })))
        .mount(&server)
        .await;

    let client = TwitterClient::new(&settings(), "test-token")
        .expect("Failed to create Twitter client")
        .with_base_url(server.uri());
    assert_eq!(client.count("2405.11111").await.expect("count failed"), 7);

    let source = MentionSource::Twitter(client);
    assert_eq!(source.mentions("2405.11111").await, 7);
}

#[tokio::test]
async fn test_twitter_failure_degrades_to_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = TwitterClient::new(&settings(), "bad-token")
        .expect("Failed to create Twitter client")
        .with_base_url(server.uri());
    assert_eq!(MentionSource::Twitter(client).mentions("2405.11111").await, 0);
}

#[tokio::test]
async fn test_refresh_rewrites_incomplete_papers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SCHOLAR_PAGE))
        .mount(&server)
        .await;

    let store = PaperStore::new(SqliteBackend::open_in_memory().expect("in-memory db"));
    store
        .upsert(rustarxiv::Paper {
            paper_id: Some("2405.33333".to_string()),
            title: "Missing metrics".to_string(),
            ..Default::default()
        })
        .expect("seed");

    let enricher = Enricher::new(scholar_client(&server), MentionSource::Estimated)
        .with_delay(DelayRange::none());
    let refreshed = pipeline::refresh(&enricher, &store, 7).await.expect("refresh failed");

    assert_eq!(refreshed, 1);
    let paper = store.get("2405.33333").expect("get").expect("paper stored");
    assert_eq!(paper.citations, Some(12));
    assert!(paper.mentions.is_some());
}

fn id_paper(id: &str) -> rustarxiv::Paper {
    rustarxiv::Paper {
        paper_id: Some(id.to_string()),
        title: format!("Paper {}", id),
        ..Default::default()
    }
}

fn untitled_paper(title: &str) -> rustarxiv::Paper {
    rustarxiv::Paper {
        title: title.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_enrich_pauses_between_identified_papers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SCHOLAR_PAGE))
        .expect(3)
        .mount(&server)
        .await;

    let min = Duration::from_millis(200);
    let enricher = Enricher::new(scholar_client(&server), MentionSource::Estimated)
        .with_delay(DelayRange::new(min, Duration::from_millis(250)));
    let papers = vec![
        id_paper("2405.00001"),
        untitled_paper("No id A"),
        id_paper("2405.00002"),
        untitled_paper("No id B"),
        id_paper("2405.00003"),
    ];

    let started = Instant::now();
    let enriched = enricher.enrich(papers).await;
    let elapsed = started.elapsed();

    assert!(elapsed >= min * 2, "expected at least {:?}, took {:?}", min * 2, elapsed);
    assert_eq!(enriched.len(), 5);
    assert_eq!(enriched[1].citations, None);
    assert_eq!(enriched[4].citations, Some(12));
}

#[tokio::test]
async fn test_enrich_does_not_pause_for_papers_without_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SCHOLAR_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let pause = Duration::from_secs(3);
    let enricher = Enricher::new(scholar_client(&server), MentionSource::Estimated)
        .with_delay(DelayRange::new(pause, pause));
    let papers = vec![
        untitled_paper("No id A"),
        id_paper("2405.00001"),
        untitled_paper("No id B"),
        untitled_paper("No id C"),
    ];

    let started = Instant::now();
    let enriched = enricher.enrich(papers).await;

    assert!(started.elapsed() < pause);
    assert_eq!(enriched[1].citations, Some(12));
    assert!(enriched.iter().filter(|p| p.paper_id.is_none()).all(|p| !p.has_metrics()));
}
