//! Rate limiting behaviour of the client against a mocked server
//!
//! Arrival times are recorded server-side. Windows are checked slightly
//! narrower than one second to absorb local request latency jitter.

mod common;

use std::time::{Duration, Instant};

use pubmed_scraper::Pmid;
use tracing_test::traced_test;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

use common::{
    RecordingResponder, create_rate_limited_client, efetch_xml, esearch_xml, esummary_xml,
    max_in_any_window, xml_response,
};

const JITTER_WINDOW: Duration = Duration::from_millis(950);

#[tokio::test]
#[traced_test]
async fn test_search_burst_never_exceeds_two_per_second() {
    let mock_server = MockServer::start().await;
    let responder = RecordingResponder::new(esearch_xml(&["1", "2"]));

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(responder.clone())
        .expect(6)
        .mount(&mock_server)
        .await;

    let client = create_rate_limited_client(&mock_server);
    let start = Instant::now();

    for page in 0..6 {
        let pmids = client.search("covid", page).await.expect("search should succeed");
        assert_eq!(pmids.len(), 2);
    }

    // admissions at 0s, 0s, 1s, 1s, 2s, 2s
    assert!(start.elapsed() >= Duration::from_millis(1950));

    let arrivals = responder.arrivals();
    assert_eq!(arrivals.len(), 6);
    assert!(max_in_any_window(&arrivals, JITTER_WINDOW) <= 2);
}

#[tokio::test]
async fn test_retrieval_burst_never_exceeds_five_per_second() {
    let mock_server = MockServer::start().await;
    let summaries = RecordingResponder::new(esummary_xml("1", Some("T"), Some("J"), Some("D")));

    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(summaries.clone())
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(xml_response(efetch_xml("1", Some("A"))))
        .mount(&mock_server)
        .await;

    let client = create_rate_limited_client(&mock_server);
    let start = Instant::now();

    for n in 0..11 {
        let pmid = Pmid::new(format!("{}", 1000 + n));
        assert!(client.fetch_details(&pmid).await.is_ok());
    }

    // admissions at 0s (x5), 1s (x5), 2s
    assert!(start.elapsed() >= Duration::from_millis(1950));
    assert!(max_in_any_window(&summaries.arrivals(), JITTER_WINDOW) <= 5);
}

#[tokio::test]
async fn test_retrieval_slot_covers_both_inner_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(xml_response(esummary_xml("1", Some("T"), Some("J"), Some("D"))))
        .expect(5)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(xml_response(efetch_xml("1", Some("A"))))
        .expect(5)
        .mount(&mock_server)
        .await;

    let client = create_rate_limited_client(&mock_server);
    let start = Instant::now();

    // five retrievals issue ten HTTP calls but only claim five slots
    for n in 0..5 {
        let pmid = Pmid::new(format!("{}", 2000 + n));
        assert!(client.fetch_details(&pmid).await.is_ok());
    }

    assert!(start.elapsed() < Duration::from_millis(900));
}

#[tokio::test]
async fn test_concurrent_retrieval_shares_ceiling() {
    let mock_server = MockServer::start().await;
    let summaries = RecordingResponder::new(esummary_xml("1", Some("T"), Some("J"), Some("D")));

    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(summaries.clone())
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(xml_response(efetch_xml("1", Some("A"))))
        .mount(&mock_server)
        .await;

    let client = create_rate_limited_client(&mock_server);
    let pmids: Vec<Pmid> = (0..10).map(|n| Pmid::new(format!("{}", 3000 + n))).collect();

    let start = Instant::now();
    let results = client.fetch_all(&pmids, 10).await;

    assert!(results.iter().all(Result::is_ok));
    assert!(start.elapsed() >= Duration::from_millis(950));
    assert!(max_in_any_window(&summaries.arrivals(), JITTER_WINDOW) <= 5);
}

#[tokio::test]
async fn test_clones_share_search_ceiling_across_tasks() {
    let mock_server = MockServer::start().await;
    let responder = RecordingResponder::new(esearch_xml(&["1"]));

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(responder.clone())
        .mount(&mock_server)
        .await;

    let client = create_rate_limited_client(&mock_server);
    let mut handles = Vec::new();
    for task in 0..3 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            for page in 0..2 {
                client
                    .search(&format!("topic {}", task), page)
                    .await
                    .expect("search should succeed");
            }
        }));
    }
    for handle in handles {
        handle.await.expect("task should not panic");
    }

    let arrivals = responder.arrivals();
    assert_eq!(arrivals.len(), 6);
    assert!(max_in_any_window(&arrivals, JITTER_WINDOW) <= 2);
}

#[tokio::test]
async fn test_search_and_retrieval_limiters_are_independent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(xml_response(esearch_xml(&["1"])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(xml_response(esummary_xml("1", Some("T"), Some("J"), Some("D"))))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(xml_response(efetch_xml("1", Some("A"))))
        .mount(&mock_server)
        .await;

    let client = create_rate_limited_client(&mock_server);
    let start = Instant::now();

    // two searches fill the search window; retrievals must not wait on it
    client.search("a", 0).await.unwrap();
    client.search("b", 0).await.unwrap();
    for n in 0..4 {
        client.fetch_details(&Pmid::new(format!("{}", n))).await.unwrap();
    }

    assert!(start.elapsed() < Duration::from_millis(900));
}
