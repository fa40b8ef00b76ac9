//! PubMed E-utilities tests against the real NCBI service
//!
//! **IMPORTANT**: These tests are only run when:
//! 1. The `integration-tests` feature is enabled
//! 2. The `PUBMED_REAL_API_TESTS` environment variable is set
//!
//! To run these tests:
//! ```bash
//! PUBMED_REAL_API_TESTS=1 cargo test --features integration-tests --test pubmed_api_tests
//! ```

mod common;

#[cfg(feature = "integration-tests")]
mod integration_tests {
    use pubmed_scraper::Pmid;
    use tracing::info;

    use crate::common::integration_test_utils::{
        create_test_pubmed_client, init_test_logging, should_run_real_api_tests,
    };

    #[tokio::test]
    async fn test_search_real_api() {
        init_test_logging();
        if !should_run_real_api_tests() {
            info!("Skipping real API test - enable with PUBMED_REAL_API_TESTS=1");
            return;
        }

        let client = create_test_pubmed_client();
        let pmids = client
            .search("machine learning in healthcare", 0)
            .await
            .expect("real search should succeed");

        assert!(!pmids.is_empty());
        assert!(pmids.len() <= 20);
        assert!(pmids.iter().all(|p| p.as_str().chars().all(|c| c.is_ascii_digit())));
    }

    #[tokio::test]
    async fn test_fetch_details_real_api() {
        init_test_logging();
        if !should_run_real_api_tests() {
            info!("Skipping real API test - enable with PUBMED_REAL_API_TESTS=1");
            return;
        }

        let client = create_test_pubmed_client();
        let record = client
            .fetch_details(&Pmid::from("31978945"))
            .await
            .expect("real retrieval should succeed");

        assert_eq!(record.pmid.as_str(), "31978945");
        assert!(record.title.as_deref().unwrap_or_default().contains("Coronavirus"));
        assert!(record.journal.is_some());
        assert!(record.abstract_text.is_some());
    }

    #[tokio::test]
    async fn test_search_and_fetch_real_api() {
        init_test_logging();
        if !should_run_real_api_tests() {
            info!("Skipping real API test - enable with PUBMED_REAL_API_TESTS=1");
            return;
        }

        let client = create_test_pubmed_client();
        let batch = client
            .search_and_fetch("machine learning in healthcare", 0)
            .await
            .expect("real search should succeed");

        assert_eq!(batch.processed(), batch.total_found.min(5));
        info!(
            records = batch.records().count(),
            failures = batch.failures().count(),
            "Real batch lookup finished"
        );
    }
}
