use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{PubMedError, Result, RetrievalFailure, SearchFailure, TransportError};
use crate::pubmed::models::{PaperBatch, PaperRecord, Pmid, SearchQuery};
use crate::pubmed::parser::{parse_abstract, parse_search_ids, parse_summary};
use crate::rate_limit::RateLimiter;

/// Client for PubMed search and paper detail retrieval
///
/// Holds one rate limiter for searches and one for detail retrievals.
/// Clones share both limiters, so the per-second ceilings hold across every
/// clone and task using them.
#[derive(Clone)]
pub struct PubMedClient {
    client: Client,
    base_url: String,
    search_limiter: RateLimiter,
    retrieval_limiter: RateLimiter,
    config: ClientConfig,
}

impl PubMedClient {
    /// Create a new client with default configuration
    ///
    /// Searches are limited to 2 calls per second and detail retrievals to 5.
    ///
    /// # Example
    ///
    /// ```
    /// use pubmed_scraper::PubMedClient;
    ///
    /// let client = PubMedClient::new();
    /// ```
    pub fn new() -> Self {
        Self::with_config(ClientConfig::new())
    }

    /// Create a new client with custom configuration
    ///
    /// # Example
    ///
    /// ```
    /// use pubmed_scraper::{ClientConfig, PubMedClient};
    ///
    /// let config = ClientConfig::new()
    ///     .with_api_key("your_api_key_here")
    ///     .with_email("researcher@university.edu");
    ///
    /// let client = PubMedClient::with_config(config);
    /// ```
    pub fn with_config(config: ClientConfig) -> Self {
        Self::try_with_config(config).expect("Failed to create HTTP client")
    }

    /// Like [`PubMedClient::with_config`], reporting HTTP client construction failures
    pub fn try_with_config(config: ClientConfig) -> std::result::Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(config.effective_user_agent())
            .timeout(config.timeout)
            .build()?;

        Ok(Self::from_parts(client, config))
    }

    /// Create a new client around an existing reqwest client
    ///
    /// The reqwest client's own timeout settings apply.
    ///
    /// # Example
    ///
    /// ```
    /// use pubmed_scraper::PubMedClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(20))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = PubMedClient::with_client(http_client);
    /// ```
    pub fn with_client(client: Client) -> Self {
        Self::from_parts(client, ClientConfig::new())
    }

    fn from_parts(client: Client, config: ClientConfig) -> Self {
        Self {
            client,
            base_url: config.effective_base_url().to_string(),
            search_limiter: config.create_search_limiter(),
            retrieval_limiter: config.create_retrieval_limiter(),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Search PubMed for a topic, returning one page of PMIDs
    ///
    /// Pages hold 20 results: page `n` starts at result `n * 20`. PMIDs come
    /// back in the relevance order ESearch reports. A blank topic returns an
    /// empty list without contacting NCBI.
    ///
    /// # Errors
    ///
    /// Any transport or parse problem is returned as a [`SearchFailure`],
    /// which callers treat as "no results".
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pubmed_scraper::PubMedClient;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let client = PubMedClient::new();
    ///     let pmids = client
    ///         .search("machine learning in healthcare", 0)
    ///         .await
    ///         .unwrap_or_default();
    ///     println!("Found {} papers", pmids.len());
    /// }
    /// ```
    #[instrument(skip(self), fields(topic = %topic, page = page))]
    pub async fn search(
        &self,
        topic: &str,
        page: u32,
    ) -> std::result::Result<Vec<Pmid>, SearchFailure> {
        let query = SearchQuery::new(topic, page);
        if query.is_blank() {
            debug!("Blank topic, returning no results");
            return Ok(Vec::new());
        }

        self.search_limiter.acquire().await;

        match self.request_search_ids(&query).await {
            Ok(pmids) => {
                info!(results_found = pmids.len(), "Search completed");
                Ok(pmids)
            }
            Err(cause) => {
                warn!(error = %cause, kind = %cause.kind(), "Search failed");
                Err(SearchFailure { query, cause })
            }
        }
    }

    /// Fetch title, journal, publication date and abstract for one PMID
    ///
    /// Issues an ESummary request and then an EFetch request. Both share the
    /// single retrieval-limiter slot claimed on entry. Fields missing from the
    /// responses are left as `None` in the record.
    ///
    /// # Errors
    ///
    /// If either request fails, or a response is not the expected XML, a
    /// [`RetrievalFailure`] tagged with `pmid` is returned instead of a
    /// partially filled record.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pubmed_scraper::{Pmid, PubMedClient};
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let client = PubMedClient::new();
    ///     match client.fetch_details(&Pmid::from("31978945")).await {
    ///         Ok(record) => println!("{:?}", record.title),
    ///         Err(failure) => eprintln!("{failure}"),
    ///     }
    /// }
    /// ```
    #[instrument(skip(self), fields(pmid = %pmid))]
    pub async fn fetch_details(
        &self,
        pmid: &Pmid,
    ) -> std::result::Result<PaperRecord, RetrievalFailure> {
        self.retrieval_limiter.acquire().await;

        match self.request_record(pmid).await {
            Ok(record) => {
                info!(
                    missing_fields = record.missing_fields().len(),
                    "Retrieved paper details"
                );
                Ok(record)
            }
            Err(cause) => {
                warn!(error = %cause, kind = %cause.kind(), "Detail retrieval failed");
                Err(RetrievalFailure {
                    pmid: pmid.clone(),
                    cause,
                })
            }
        }
    }

    /// Search a topic and retrieve details for the leading results
    ///
    /// Resolves the first `display_limit` PMIDs (5 by default) one after
    /// another. A retrieval failure is recorded for its PMID and the batch
    /// carries on with the next one.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pubmed_scraper::PubMedClient;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let client = PubMedClient::new();
    ///     if let Ok(batch) = client.search_and_fetch("machine learning in healthcare", 0).await {
    ///         for record in batch.records() {
    ///             println!("{}: {:?}", record.pmid, record.title);
    ///         }
    ///     }
    /// }
    /// ```
    #[instrument(skip(self), fields(topic = %topic, page = page))]
    pub async fn search_and_fetch(
        &self,
        topic: &str,
        page: u32,
    ) -> std::result::Result<PaperBatch, SearchFailure> {
        let pmids = self.search(topic, page).await?;
        let total_found = pmids.len();

        let mut results = Vec::with_capacity(total_found.min(self.config.display_limit));
        for pmid in pmids.iter().take(self.config.display_limit) {
            results.push(self.fetch_details(pmid).await);
        }

        let batch = PaperBatch {
            query: SearchQuery::new(topic, page),
            total_found,
            results,
        };
        info!(
            total_found,
            processed = batch.processed(),
            failures = batch.failures().count(),
            "Batch lookup completed"
        );

        Ok(batch)
    }

    /// Retrieve details for many PMIDs with up to `concurrency` requests in flight
    ///
    /// Results keep the order of `pmids`. Every retrieval still goes through
    /// the shared retrieval limiter, so the per-second ceiling is unchanged.
    #[instrument(skip(self, pmids), fields(pmids_count = pmids.len()))]
    pub async fn fetch_all(
        &self,
        pmids: &[Pmid],
        concurrency: usize,
    ) -> Vec<std::result::Result<PaperRecord, RetrievalFailure>> {
        stream::iter(pmids.iter().map(|pmid| self.fetch_details(pmid)))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    async fn request_search_ids(&self, query: &SearchQuery) -> Result<Vec<Pmid>> {
        let url = format!(
            "{}/esearch.fcgi?db=pubmed&retmode=xml&term={}&retstart={}&retmax={}",
            self.base_url,
            query.encoded_term(),
            query.retstart(),
            query.retmax()
        );

        debug!("Making ESearch API request");
        let xml = self.get_text(&url).await?;
        Ok(parse_search_ids(&xml)?)
    }

    async fn request_record(&self, pmid: &Pmid) -> Result<PaperRecord> {
        let id = urlencoding::encode(pmid.as_str());

        let summary_url = format!(
            "{}/esummary.fcgi?db=pubmed&retmode=xml&id={}",
            self.base_url, id
        );
        debug!("Making ESummary API request");
        let summary = parse_summary(&self.get_text(&summary_url).await?)?;

        let abstract_url = format!(
            "{}/efetch.fcgi?db=pubmed&retmode=xml&rettype=abstract&id={}",
            self.base_url, id
        );
        debug!("Making EFetch API request");
        let abstract_text = parse_abstract(&self.get_text(&abstract_url).await?)?;

        Ok(PaperRecord {
            pmid: pmid.clone(),
            title: summary.title,
            journal: summary.journal,
            pub_date: summary.pub_date,
            abstract_text,
        })
    }

    /// GET `url` with the identification parameters appended and return the body
    ///
    /// Non-success statuses become [`TransportError::Status`]. No retries.
    async fn get_text(&self, url: &str) -> Result<String> {
        debug!(url = %url, "Sending request");

        let mut final_url = url.to_string();
        for (key, value) in self.config.build_api_params() {
            final_url.push('&');
            final_url.push_str(&key);
            final_url.push('=');
            final_url.push_str(&urlencoding::encode(&value));
        }

        let response = self.client.get(&final_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("API request failed with status: {}", status);
            return Err(PubMedError::Transport(TransportError::Status {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string(),
            }));
        }

        Ok(response.text().await?)
    }
}

impl Default for PubMedClient {
    fn default() -> Self {
        Self::new()
    }
}
