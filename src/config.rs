//! Client configuration
//!
//! Builder-style settings for [`PubMedClient`](crate::PubMedClient). The
//! endpoint layout is fixed; only the base URL can be pointed elsewhere, which
//! exists for running against a mock server.

use std::time::Duration;

use crate::rate_limit::{RETRIEVAL_CALLS_PER_SECOND, RateLimiter, SEARCH_CALLS_PER_SECOND};

/// NCBI E-utilities base URL
pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Number of PMIDs resolved by a batch lookup
pub const DEFAULT_DISPLAY_LIMIT: usize = 5;

const DEFAULT_TOOL: &str = "pubmed-scraper";

/// A call ceiling over a rolling period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub calls: usize,
    pub period: Duration,
}

impl RateLimit {
    pub fn per_second(calls: usize) -> Self {
        Self {
            calls,
            period: Duration::from_secs(1),
        }
    }
}

/// Configuration for [`PubMedClient`](crate::PubMedClient)
///
/// # Example
///
/// ```
/// use pubmed_scraper::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new()
///     .with_email("researcher@university.edu")
///     .with_timeout(Duration::from_secs(15));
///
/// assert_eq!(config.search_rate_limit.calls, 2);
/// assert_eq!(config.retrieval_rate_limit.calls, 5);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for the E-utilities endpoints
    pub base_url: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Custom User-Agent header
    pub user_agent: Option<String>,
    /// NCBI API key
    pub api_key: Option<String>,
    /// Contact email sent with each request
    pub email: Option<String>,
    /// Tool name sent with each request
    pub tool: Option<String>,
    /// Ceiling for ESearch calls
    pub search_rate_limit: RateLimit,
    /// Ceiling for detail retrievals
    pub retrieval_rate_limit: RateLimit,
    /// How many PMIDs a batch lookup resolves
    pub display_limit: usize,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            user_agent: None,
            api_key: None,
            email: None,
            tool: None,
            search_rate_limit: RateLimit::per_second(SEARCH_CALLS_PER_SECOND),
            retrieval_rate_limit: RateLimit::per_second(RETRIEVAL_CALLS_PER_SECOND),
            display_limit: DEFAULT_DISPLAY_LIMIT,
        }
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_tool<S: Into<String>>(mut self, tool: S) -> Self {
        self.tool = Some(tool.into());
        self
    }

    /// Override the search ceiling (calls per second)
    pub fn with_search_rate_limit(mut self, calls: usize) -> Self {
        self.search_rate_limit = RateLimit::per_second(calls);
        self
    }

    /// Override the retrieval ceiling (calls per second)
    pub fn with_retrieval_rate_limit(mut self, calls: usize) -> Self {
        self.retrieval_rate_limit = RateLimit::per_second(calls);
        self
    }

    pub fn with_display_limit(mut self, limit: usize) -> Self {
        self.display_limit = limit;
        self
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("pubmed-scraper/{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn effective_tool(&self) -> &str {
        self.tool.as_deref().unwrap_or(DEFAULT_TOOL)
    }

    /// Identification parameters appended to every request
    pub fn build_api_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if let Some(api_key) = &self.api_key {
            params.push(("api_key".to_string(), api_key.clone()));
        }
        if let Some(email) = &self.email {
            params.push(("email".to_string(), email.clone()));
        }
        params.push(("tool".to_string(), self.effective_tool().to_string()));

        params
    }

    pub fn create_search_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.search_rate_limit.calls, self.search_rate_limit.period)
    }

    pub fn create_retrieval_limiter(&self) -> RateLimiter {
        RateLimiter::new(
            self.retrieval_rate_limit.calls,
            self.retrieval_rate_limit.period,
        )
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
