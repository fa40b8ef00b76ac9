//! # PubMed Scraper
//!
//! Rate-limited retrieval of bibliographic metadata from PubMed via the NCBI
//! E-utilities. A topic search returns a page of PMIDs; each PMID can then be
//! resolved to a [`PaperRecord`] with title, journal, publication date and
//! abstract.
//!
//! ## Features
//!
//! - **Rolling-window rate limits**: at most 2 searches and 5 detail
//!   retrievals in any trailing second, shared across clones and tasks
//! - **Typed failures**: every transport or XML problem surfaces as a
//!   [`SearchFailure`] or a per-PMID [`RetrievalFailure`], never a panic
//! - **Partial records**: metadata missing upstream is kept as `None` and
//!   reported by [`PaperRecord::missing_fields`]
//! - **Markdown output**: [`render::MarkdownRenderer`] turns results into
//!   display-ready text
//!
//! ## Quick Start
//!
//! ```no_run
//! use pubmed_scraper::PubMedClient;
//! use pubmed_scraper::render::MarkdownRenderer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = PubMedClient::new();
//!     let outcome = client
//!         .search_and_fetch("machine learning in healthcare", 0)
//!         .await;
//!
//!     println!("{}", MarkdownRenderer::new().render_outcome(&outcome));
//! }
//! ```

pub mod config;
pub mod error;
pub mod pubmed;
pub mod rate_limit;
pub mod render;

// Re-export main types for convenience
pub use config::ClientConfig;
pub use error::{
    ErrorKind, ParseError, PubMedError, Result, RetrievalFailure, SearchFailure, TransportError,
};
pub use pubmed::{MetadataField, PaperBatch, PaperRecord, Pmid, PubMedClient, SearchQuery};
pub use rate_limit::RateLimiter;
