//! PubMed search and paper detail retrieval
//!
//! Talks to three E-utilities endpoints: ESearch for PMIDs, ESummary for
//! title/journal/date, and EFetch for the abstract.

pub mod client;
pub mod models;
pub mod parser;

// Re-export public types
pub use client::PubMedClient;
pub use models::{MetadataField, PaperBatch, PaperRecord, Pmid, SearchQuery};
pub use parser::SummaryFields;
