use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RetrievalFailure;

/// Base URL of the public PubMed article pages
pub const PUBMED_ARTICLE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";

/// Number of PMIDs requested per search page
pub const PAGE_SIZE: u64 = 20;

/// PubMed identifier as returned by ESearch
///
/// Treated as opaque: it is only ever produced by a search and handed back
/// to the retrieval endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pmid(String);

impl Pmid {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Public PubMed page for this article (for display, never fetched)
    ///
    /// # Example
    ///
    /// ```
    /// use pubmed_scraper::Pmid;
    ///
    /// let pmid = Pmid::from("31978945");
    /// assert_eq!(pmid.url(), "https://pubmed.ncbi.nlm.nih.gov/31978945");
    /// ```
    pub fn url(&self) -> String {
        format!("{}/{}", PUBMED_ARTICLE_URL, self.0)
    }
}

impl fmt::Display for Pmid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Pmid {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Pmid {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for Pmid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One page of a topic search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub topic: String,
    pub page: u32,
}

impl SearchQuery {
    pub fn new(topic: impl Into<String>, page: u32) -> Self {
        Self {
            topic: topic.into(),
            page,
        }
    }

    /// Offset of the first result on this page
    pub fn retstart(&self) -> u64 {
        u64::from(self.page) * PAGE_SIZE
    }

    pub fn retmax(&self) -> u64 {
        PAGE_SIZE
    }

    /// Topic as an ESearch `term` value
    ///
    /// Words are joined with `+` and every other reserved character is
    /// percent-encoded, so a literal `+` in the topic becomes `%2B`.
    ///
    /// # Example
    ///
    /// ```
    /// use pubmed_scraper::SearchQuery;
    ///
    /// let query = SearchQuery::new("machine learning in healthcare", 0);
    /// assert_eq!(query.encoded_term(), "machine+learning+in+healthcare");
    /// ```
    pub fn encoded_term(&self) -> String {
        self.topic
            .split_whitespace()
            .map(|word| urlencoding::encode(word).into_owned())
            .collect::<Vec<_>>()
            .join("+")
    }

    pub fn is_blank(&self) -> bool {
        self.topic.trim().is_empty()
    }
}

/// Metadata fields a [`PaperRecord`] may be missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Title,
    Journal,
    PubDate,
    Abstract,
}

impl MetadataField {
    pub fn label(&self) -> &'static str {
        match self {
            MetadataField::Title => "Title",
            MetadataField::Journal => "Journal",
            MetadataField::PubDate => "Publication Date",
            MetadataField::Abstract => "Abstract",
        }
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bibliographic details for one paper
///
/// Built fresh from the ESummary and EFetch responses for a single PMID.
/// A field the upstream documents omit stays `None`; see
/// [`PaperRecord::missing_fields`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// PubMed ID the record was requested for
    pub pmid: Pmid,
    /// Article title
    pub title: Option<String>,
    /// Full journal name
    pub journal: Option<String>,
    /// Publication date as printed by PubMed (e.g. "2020 Jan 24")
    pub pub_date: Option<String>,
    /// First abstract section
    pub abstract_text: Option<String>,
}

impl PaperRecord {
    /// Fields the upstream responses did not provide, in display order
    pub fn missing_fields(&self) -> Vec<MetadataField> {
        [
            (MetadataField::Title, &self.title),
            (MetadataField::Journal, &self.journal),
            (MetadataField::PubDate, &self.pub_date),
            (MetadataField::Abstract, &self.abstract_text),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(field, _)| field)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn field(&self, field: MetadataField) -> Option<&str> {
        match field {
            MetadataField::Title => self.title.as_deref(),
            MetadataField::Journal => self.journal.as_deref(),
            MetadataField::PubDate => self.pub_date.as_deref(),
            MetadataField::Abstract => self.abstract_text.as_deref(),
        }
    }

    pub fn url(&self) -> String {
        self.pmid.url()
    }
}

/// Outcome of a search followed by detail retrieval for its leading PMIDs
#[derive(Debug)]
pub struct PaperBatch {
    pub query: SearchQuery,
    /// Number of PMIDs the search page returned
    pub total_found: usize,
    /// One entry per processed PMID, in search order
    pub results: Vec<Result<PaperRecord, RetrievalFailure>>,
}

impl PaperBatch {
    pub fn records(&self) -> impl Iterator<Item = &PaperRecord> {
        self.results.iter().filter_map(|result| result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &RetrievalFailure> {
        self.results.iter().filter_map(|result| result.as_ref().err())
    }

    pub fn processed(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_found == 0
    }
}
