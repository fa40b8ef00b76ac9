use std::result;

use thiserror::Error;

use crate::pubmed::models::{Pmid, SearchQuery};

/// Failures talking to an E-utilities endpoint
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection, timeout or body read failure
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },
}

/// Failures turning a response body into data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// quick-xml rejected the document
    #[error("XML parsing failed: {0}")]
    Xml(String),

    /// Document is not well-formed in a way quick-xml does not report itself
    #[error("malformed XML: {0}")]
    Malformed(String),

    /// Document parsed but belongs to a different response type
    #[error("unexpected root element <{found}>, expected <{expected}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },

    /// A node the response must contain is absent
    #[error("missing <{0}> element")]
    MissingElement(&'static str),

    /// E-utilities reported an error inside an otherwise valid document
    #[error("NCBI returned an error: {0}")]
    Upstream(String),
}

/// Broad category of a [`PubMedError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Parse,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Transport => f.write_str("transport error"),
            ErrorKind::Parse => f.write_str("parse error"),
        }
    }
}

/// Error types for PubMed client operations
#[derive(Error, Debug)]
pub enum PubMedError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl PubMedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PubMedError::Transport(_) => ErrorKind::Transport,
            PubMedError::Parse(_) => ErrorKind::Parse,
        }
    }
}

impl From<reqwest::Error> for PubMedError {
    fn from(err: reqwest::Error) -> Self {
        PubMedError::Transport(TransportError::Request(err))
    }
}

pub type Result<T> = result::Result<T, PubMedError>;

/// A search that produced no usable result list
///
/// Callers treat this as "no results"; the cause is kept for display.
#[derive(Error, Debug)]
#[error("search for \"{}\" (page {}) failed with a {}: {cause}", .query.topic, .query.page, .cause.kind())]
pub struct SearchFailure {
    pub query: SearchQuery,
    #[source]
    pub cause: PubMedError,
}

impl SearchFailure {
    pub fn kind(&self) -> ErrorKind {
        self.cause.kind()
    }

    /// The result list a failed search stands for
    pub fn pmids(&self) -> &[Pmid] {
        &[]
    }
}

/// Detail retrieval for one PMID failed; no partial record is produced
#[derive(Error, Debug)]
#[error("could not retrieve PMID {pmid} ({}): {cause}", .cause.kind())]
pub struct RetrievalFailure {
    pub pmid: Pmid,
    #[source]
    pub cause: PubMedError,
}

impl RetrievalFailure {
    pub fn kind(&self) -> ErrorKind {
        self.cause.kind()
    }
}
