//! Markdown rendering of search and retrieval outcomes
//!
//! Produces display-ready text for whatever front end shows the results.
//! Missing metadata is rendered with a placeholder and failures become a
//! single line naming the failure kind and cause.

use crate::error::{RetrievalFailure, SearchFailure};
use crate::pubmed::models::{MetadataField, PaperBatch, PaperRecord};

/// Shown when a search page returns no PMIDs
pub const NO_RESULTS_MESSAGE: &str = "No papers found. Try a different search term.";

/// Configuration options for Markdown rendering
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Heading level for paper titles (1-6)
    pub heading_level: u8,
    /// Append a "Read more on PubMed" link to each record
    pub include_link: bool,
    /// Text used for metadata the upstream did not provide
    pub placeholder: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            heading_level: 3,
            include_link: true,
            placeholder: "[not available]".to_string(),
        }
    }
}

/// Renders records, failures and batches as Markdown
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    config: RenderConfig,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn with_heading_level(mut self, level: u8) -> Self {
        self.config.heading_level = level.clamp(1, 6);
        self
    }

    pub fn with_include_link(mut self, include: bool) -> Self {
        self.config.include_link = include;
        self
    }

    pub fn with_placeholder<S: Into<String>>(mut self, placeholder: S) -> Self {
        self.config.placeholder = placeholder.into();
        self
    }

    fn value<'a>(&'a self, record: &'a PaperRecord, field: MetadataField) -> &'a str {
        record.field(field).unwrap_or(self.config.placeholder.as_str())
    }

    /// Render one paper
    ///
    /// # Example
    ///
    /// ```
    /// use pubmed_scraper::render::MarkdownRenderer;
    /// use pubmed_scraper::{PaperRecord, Pmid};
    ///
    /// let record = PaperRecord {
    ///     pmid: Pmid::from("31978945"),
    ///     title: Some("A Novel Coronavirus".into()),
    ///     journal: None,
    ///     pub_date: Some("2020 Feb 20".into()),
    ///     abstract_text: None,
    /// };
    ///
    /// let markdown = MarkdownRenderer::new().render_record(&record);
    /// assert!(markdown.starts_with("### A Novel Coronavirus"));
    /// assert!(markdown.contains("**Journal:** [not available]"));
    /// ```
    pub fn render_record(&self, record: &PaperRecord) -> String {
        let heading = "#".repeat(usize::from(self.config.heading_level.clamp(1, 6)));
        let mut markdown = format!(
            "{} {}\n\n",
            heading,
            self.value(record, MetadataField::Title)
        );

        for field in [
            MetadataField::Journal,
            MetadataField::PubDate,
            MetadataField::Abstract,
        ] {
            markdown.push_str(&format!(
                "**{}:** {}\n\n",
                field.label(),
                self.value(record, field)
            ));
        }

        if self.config.include_link {
            markdown.push_str(&format!("[Read more on PubMed]({})\n\n", record.url()));
        }

        markdown.push_str("---\n");
        markdown
    }

    pub fn render_retrieval_failure(&self, failure: &RetrievalFailure) -> String {
        format!("> **Error:** {}\n", failure)
    }

    pub fn render_search_failure(&self, failure: &SearchFailure) -> String {
        format!("> **Error:** {}\n\n{}\n", failure, NO_RESULTS_MESSAGE)
    }

    /// Render a whole batch lookup, records and failures in search order
    pub fn render_batch(&self, batch: &PaperBatch) -> String {
        let mut markdown = format!("Searching for papers on: {}\n\n", batch.query.topic);

        if batch.is_empty() {
            markdown.push_str(NO_RESULTS_MESSAGE);
            markdown.push('\n');
            return markdown;
        }

        markdown.push_str(&format!(
            "Found {} papers. Displaying the first few:\n\n",
            batch.total_found
        ));

        for result in &batch.results {
            match result {
                Ok(record) => markdown.push_str(&self.render_record(record)),
                Err(failure) => markdown.push_str(&self.render_retrieval_failure(failure)),
            }
            markdown.push('\n');
        }

        markdown
    }

    /// Render the outcome of [`PubMedClient::search_and_fetch`](crate::PubMedClient::search_and_fetch)
    pub fn render_outcome(&self, outcome: &Result<PaperBatch, SearchFailure>) -> String {
        match outcome {
            Ok(batch) => self.render_batch(batch),
            Err(failure) => self.render_search_failure(failure),
        }
    }
}
