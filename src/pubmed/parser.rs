//! Streaming parsers for ESearch, ESummary and EFetch XML responses
//!
//! Each parser walks the document once with a `quick_xml::Reader` and picks
//! out the few nodes this crate needs. Documents must be well-formed: a body
//! that is not XML, has stray text outside its root, or ends inside an
//! element is rejected rather than partially read.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::error::ParseError;
use crate::pubmed::models::Pmid;

type ParseResult<T> = std::result::Result<T, ParseError>;

/// Metadata taken from an ESummary `DocSum`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryFields {
    pub title: Option<String>,
    pub journal: Option<String>,
    pub pub_date: Option<String>,
}

/// Reader wrapper that tracks nesting so truncated documents are detected
struct XmlCursor<'a> {
    reader: Reader<&'a [u8]>,
    depth: usize,
    root: Option<String>,
}

impl<'a> XmlCursor<'a> {
    fn new(xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().expand_empty_elements = true;
        Self {
            reader,
            depth: 0,
            root: None,
        }
    }

    fn next(&mut self) -> ParseResult<Event<'a>> {
        let event = self
            .reader
            .read_event()
            .map_err(|e| ParseError::Xml(e.to_string()))?;

        match &event {
            Event::Start(start) => {
                if self.depth == 0 {
                    if self.root.is_some() {
                        return Err(ParseError::Malformed(
                            "more than one root element".to_string(),
                        ));
                    }
                    self.root = Some(element_name(start));
                }
                self.depth += 1;
            }
            Event::End(_) => self.depth = self.depth.saturating_sub(1),
            Event::Text(text) if self.depth == 0 => {
                if !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(ParseError::Malformed(
                        "text content outside the root element".to_string(),
                    ));
                }
            }
            Event::Eof => {
                if self.root.is_none() {
                    return Err(ParseError::Malformed("document has no root element".to_string()));
                }
                if self.depth > 0 {
                    return Err(ParseError::Malformed(format!(
                        "document ends inside {} open element(s)",
                        self.depth
                    )));
                }
            }
            _ => {}
        }

        Ok(event)
    }

    /// Check the root element once the first start tag has been read
    fn expect_root(&self, expected: &'static str) -> ParseResult<()> {
        match self.root.as_deref() {
            Some(found) if found == expected => Ok(()),
            Some(found) => Err(ParseError::UnexpectedRoot {
                expected,
                found: found.to_string(),
            }),
            None => Err(ParseError::MissingElement(expected)),
        }
    }

    /// Concatenated text of the element whose start tag was just read
    ///
    /// Child markup (e.g. `<i>`, `<sup>`) is dropped and its text kept.
    fn text_content(&mut self) -> ParseResult<String> {
        let closing_depth = self.depth.saturating_sub(1);
        let mut text = String::new();

        loop {
            match self.next()? {
                Event::Text(t) => {
                    let unescaped = t.unescape().map_err(|e| ParseError::Xml(e.to_string()))?;
                    text.push_str(&unescaped);
                }
                Event::CData(data) => text.push_str(&String::from_utf8_lossy(&data)),
                Event::End(_) if self.depth == closing_depth => break,
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(normalize_whitespace(&text))
    }

    /// Read the first element and verify it is `expected`
    fn open_root(&mut self, expected: &'static str) -> ParseResult<()> {
        loop {
            match self.next()? {
                Event::Start(_) => return self.expect_root(expected),
                Event::Eof => return self.expect_root(expected),
                _ => {}
            }
        }
    }
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn name_attribute(start: &BytesStart<'_>) -> ParseResult<Option<String>> {
    let attr = start
        .try_get_attribute("Name")
        .map_err(|e| ParseError::Xml(e.to_string()))?;
    attr.map(|a| {
        a.unescape_value()
            .map(|v| v.into_owned())
            .map_err(|e| ParseError::Xml(e.to_string()))
    })
    .transpose()
}

/// Collapse internal runs of whitespace and trim
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

/// Extract every `<Id>` from an ESearch response, in document order
///
/// An `<ERROR>` node is only reported when the response carries no IDs;
/// a search that simply matches nothing yields an empty list.
///
/// # Example
///
/// ```
/// use pubmed_scraper::pubmed::parser::parse_search_ids;
///
/// let xml = r#"<eSearchResult><IdList><Id>1</Id><Id>2</Id></IdList></eSearchResult>"#;
/// let ids = parse_search_ids(xml).unwrap();
/// assert_eq!(ids.len(), 2);
/// assert_eq!(ids[0].as_str(), "1");
/// ```
pub fn parse_search_ids(xml: &str) -> ParseResult<Vec<Pmid>> {
    let mut cursor = XmlCursor::new(xml);
    cursor.open_root("eSearchResult")?;

    let mut ids = Vec::new();
    let mut upstream_error = None;

    loop {
        match cursor.next()? {
            Event::Start(start) => match start.name().as_ref() {
                b"Id" => {
                    if let Some(id) = non_empty(cursor.text_content()?) {
                        ids.push(Pmid::from(id));
                    }
                }
                b"ERROR" => upstream_error = non_empty(cursor.text_content()?),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if ids.is_empty() {
        if let Some(message) = upstream_error {
            return Err(ParseError::Upstream(message));
        }
    }

    debug!(count = ids.len(), "Parsed ESearch IDs");
    Ok(ids)
}

/// Extract title, journal and publication date from an ESummary response
///
/// Only the first `DocSum` is read. Within it, the first `Item` whose `Name`
/// attribute matches wins; nested items (such as authors) are searched too.
pub fn parse_summary(xml: &str) -> ParseResult<SummaryFields> {
    let mut cursor = XmlCursor::new(xml);
    cursor.open_root("eSummaryResult")?;

    let mut fields = SummaryFields::default();
    let mut docsum_depth = None;
    let mut seen_docsum = false;
    let mut upstream_error = None;

    loop {
        match cursor.next()? {
            Event::Start(start) => match start.name().as_ref() {
                b"DocSum" if !seen_docsum => {
                    seen_docsum = true;
                    docsum_depth = Some(cursor.depth);
                }
                b"Item" if docsum_depth.is_some() => {
                    let slot = match name_attribute(&start)?.as_deref() {
                        Some("Title") => &mut fields.title,
                        Some("FullJournalName") => &mut fields.journal,
                        Some("PubDate") => &mut fields.pub_date,
                        _ => continue,
                    };
                    if slot.is_none() {
                        *slot = non_empty(cursor.text_content()?);
                    }
                }
                b"ERROR" => upstream_error = non_empty(cursor.text_content()?),
                _ => {}
            },
            Event::End(_) => {
                if docsum_depth.is_some_and(|depth| cursor.depth < depth) {
                    docsum_depth = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_docsum {
        return Err(match upstream_error {
            Some(message) => ParseError::Upstream(message),
            None => ParseError::MissingElement("DocSum"),
        });
    }

    debug!(
        has_title = fields.title.is_some(),
        has_journal = fields.journal.is_some(),
        has_pub_date = fields.pub_date.is_some(),
        "Parsed ESummary fields"
    );
    Ok(fields)
}

/// Extract the first `AbstractText` from an EFetch abstract response
///
/// Articles without an abstract yield `Ok(None)`.
pub fn parse_abstract(xml: &str) -> ParseResult<Option<String>> {
    let mut cursor = XmlCursor::new(xml);
    cursor.open_root("PubmedArticleSet")?;

    let mut abstract_text = None;

    loop {
        match cursor.next()? {
            Event::Start(start) if start.name().as_ref() == b"AbstractText" => {
                let text = cursor.text_content()?;
                if abstract_text.is_none() {
                    abstract_text = Some(text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(abstract_text.and_then(non_empty))
}
