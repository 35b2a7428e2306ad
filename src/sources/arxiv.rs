//! arXiv research source implementation.
//!
//! The arXiv API answers with an Atom feed. Entries are located by scanning
//! the text for `<entry>` blocks and pulling individual elements out of each
//! block, so one malformed entry never spoils the rest of the feed.

use async_trait::async_trait;
use std::borrow::Cow;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{NormalizedRecord, Query, RecordBuilder};
use crate::sources::{Source, SourceError};
use crate::utils::HttpClient;

/// Base URL for arXiv API
const ARXIV_API_BASE: &str = "https://export.arxiv.org/api";

/// arXiv refuses more than 2000 results per call
const ARXIV_MAX_RESULTS: usize = 2000;

/// arXiv research source
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: Arc<HttpClient>,
    base_url: String,
    fetch_limit: usize,
}

impl ArxivSource {
    pub fn new(client: Arc<HttpClient>, config: &Config) -> Self {
        Self {
            client,
            base_url: ARXIV_API_BASE.to_string(),
            fetch_limit: config.search.fetch_limit,
        }
    }

    /// Point the source at a different API host (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_search_url(&self, query: &Query) -> String {
        format!(
            "{}/query?search_query=all:{}&start=0&max_results={}",
            self.base_url,
            urlencoding::encode(&query.text),
            self.fetch_limit.min(ARXIV_MAX_RESULTS)
        )
    }

    /// Parse an Atom feed into records, skipping malformed entries
    fn parse_feed(xml: &str, include_abstract: bool) -> Result<Vec<NormalizedRecord>, SourceError> {
        if find_open(xml, "feed").is_none() {
            return Err(SourceError::Schema("arXiv response is not an Atom feed".to_string()));
        }

        let records = entry_blocks(xml)
            .into_iter()
            .enumerate()
            .filter_map(|(i, block)| {
                let parsed = block.and_then(|b| parse_entry(b, include_abstract));
                if parsed.is_none() {
                    tracing::debug!("arXiv: skipping malformed entry {}", i);
                }
                parsed
            })
            .collect();

        Ok(records)
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    async fn search(&self, query: &Query) -> Result<Vec<NormalizedRecord>, SourceError> {
        let url = self.build_search_url(query);
        tracing::debug!("arXiv request: {}", url);

        let body = self.client.get_text(self.name(), self.client.get(&url)).await?;
        Self::parse_feed(&body, query.include_abstract)
    }
}

/// Build one record from the inside of an `<entry>` block
///
/// Returns `None` when any element the record needs is opened but never closed.
fn parse_entry(block: &str, include_abstract: bool) -> Option<NormalizedRecord> {
    let title = element_text(block, "title")?;
    let published = element_text(block, "published")?;
    let id = element_text(block, "id")?;
    let summary = element_text(block, "summary")?;
    let doi = element_text(block, "arxiv:doi")?;

    let authors = element_texts(block, "name")?
        .into_iter()
        .map(|name| unescape(name).into_owned())
        .collect::<Vec<_>>();

    Some(
        RecordBuilder::new("arXiv")
            .title(title.map(|t| unescape(t).into_owned()).unwrap_or_default())
            .authors(authors)
            .journal("arXiv")
            .year(published.unwrap_or_default())
            .doi(doi.map(|d| unescape(d).into_owned()).unwrap_or_default())
            .fallback_link(id.unwrap_or_default())
            .abstract_text(
                include_abstract,
                summary.map(|s| unescape(s).into_owned()).as_deref(),
            )
            .build(),
    )
}

/// Split a feed into the contents of its `<entry>` elements
///
/// An entry whose closing tag is missing (or comes after the next opening tag)
/// is reported as `None`.
fn entry_blocks(xml: &str) -> Vec<Option<&str>> {
    let mut blocks = Vec::new();
    let mut rest = xml;

    while let Some((_, content_start)) = find_open(rest, "entry") {
        let body = &rest[content_start..];
        let close = body.find("</entry>");
        let next_open = find_open(body, "entry").map(|(start, _)| start);

        match (close, next_open) {
            (Some(end), next) if next.map_or(true, |n| end < n) => {
                blocks.push(Some(&body[..end]));
                rest = &body[end + "</entry>".len()..];
            }
            (_, Some(next)) => {
                blocks.push(None);
                rest = &body[next..];
            }
            (_, None) => {
                blocks.push(None);
                break;
            }
        }
    }

    blocks
}

/// Find an opening tag, returning (tag start, content start)
///
/// Matches `<tag>` and `<tag attr="...">`; a self-closing tag has empty content.
fn find_open(text: &str, tag: &str) -> Option<(usize, usize)> {
    let pattern = format!("<{}", tag);
    let mut from = 0;

    while let Some(offset) = text[from..].find(&pattern) {
        let start = from + offset;
        let after = start + pattern.len();
        match text[after..].chars().next() {
            Some('>') => return Some((start, after + 1)),
            Some(c) if c.is_whitespace() || c == '/' => {
                let end = text[after..].find('>')?;
                return Some((start, after + end + 1));
            }
            _ => from = after,
        }
    }

    None
}

/// Text of the first `tag` element in `block`
///
/// `Some(None)` when the element is absent, `None` when it is opened but
/// never closed.
fn element_text<'a>(block: &'a str, tag: &str) -> Option<Option<&'a str>> {
    let Some((start, content_start)) = find_open(block, tag) else {
        return Some(None);
    };

    if block[start..content_start].ends_with("/>") {
        return Some(Some(""));
    }

    let body = &block[content_start..];
    closing_offset(body, tag).map(|end| Some(body[..end].trim()))
}

/// Texts of every `tag` element in `block`, in document order
///
/// `None` when any of them is opened but never closed.
fn element_texts<'a>(block: &'a str, tag: &str) -> Option<Vec<&'a str>> {
    let mut texts = Vec::new();
    let mut rest = block;

    while let Some((start, content_start)) = find_open(rest, tag) {
        if rest[start..content_start].ends_with("/>") {
            rest = &rest[content_start..];
            continue;
        }

        let body = &rest[content_start..];
        let end = closing_offset(body, tag)?;
        texts.push(body[..end].trim());
        rest = &body[end + tag.len() + 3..];
    }

    Some(texts)
}

/// Offset of `</tag>` in an element's content
///
/// `None` when the closing tag is missing or another `tag` opens before it.
fn closing_offset(body: &str, tag: &str) -> Option<usize> {
    let end = body.find(&format!("</{}>", tag))?;
    match find_open(&body[..end], tag) {
        Some(_) => None,
        None => Some(end),
    }
}

fn unescape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::unescape(text).unwrap_or(Cow::Borrowed(text))
}
