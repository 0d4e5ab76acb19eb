//! Web lookups for the search intent
//!
//! DuckDuckGo's instant-answer endpoint is tried first; when it has no
//! abstract for the query, a Wikipedia page summary (truncated to two
//! sentences) is the fallback.

use std::time::Duration;

use serde::Deserialize;

use crate::Result;

/// Default DuckDuckGo instant-answer endpoint
const DEFAULT_DDG_ENDPOINT: &str = "https://api.duckduckgo.com/";

/// Default Wikipedia REST summary endpoint (page title is appended)
const DEFAULT_WIKI_ENDPOINT: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";

/// Request timeout for search lookups
const TIMEOUT: Duration = Duration::from_secs(6);

/// Sentences kept from a Wikipedia extract
const SUMMARY_SENTENCES: usize = 2;

/// DuckDuckGo instant-answer response
#[derive(Debug, Deserialize)]
struct InstantAnswer {
    #[serde(rename = "Abstract", default)]
    abstract_text: String,
}

/// Wikipedia REST page summary response
#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(default)]
    extract: String,
}

/// Looks up concise answers for spoken queries
pub struct SearchClient {
    client: reqwest::Client,
    ddg_endpoint: String,
    wiki_endpoint: String,
}

impl SearchClient {
    /// Create a client against the public endpoints
    #[must_use]
    pub fn new() -> Self {
        Self::with_endpoints(
            DEFAULT_DDG_ENDPOINT.to_string(),
            DEFAULT_WIKI_ENDPOINT.to_string(),
        )
    }

    /// Create a client against custom endpoints
    #[must_use]
    pub fn with_endpoints(ddg_endpoint: String, wiki_endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            ddg_endpoint,
            wiki_endpoint,
        }
    }

    /// Ask DuckDuckGo for an instant answer
    ///
    /// Returns `None` when the service has no abstract for the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is unusable.
    pub async fn instant_answer(&self, query: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(&self.ddg_endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_redirect", "1"),
                ("no_html", "1"),
            ])
            .timeout(TIMEOUT)
            .send()
            .await?;

        let answer: InstantAnswer = response.json().await?;
        let text = answer.abstract_text.trim().to_string();
        if text.is_empty() {
            tracing::debug!(query, "no instant answer");
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    /// Fetch a two-sentence Wikipedia summary for the query
    ///
    /// Returns `None` when no page matches or the page has no extract.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is unusable.
    pub async fn wikipedia_summary(&self, query: &str) -> Result<Option<String>> {
        let title = urlencoding::encode(&query.trim().replace(' ', "_")).into_owned();
        let url = format!("{}/{}", self.wiki_endpoint.trim_end_matches('/'), title);

        let response = self.client.get(&url).timeout(TIMEOUT).send().await?;
        if !response.status().is_success() {
            tracing::debug!(query, status = %response.status(), "no wikipedia page");
            return Ok(None);
        }

        let summary: PageSummary = response.json().await?;
        let text = first_sentences(&summary.extract, SUMMARY_SENTENCES);
        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }
}

impl Default for SearchClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep the first `count` sentences of a prose extract
///
/// A sentence ends at a period followed by whitespace (or end of text).
/// Shorter inputs come back whole, trimmed.
#[must_use]
pub fn first_sentences(text: &str, count: usize) -> String {
    let text = text.trim();
    let mut taken = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        if c == '.' && chars.peek().is_none_or(|(_, next)| next.is_whitespace()) {
            taken += 1;
            if taken == count {
                return text[..=pos].to_string();
            }
        }
    }

    text.to_string()
}
