//! Wikipedia Source Module
//!
//! ContentSource implementation backed by the MediaWiki Action API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{RelayError, Result};
use crate::source::ContentSource;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("wiki_relay/", env!("CARGO_PKG_VERSION"));

// == Wikipedia Source ==
/// MediaWiki Action API client.
#[derive(Debug, Clone)]
pub struct WikipediaSource {
    http: reqwest::Client,
    api_url: String,
}

impl WikipediaSource {
    /// Creates a client against the given Action API endpoint,
    /// e.g. `https://en.wikipedia.org/w/api.php`.
    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_url: api_url.into(),
        })
    }
}

#[async_trait]
impl ContentSource for WikipediaSource {
    async fn search_titles(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        debug!(query, limit, "searching titles");
        let limit = limit.to_string();
        let envelope: SearchEnvelope = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("srnamespace", "0"),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(envelope
            .query
            .search
            .into_iter()
            .map(|hit| hit.title)
            .collect())
    }

    async fn fetch_page_text(&self, title: &str) -> Result<String> {
        debug!(title, "fetching page text");
        let envelope: PageEnvelope = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("prop", "revisions"),
                ("rvprop", "content"),
                ("rvslots", "main"),
                ("titles", title),
                ("formatversion", "2"),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        envelope
            .query
            .pages
            .into_iter()
            .next()
            .filter(|page| !page.missing)
            .and_then(|page| page.revisions.into_iter().next())
            .map(|revision| revision.slots.main.content)
            .ok_or_else(|| RelayError::PageMissing(title.to_string()))
    }
}

// == API Response Shapes ==

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    query: SearchBody,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageEnvelope {
    query: PageBody,
}

#[derive(Debug, Deserialize)]
struct PageBody {
    #[serde(default)]
    pages: Vec<PageRecord>,
}

#[derive(Debug, Deserialize)]
struct PageRecord {
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    revisions: Vec<Revision>,
}

#[derive(Debug, Deserialize)]
struct Revision {
    slots: Slots,
}

#[derive(Debug, Deserialize)]
struct Slots {
    main: MainSlot,
}

#[derive(Debug, Deserialize)]
struct MainSlot {
    content: String,
}
