//! Content Source Module
//!
//! The remote text-lookup-and-search service the mediator fronts. Both
//! operations may be slow (network-bound) and may fail; a failure is
//! fatal to the single request that triggered it, never to the process.

mod wikipedia;

pub use wikipedia::WikipediaSource;

use async_trait::async_trait;

use crate::error::Result;

// == Content Source Trait ==
/// Remote lookup-and-search collaborator contract.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Up to `limit` page titles matching `query`.
    async fn search_titles(&self, query: &str, limit: usize) -> Result<Vec<String>>;

    /// Full text of the page with the given title.
    async fn fetch_page_text(&self, title: &str) -> Result<String>;
}
