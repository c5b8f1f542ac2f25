//! Mediator Service Module
//!
//! Composes the page cache and the statistics engine around the content
//! source. Every lookup or search is counted by the statistics engine;
//! page lookups are served from cache when possible.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::cache::TtlCache;
use crate::clock::now_ms;
use crate::config::Config;
use crate::error::Result;
use crate::mediator::Page;
use crate::source::ContentSource;
use crate::stats::{snapshot, StatEngine};

// == Wiki Relay ==
/// The mediator: bounded page cache + statistics engine + content source.
///
/// The statistics mutex serializes all bookkeeping, so operations appear
/// atomic to each other. A content-source fetch on a cache miss runs with
/// no lock held: a slow fetch never blocks operations on other keys.
pub struct WikiRelay {
    source: Arc<dyn ContentSource>,
    pages: RwLock<TtlCache<Page>>,
    stats: Mutex<StatEngine>,
    snapshot_path: PathBuf,
}

impl WikiRelay {
    // == Constructor ==
    /// Builds a relay, restoring any persisted statistics from the
    /// configured snapshot path. An absent or unreadable snapshot starts
    /// the engine empty.
    pub fn new(config: &Config, source: Arc<dyn ContentSource>) -> Self {
        let snapshot_path = PathBuf::from(&config.snapshot_path);
        let stats = match snapshot::load(&snapshot_path) {
            Some(snapshot) => StatEngine::restore(snapshot),
            None => StatEngine::new(),
        };
        Self {
            source,
            pages: RwLock::new(TtlCache::new(config.cache_capacity, config.cache_ttl)),
            stats: Mutex::new(stats),
            snapshot_path,
        }
    }

    // == Search ==
    /// Up to `limit` page titles matching `query`, counting the query on
    /// both statistics horizons. `limit == 0` short-circuits without
    /// touching the content source.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        {
            let mut stats = self.stats.lock().await;
            let now = now_ms();
            stats.record_operation(now);
            stats.record_query(query, now);
        }
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.source.search_titles(query, limit).await
    }

    // == Get Page ==
    /// Text of the page titled `page_title`, from cache when possible.
    ///
    /// On a miss the text is fetched and inserted best-effort: a
    /// concurrent fetch of the same title may have inserted first, in
    /// which case the duplicate insert is simply ignored.
    pub async fn get_page(&self, page_title: &str) -> Result<String> {
        {
            let mut stats = self.stats.lock().await;
            let now = now_ms();
            stats.record_operation(now);
            stats.record_query(page_title, now);
        }

        if let Ok(page) = self.pages.write().await.get(page_title) {
            debug!(title = page_title, "cache hit");
            return Ok(page.content().to_string());
        }

        debug!(title = page_title, "cache miss, fetching");
        let content = self.source.fetch_page_text(page_title).await?;
        self.pages
            .write()
            .await
            .put(Page::new(page_title, content.clone()));
        Ok(content)
    }

    // == Zeitgeist ==
    /// The most common queries of all time, most frequent first.
    pub async fn zeitgeist(&self, limit: usize) -> Vec<String> {
        let mut stats = self.stats.lock().await;
        stats.record_operation(now_ms());
        stats.zeitgeist(limit)
    }

    // == Trending ==
    /// The most common queries of the last 30 seconds, most frequent
    /// first.
    pub async fn trending(&self, limit: usize) -> Vec<String> {
        let mut stats = self.stats.lock().await;
        let now = now_ms();
        stats.record_operation(now);
        stats.trending(now, limit)
    }

    // == Peak Load ==
    /// Peak number of operations observed in any 30-second interval.
    /// The call itself counts as an operation.
    pub async fn peak_load_30s(&self) -> u64 {
        let mut stats = self.stats.lock().await;
        stats.peak_load_30s(now_ms())
    }

    // == Persist ==
    /// Writes the statistics snapshot (after a final peak recomputation)
    /// to the configured path.
    pub async fn persist(&self) -> Result<()> {
        let snapshot = {
            let mut stats = self.stats.lock().await;
            stats.snapshot(now_ms())
        };
        snapshot::save(&self.snapshot_path, &snapshot).await?;
        info!(path = %self.snapshot_path.display(), "statistics persisted");
        Ok(())
    }
}
