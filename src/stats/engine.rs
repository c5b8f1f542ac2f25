//! Statistics Engine Module
//!
//! Tracks query popularity over two horizons: an all-time frequency table
//! (zeitgeist) and a rolling 30-second window (trending), plus the peak
//! operation load via [`LoadHistory`].

use std::collections::HashMap;

use tracing::debug;

use crate::stats::{LoadHistory, StatsSnapshot, TREND_WINDOW_MS};

// == Stat Engine ==
/// Frequency and load statistics for mediator operations.
///
/// Invariants: every key with a nonzero window count also appears in the
/// all-time table; window keys carry an expiry deadline and are dropped,
/// count included, once that deadline passes.
#[derive(Debug, Default)]
pub struct StatEngine {
    /// All-time hit count per query, monotone per key
    all_time: HashMap<String, u64>,
    /// Deadline past which a query leaves the trending window
    window_expiry: HashMap<String, u64>,
    /// Hit count per query within the current window
    window_count: HashMap<String, u64>,
    /// Operation timestamps and peak load
    load: LoadHistory,
}

impl StatEngine {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Query ==
    /// Counts one hit for `query` on both horizons.
    ///
    /// A query whose previous window entry has expired re-seeds at count 1;
    /// a query still inside the window increments and has its deadline
    /// pushed out to `now + 30s`.
    pub fn record_query(&mut self, query: &str, now_ms: u64) {
        *self.all_time.entry(query.to_string()).or_insert(0) += 1;

        self.purge_window(now_ms);
        *self.window_count.entry(query.to_string()).or_insert(0) += 1;
        self.window_expiry
            .insert(query.to_string(), now_ms + TREND_WINDOW_MS);
    }

    // == Zeitgeist ==
    /// Up to `limit` queries ordered by descending all-time count.
    /// Tie order between equal counts is unspecified.
    pub fn zeitgeist(&self, limit: usize) -> Vec<String> {
        let mut queries: Vec<&String> = self.all_time.keys().collect();
        queries.sort_by(|a, b| self.all_time[*b].cmp(&self.all_time[*a]));
        queries.into_iter().take(limit).cloned().collect()
    }

    // == Trending ==
    /// Up to `limit` queries seen in the last 30 seconds, ordered by
    /// descending window count.
    pub fn trending(&mut self, now_ms: u64, limit: usize) -> Vec<String> {
        self.purge_window(now_ms);
        let count = |query: &str| self.window_count.get(query).copied().unwrap_or(0);
        let mut queries: Vec<&String> = self.window_expiry.keys().collect();
        queries.sort_by(|a, b| count(b).cmp(&count(a)));
        queries.into_iter().take(limit).cloned().collect()
    }

    // == Record Operation ==
    /// Notes one public operation for load tracking.
    pub fn record_operation(&mut self, now_ms: u64) {
        self.load.record(now_ms);
    }

    // == Peak Load ==
    /// Counts this call as an operation and returns the peak number of
    /// operations in any 30-second interval.
    pub fn peak_load_30s(&mut self, now_ms: u64) -> u64 {
        self.load.peak_load(now_ms)
    }

    // == Purge Window ==
    /// Drops window entries whose deadline lies in the past, counts
    /// included.
    fn purge_window(&mut self, now_ms: u64) {
        let expired: Vec<String> = self
            .window_expiry
            .iter()
            .filter(|(_, expiry)| **expiry < now_ms)
            .map(|(query, _)| query.clone())
            .collect();
        for query in expired {
            self.window_expiry.remove(&query);
            self.window_count.remove(&query);
        }
    }

    // == Snapshot ==
    /// Captures the full engine state, forcing a final peak recomputation
    /// against `now_ms` first.
    pub fn snapshot(&mut self, now_ms: u64) -> StatsSnapshot {
        self.load.settle(now_ms);
        StatsSnapshot::capture(
            &self.window_expiry,
            &self.window_count,
            &self.all_time,
            self.load.timestamps(),
            self.load.peak(),
        )
    }

    // == Restore ==
    /// Rebuilds an engine from persisted state.
    ///
    /// Persisted window deadlines and load timestamps are taken verbatim
    /// and compared against the current clock from here on, so a restart
    /// shorter than the window resurrects trending entries as if just
    /// seen. That mirrors the long-standing on-disk contract and is left
    /// as-is.
    pub fn restore(snapshot: StatsSnapshot) -> Self {
        debug!(
            all_time = snapshot.all_time_keys.len(),
            trending = snapshot.trending_window_keys.len(),
            peak = snapshot.peak,
            "restoring statistics"
        );
        Self {
            window_expiry: snapshot
                .trending_window_keys
                .iter()
                .cloned()
                .zip(snapshot.trending_window_expiries.iter().copied())
                .collect(),
            window_count: snapshot
                .trending_history_keys
                .iter()
                .cloned()
                .zip(snapshot.trending_history_counts.iter().copied())
                .collect(),
            all_time: snapshot
                .all_time_keys
                .iter()
                .cloned()
                .zip(snapshot.all_time_counts.iter().copied())
                .collect(),
            load: LoadHistory::restore(snapshot.load_timestamps, snapshot.peak),
        }
    }
}
