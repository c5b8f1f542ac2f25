//! Cache Store Module
//!
//! Bounded TTL cache: a HashMap index keyed by item id plus a min-heap of
//! expiry deadlines, so purging and eviction are O(log n) instead of a
//! scan over every entry.
//!
//! Every read refreshes the touched entry's deadline, so eviction by
//! nearest deadline approximates recency order without guaranteeing it.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::cache::{CacheEntry, Cacheable, DEFAULT_CAPACITY, DEFAULT_TTL_SECONDS};
use crate::clock::now_ms;
use crate::error::{RelayError, Result};

// == TTL Cache ==
/// Bounded store of identifiable items with expiry-based eviction.
///
/// The heap holds `(deadline, id)` records and is never rewritten when a
/// deadline moves forward; a record is stale once it no longer matches the
/// entry's current deadline, and stale records are skipped when popped.
#[derive(Debug)]
pub struct TtlCache<T: Cacheable> {
    /// Live entries keyed by item id
    entries: HashMap<String, CacheEntry<T>>,
    /// Expiry-ordered records, possibly stale
    deadlines: BinaryHeap<Reverse<(u64, String)>>,
    /// Maximum number of live entries
    capacity: usize,
    /// Entry lifetime in milliseconds
    ttl_ms: u64,
}

impl<T: Cacheable + Clone> TtlCache<T> {
    // == Constructor ==
    /// Creates a cache holding up to `capacity` items, each expiring
    /// `ttl_seconds` after its last refresh.
    pub fn new(capacity: usize, ttl_seconds: u64) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            deadlines: BinaryHeap::new(),
            capacity,
            ttl_ms: ttl_seconds * 1000,
        }
    }

    // == Put ==
    /// Adds an item to the cache.
    ///
    /// Returns `false` without mutating anything if a live item with the
    /// same id is already present. If the cache is full, the entry with
    /// the nearest deadline is evicted first.
    pub fn put(&mut self, item: T) -> bool {
        let now = now_ms();
        self.purge(now);

        if self.capacity == 0 || self.entries.contains_key(item.id()) {
            return false;
        }
        if self.entries.len() >= self.capacity {
            self.evict_nearest();
        }

        let id = item.id().to_string();
        let entry = CacheEntry::new(item, now, self.ttl_ms);
        self.deadlines.push(Reverse((entry.expires_at, id.clone())));
        self.entries.insert(id, entry);
        true
    }

    // == Get ==
    /// Retrieves the item with the given id, refreshing its deadline.
    ///
    /// # Errors
    /// `RelayError::NotFound` if no live entry matches.
    pub fn get(&mut self, id: &str) -> Result<T> {
        let now = now_ms();
        self.purge(now);

        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.expires_at = now + self.ttl_ms;
                self.deadlines.push(Reverse((entry.expires_at, id.to_string())));
                let item = entry.item.clone();
                self.maybe_compact();
                Ok(item)
            }
            None => Err(RelayError::NotFound(id.to_string())),
        }
    }

    // == Touch ==
    /// Refreshes the deadline of the entry with the given id without
    /// returning the item. Returns whether a live match existed.
    pub fn touch(&mut self, id: &str) -> bool {
        let now = now_ms();
        self.purge(now);

        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.expires_at = now + self.ttl_ms;
                self.deadlines.push(Reverse((entry.expires_at, id.to_string())));
                self.maybe_compact();
                true
            }
            None => false,
        }
    }

    // == Update ==
    /// Replaces the stored item with the same id, keeping its current
    /// deadline untouched. Returns `false` when no live entry matches.
    pub fn update(&mut self, item: T) -> bool {
        self.purge(now_ms());

        match self.entries.get_mut(item.id()) {
            Some(entry) => {
                entry.item = item;
                true
            }
            None => false,
        }
    }

    // == Length ==
    /// Number of entries currently held, expired stragglers included
    /// until the next operation purges them.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Purge ==
    /// Drops every entry whose deadline lies in the past.
    fn purge(&mut self, now: u64) {
        while let Some(Reverse((deadline, _))) = self.deadlines.peek() {
            if *deadline >= now {
                break;
            }
            let Some(Reverse((_, id))) = self.deadlines.pop() else {
                break;
            };
            // A stale record outlives a refresh; only remove the entry if
            // it really is past its current deadline.
            if let Some(entry) = self.entries.get(&id) {
                if entry.is_expired(now) {
                    self.entries.remove(&id);
                }
            }
        }
    }

    // == Evict Nearest ==
    /// Removes the live entry with the earliest current deadline.
    ///
    /// Records are popped in deadline order; the first record that still
    /// matches its entry's deadline identifies the victim, everything
    /// before it is stale.
    fn evict_nearest(&mut self) {
        while let Some(Reverse((deadline, id))) = self.deadlines.pop() {
            if let Some(entry) = self.entries.get(&id) {
                if entry.expires_at == deadline {
                    self.entries.remove(&id);
                    return;
                }
            }
        }
    }

    // == Compact ==
    /// Rebuilds the heap when refreshes have left it mostly stale.
    fn maybe_compact(&mut self) {
        if self.deadlines.len() > self.entries.len() * 8 + 32 {
            self.deadlines = self
                .entries
                .iter()
                .map(|(id, entry)| Reverse((entry.expires_at, id.clone())))
                .collect();
        }
    }
}

impl<T: Cacheable + Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL_SECONDS)
    }
}
