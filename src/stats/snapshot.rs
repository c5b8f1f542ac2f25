//! Statistics Snapshot Module
//!
//! On-disk layout of the statistics engine: parallel key/value sequences
//! for each table, the retained load timestamps, and the peak figure.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

// == Stats Snapshot ==
/// Serialized statistics state.
///
/// Key and value sequences are parallel: index `i` of a key sequence pairs
/// with index `i` of its value sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Queries currently inside the trending window
    pub trending_window_keys: Vec<String>,
    /// Window deadline (Unix milliseconds) per trending key
    pub trending_window_expiries: Vec<u64>,
    /// Queries with a window hit count
    pub trending_history_keys: Vec<String>,
    /// Window hit count per key
    pub trending_history_counts: Vec<u64>,
    /// All queries ever recorded
    pub all_time_keys: Vec<String>,
    /// All-time hit count per key
    pub all_time_counts: Vec<u64>,
    /// Retained operation timestamps
    pub load_timestamps: Vec<u64>,
    /// Peak operation count over any 30-second interval
    pub peak: u64,
    /// Wall-clock time this snapshot was written
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

impl StatsSnapshot {
    // == Capture ==
    /// Flattens the engine's tables into parallel sequences.
    pub fn capture(
        window_expiry: &HashMap<String, u64>,
        window_count: &HashMap<String, u64>,
        all_time: &HashMap<String, u64>,
        load_timestamps: &[u64],
        peak: u64,
    ) -> Self {
        let (trending_window_keys, trending_window_expiries) = split_map(window_expiry);
        let (trending_history_keys, trending_history_counts) = split_map(window_count);
        let (all_time_keys, all_time_counts) = split_map(all_time);
        Self {
            trending_window_keys,
            trending_window_expiries,
            trending_history_keys,
            trending_history_counts,
            all_time_keys,
            all_time_counts,
            load_timestamps: load_timestamps.to_vec(),
            peak,
            saved_at: Utc::now(),
        }
    }
}

/// Splits a map into parallel key and value sequences.
fn split_map(map: &HashMap<String, u64>) -> (Vec<String>, Vec<u64>) {
    let mut keys = Vec::with_capacity(map.len());
    let mut values = Vec::with_capacity(map.len());
    for (key, value) in map {
        keys.push(key.clone());
        values.push(*value);
    }
    (keys, values)
}

// == File I/O ==
/// Reads a snapshot from `path`.
///
/// An absent or unreadable file is not an error: the engine starts empty
/// and the condition is logged.
pub fn load(path: &Path) -> Option<StatsSnapshot> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "no statistics snapshot, starting empty");
            return None;
        }
    };
    match serde_json::from_slice(&raw) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable statistics snapshot, starting empty");
            None
        }
    }
}

/// Writes a snapshot to `path`, creating parent directories on demand.
pub async fn save(path: &Path, snapshot: &StatsSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let raw = serde_json::to_vec_pretty(snapshot)?;
    tokio::fs::write(path, raw).await?;
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StatsSnapshot {
        let mut window_expiry = HashMap::new();
        window_expiry.insert("rust".to_string(), 42_000);
        let mut window_count = HashMap::new();
        window_count.insert("rust".to_string(), 3);
        let mut all_time = HashMap::new();
        all_time.insert("rust".to_string(), 7);
        all_time.insert("ocaml".to_string(), 1);
        StatsSnapshot::capture(&window_expiry, &window_count, &all_time, &[1, 2, 3], 5)
    }

    #[test]
    fn test_capture_keeps_sequences_parallel() {
        let snapshot = sample();
        assert_eq!(
            snapshot.all_time_keys.len(),
            snapshot.all_time_counts.len()
        );
        let rust_idx = snapshot
            .all_time_keys
            .iter()
            .position(|k| k == "rust")
            .unwrap();
        assert_eq!(snapshot.all_time_counts[rust_idx], 7);
        assert_eq!(snapshot.trending_window_keys, vec!["rust".to_string()]);
        assert_eq!(snapshot.trending_window_expiries, vec![42_000]);
        assert_eq!(snapshot.peak, 5);
    }

    #[test]
    fn test_json_roundtrip() {
        let snapshot = sample();
        let raw = serde_json::to_string(&snapshot).unwrap();
        let back: StatsSnapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.all_time_keys.len(), 2);
        assert_eq!(back.load_timestamps, vec![1, 2, 3]);
        assert_eq!(back.peak, 5);
    }

    #[tokio::test]
    async fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("stats.json");

        save(&path, &sample()).await.unwrap();
        let back = load(&path).unwrap();
        assert_eq!(back.peak, 5);
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("absent.json")).is_none());
    }

    #[test]
    fn test_load_corrupt_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"not json at all").unwrap();
        assert!(load(&path).is_none());
    }
}
