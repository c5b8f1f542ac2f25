//! Load History Module
//!
//! Records the timestamps of public operations and derives the peak
//! number of operations observed in any 30-second interval.

use crate::stats::TREND_WINDOW_MS;

// == Load History ==
/// Operation timestamps plus the historical peak 30-second load.
///
/// `peak` is monotone: once observed, a peak survives any quiet period
/// and any pruning of the timestamp list.
#[derive(Debug, Default)]
pub struct LoadHistory {
    /// Retained operation timestamps (Unix milliseconds)
    timestamps: Vec<u64>,
    /// Largest operation count seen in any 30-second span
    peak: u64,
}

impl LoadHistory {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a history from persisted state.
    pub fn restore(timestamps: Vec<u64>, peak: u64) -> Self {
        Self { timestamps, peak }
    }

    // == Record ==
    /// Appends one operation timestamp.
    pub fn record(&mut self, now_ms: u64) {
        self.timestamps.push(now_ms);
    }

    // == Peak Load ==
    /// Records `now_ms` as one more operation, folds all retained
    /// timestamps into the peak, and returns the peak.
    pub fn peak_load(&mut self, now_ms: u64) -> u64 {
        self.timestamps.push(now_ms);
        self.settle(now_ms);
        self.peak
    }

    // == Settle ==
    /// Recomputes the peak over the retained timestamps and prunes
    /// everything older than the window.
    ///
    /// The quadratic scan is bounded: retention keeps only the last
    /// 30 seconds of traffic, and the inner loop breaks early on the
    /// sorted sequence.
    pub fn settle(&mut self, now_ms: u64) {
        self.timestamps.sort_unstable();
        let n = self.timestamps.len();
        for i in 0..n {
            let start = self.timestamps[i];
            let mut count = 0u64;
            for j in i..n {
                if self.timestamps[j] - start < TREND_WINDOW_MS {
                    count += 1;
                } else {
                    break;
                }
            }
            self.peak = self.peak.max(count);
        }
        self.timestamps
            .retain(|t| now_ms.saturating_sub(*t) <= TREND_WINDOW_MS);
    }

    // == Accessors ==
    pub fn peak(&self) -> u64 {
        self.peak
    }

    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps
    }
}
