//! Collation of closely spaced samples
//!
//! Each entity reports on its own schedule, so readings that belong to the
//! same moment arrive a few seconds apart. The [`Collator`] folds every sample
//! that falls within the merge window of a snapshot's first sample (its
//! anchor) into that snapshot.

use chrono::{DateTime, Duration, FixedOffset};

use crate::config::CollatorConfig;
use crate::sample::{LevelMap, RawMap, Sample};

/// One or more samples merged into a single moment
#[derive(Debug, Clone, PartialEq)]
pub struct CollatedSnapshot {
    /// Timestamp of the first contributing sample
    pub anchor: DateTime<FixedOffset>,
    pub levels: LevelMap,
    pub raw: RawMap,
    /// Number of samples folded into this snapshot
    pub merged: usize,
}

impl CollatedSnapshot {
    fn from_sample(sample: Sample) -> Self {
        Self {
            anchor: sample.time,
            levels: sample.levels,
            raw: sample.raw,
            merged: 1,
        }
    }

    fn absorb(&mut self, sample: &Sample) {
        self.levels.merge(&sample.levels);
        self.raw.merge(&sample.raw);
        self.merged += 1;
    }
}

/// Merges time-adjacent samples into snapshots
#[derive(Debug, Clone)]
pub struct Collator {
    window: Duration,
}

impl Collator {
    pub fn new(config: &CollatorConfig) -> Self {
        Self {
            window: Duration::seconds(config.window_secs),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Sort samples by time and merge those within the window of an anchor.
    ///
    /// The sort is stable: samples with equal timestamps keep input order,
    /// so the later row wins when both write the same alias.
    pub fn collate(&self, mut samples: Vec<Sample>) -> Vec<CollatedSnapshot> {
        samples.sort_by_key(|s| s.time);

        let mut snapshots: Vec<CollatedSnapshot> = Vec::new();
        for sample in samples {
            match snapshots.last_mut() {
                Some(current) if sample.time - current.anchor < self.window => {
                    current.absorb(&sample);
                }
                _ => snapshots.push(CollatedSnapshot::from_sample(sample)),
            }
        }

        tracing::debug!(
            snapshots = snapshots.len(),
            window_secs = self.window.num_seconds(),
            "collated samples"
        );
        snapshots
    }
}

impl Default for Collator {
    fn default() -> Self {
        Self::new(&CollatorConfig::default())
    }
}
