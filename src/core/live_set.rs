use crate::core::models::{Delta, LiveStream};
use std::collections::HashSet;

/// Ids seen live as of the last successful tick, plus the first-cycle flag.
#[derive(Debug)]
pub struct LiveSetTracker {
    live: HashSet<String>,
    first_cycle: bool,
    epoch: u64,
}

impl LiveSetTracker {
    pub fn new() -> Self {
        Self {
            live: HashSet::new(),
            first_cycle: true,
            epoch: 0,
        }
    }

    pub fn is_first_cycle(&self) -> bool {
        self.first_cycle
    }

    /// Bumped on every reset so an in-flight tick can tell its baseline is stale.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn contains(&self, id: &str) -> bool {
        self.live.contains(id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn reset(&mut self) {
        self.live.clear();
        self.first_cycle = true;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Replaces the live set with the ids of `fetched` and returns the streams
    /// that were not live before. On the first cycle nothing is reported as new.
    pub fn compute_delta(&mut self, fetched: Vec<LiveStream>) -> Delta {
        let streams = dedup_by_id(fetched);
        let current: HashSet<String> = streams.iter().map(|s| s.id.clone()).collect();
        let total_live = streams.len();

        let delta = if self.first_cycle {
            self.first_cycle = false;
            tracing::info!(live = total_live, "First poll, recording baseline");
            Delta {
                items: Vec::new(),
                total_live,
                first_cycle: true,
            }
        } else {
            let items: Vec<LiveStream> = streams
                .into_iter()
                .filter(|s| !self.live.contains(&s.id))
                .collect();
            tracing::info!(live = total_live, new = items.len(), "Computed live delta");
            Delta {
                items,
                total_live,
                first_cycle: false,
            }
        };

        self.live = current;
        delta
    }
}

impl Default for LiveSetTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn dedup_by_id(streams: Vec<LiveStream>) -> Vec<LiveStream> {
    let mut seen = HashSet::new();
    streams
        .into_iter()
        .filter(|s| seen.insert(s.id.clone()))
        .collect()
}
