//! Progress reporting for batch work.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Tracks processed items and logs completion at a configurable step.
///
/// When the total is known, a line is logged every time the completion
/// percentage crosses a multiple of `percentage_step`; otherwise every
/// `item_step` items. The produced-item counter carries the trace count of
/// the trace-group jobs and resets on each logged line.
#[derive(Debug)]
pub struct ProgressLogger {
    name: &'static str,
    counter: AtomicU64,
    produced: AtomicU64,
    total_items: Option<u64>,
    percentage_step: u64,
    item_step: u64,
    detailed: bool,
}

impl ProgressLogger {
    /// Creates a reporter for a run over `total_items` items (when known).
    pub const fn new(name: &'static str, total_items: Option<u64>, percentage_step: u64) -> Self {
        Self {
            name,
            counter: AtomicU64::new(0),
            produced: AtomicU64::new(0),
            total_items,
            percentage_step: if percentage_step == 0 { 10 } else { percentage_step },
            item_step: 5000,
            detailed: false,
        }
    }

    /// Logs every batch's produced-item count at debug level.
    pub const fn with_detailed_log(mut self) -> Self {
        self.detailed = true;
        self
    }

    /// Records `item_count` finished items and `produced_count` produced
    /// records, logging when a step boundary is crossed.
    pub fn track(&self, item_count: u64, produced_count: u64) {
        let processed = self.counter.fetch_add(item_count, Ordering::Relaxed) + item_count;
        let before = processed - item_count;
        let produced = self.produced.fetch_add(produced_count, Ordering::Relaxed) + produced_count;

        if self.detailed && produced_count > 0 {
            debug!(target: "progress", name = self.name, produced_count, "batch finished");
        }

        match self.total_items {
            Some(total) if total > 0 => {
                let percentage = processed * 100 / total;
                let percentage_before = before * 100 / total;
                if percentage / self.percentage_step != percentage_before / self.percentage_step {
                    info!(
                        target: "progress",
                        name = self.name,
                        processed,
                        produced,
                        "{processed} items processed, {percentage}% done"
                    );
                    self.produced.store(0, Ordering::Relaxed);
                }
            }
            _ => {
                if processed / self.item_step != before / self.item_step {
                    info!(
                        target: "progress",
                        name = self.name,
                        processed,
                        "{processed} items processed"
                    );
                }
            }
        }
    }

    /// Total items processed so far.
    pub fn processed(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_across_tracks() {
        let progress = ProgressLogger::new("work", Some(100), 10);
        progress.track(30, 0);
        progress.track(30, 2);
        assert_eq!(progress.processed(), 60);
    }
}
