//! Session statistics.

use std::time::Duration;

use ingestion::StoreStatus;
use observability::ReadingStatsAggregator;
use relay::RelayMetricsSnapshot;

/// Statistics from one dashboard session
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Display refreshes performed
    pub frames_rendered: u64,

    /// Total duration of the session
    pub duration: Duration,

    /// Final store status
    pub store: StoreStatus,

    /// Relay totals (None when overrides stayed local)
    pub relay: Option<RelayMetricsSnapshot>,

    /// How the producer ended, if one was running
    pub producer_exit: Option<String>,

    /// Reading statistics over distinct snapshots
    pub readings: ReadingStatsAggregator,
}

impl SessionStats {
    /// Distinct snapshots per minute
    pub fn snapshot_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.readings.total_snapshots as f64 / secs * 60.0
        } else {
            0.0
        }
    }

    /// Print a human-readable summary to stdout
    pub fn print_summary(&self) {
        println!();
        println!("Duration: {:.1}s", self.duration.as_secs_f64());
        println!(
            "Lines: {} accepted, {} rejected",
            self.store.snapshots_accepted, self.store.lines_rejected
        );
        println!("Snapshots/min: {:.1}", self.snapshot_rate());
        if let Some(relay) = self.relay {
            println!(
                "Commands: {} written, {} failed, {} dropped",
                relay.write_count, relay.failure_count, relay.dropped_count
            );
        }
        if let Some(ref exit) = self.producer_exit {
            println!("Producer: {}", exit);
        }
        if let Some(ref reason) = self.store.stale_reason {
            println!("Stale: {}", reason);
        }
        print!("{}", self.readings.summary());
    }
}
