//! Run totals.

use crate::types::Completion;
use serde::Serialize;
use std::time::Duration;

/// Counts of terminal states over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Tasks submitted.
    pub total: usize,
    /// Exited with status zero.
    pub succeeded: usize,
    /// Exited nonzero or were killed by a signal.
    pub failed: usize,
    pub timed_out: usize,
    pub spawn_failed: usize,
    /// Killed because the run was aborted.
    pub cancelled: usize,
    /// Wall time of the whole run.
    pub elapsed_ms: u64,
}

impl RunSummary {
    /// Empty totals for a run of `total` tasks.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Count one terminal state.
    pub fn record(&mut self, completion: &Completion) {
        match completion {
            Completion::Completed(_) if completion.is_success() => self.succeeded += 1,
            Completion::Completed(_) => self.failed += 1,
            Completion::TimedOut => self.timed_out += 1,
            Completion::SpawnFailed(_) => self.spawn_failed += 1,
            Completion::Cancelled => self.cancelled += 1,
        }
    }

    /// Tasks that reached a terminal state.
    pub fn finished(&self) -> usize {
        self.succeeded + self.failed + self.timed_out + self.spawn_failed + self.cancelled
    }

    /// Tasks dropped from the queue by a stopped run.
    pub fn skipped(&self) -> usize {
        self.total.saturating_sub(self.finished())
    }

    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed_ms = elapsed.as_millis() as u64;
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts() {
        let mut summary = RunSummary::new(6);
        summary.record(&Completion::Completed(Some(0)));
        summary.record(&Completion::Completed(Some(2)));
        summary.record(&Completion::Completed(None));
        summary.record(&Completion::TimedOut);
        summary.record(&Completion::SpawnFailed("missing".to_string()));

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.timed_out, 1);
        assert_eq!(summary.spawn_failed, 1);
        assert_eq!(summary.finished(), 5);
        assert_eq!(summary.skipped(), 1);
    }
}
