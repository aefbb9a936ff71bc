//! Progress reporting for long batch operations.
//!
//! Reporting is a side channel: nothing in the crate depends on whether a
//! sink actually displays anything.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::info;

/// Receives progress updates from batch work.
pub trait ProgressSink: Send + Sync {
    /// A new phase with `total` units of work begins.
    fn start(&self, label: &str, total: usize);

    /// `units` more units of work are done.
    fn advance(&self, units: usize);

    /// The current phase is over.
    fn finish(&self);
}

/// Discards all updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&self, _label: &str, _total: usize) {}

    fn advance(&self, _units: usize) {}

    fn finish(&self) {}
}

/// Reports progress through `tracing` at info level.
#[derive(Debug, Default)]
pub struct LogProgress {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl LogProgress {
    /// Create a new log-backed sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Units completed in the current phase.
    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }
}

impl ProgressSink for LogProgress {
    fn start(&self, label: &str, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
        info!("{label}: 0/{total}");
    }

    fn advance(&self, units: usize) {
        let done = self.done.fetch_add(units, Ordering::Relaxed) + units;
        let total = self.total.load(Ordering::Relaxed);
        info!("progress: {done}/{total}");
    }

    fn finish(&self) {
        info!("done: {}/{}", self.done(), self.total.load(Ordering::Relaxed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_progress_counts() {
        let sink = LogProgress::new();
        sink.start("embedding", 5);
        sink.advance(2);
        sink.advance(3);
        sink.finish();
        assert_eq!(sink.done(), 5);

        sink.start("again", 1);
        assert_eq!(sink.done(), 0);
    }
}
