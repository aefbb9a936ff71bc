//! Terminal progress bars for long-running stages.

use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use finrag_embeddings::ProgressSink;
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// Draws one bar per stage on stderr.
#[derive(Default)]
pub struct BarProgress {
    current: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for BarProgress {
    fn start(&self, label: &str, total: usize) {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(bar_style());
        bar.set_message(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(bar);
        if let Some(previous) = previous {
            previous.finish_and_clear();
        }
    }

    fn advance(&self, units: usize) {
        if let Some(bar) = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            bar.inc(units as u64);
        }
    }

    fn finish(&self) {
        let bar = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(bar) = bar {
            bar.finish();
        }
    }
}
