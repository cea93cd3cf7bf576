// Wed Jan 15 2026 - Alex

pub mod tracker;

pub use tracker::ProgressTracker;

use crate::engine::{TaskEvent, TaskState};
use crate::orchestrator::RunObserver;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

pub struct ProgressManager {
    multi: indicatif::MultiProgress,
    style: ProgressStyle,
}

impl ProgressManager {
    pub fn new() -> Self {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ ");

        Self {
            multi: indicatif::MultiProgress::new(),
            style,
        }
    }

    pub fn hidden() -> Self {
        let manager = Self::new();
        manager.multi.set_draw_target(ProgressDrawTarget::hidden());
        manager
    }

    /// A percent bar for one run, driven through the returned observer.
    pub fn run_observer(&self, units: usize) -> Arc<BarObserver> {
        let bar = ProgressBar::new(100);
        bar.set_style(self.style.clone());
        bar.set_message(format!("0/{} batches", units));
        bar.enable_steady_tick(Duration::from_millis(100));

        Arc::new(BarObserver {
            bar: self.multi.add(bar),
            units,
            done: Default::default(),
        })
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

pub struct BarObserver {
    bar: ProgressBar,
    units: usize,
    done: std::sync::atomic::AtomicUsize,
}

impl RunObserver for BarObserver {
    fn on_progress(&self, percent: u8) {
        self.bar.set_position(percent as u64);
    }

    fn on_unit(&self, event: &TaskEvent) {
        if event.state.is_terminal() {
            let done = self.done.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            self.bar.set_message(format!("{}/{} batches", done, self.units));
        }
    }

    fn on_complete(&self, state: TaskState) {
        match state {
            TaskState::Completed => self.bar.finish_with_message("merged"),
            other => self.bar.abandon_with_message(other.to_string()),
        }
    }
}
