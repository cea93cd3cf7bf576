// Wed Jan 15 2026 - Alex

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Run-level progress in whole percent.
///
/// The coordinator counts as one unit of work, so each completed compute
/// unit adds `100 / (units + 1)` (truncated) and only the coordinator's own
/// completion brings the total to 100. Values never decrease.
#[derive(Debug)]
pub struct ProgressTracker {
    units: usize,
    increment: u8,
    completed: AtomicUsize,
    percent: AtomicU8,
}

impl ProgressTracker {
    pub fn new(units: usize) -> Self {
        Self {
            units,
            increment: (100 / (units + 1)) as u8,
            completed: AtomicUsize::new(0),
            percent: AtomicU8::new(0),
        }
    }

    pub fn units(&self) -> usize {
        self.units
    }

    pub fn increment(&self) -> u8 {
        self.increment
    }

    pub fn completed_units(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn percent(&self) -> u8 {
        self.percent.load(Ordering::SeqCst)
    }

    /// Records one finished unit and returns the new percentage.
    pub fn unit_completed(&self) -> u8 {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.advance(|p| p.saturating_add(self.increment).min(99))
    }

    /// Coordinator finished.
    pub fn finish(&self) -> u8 {
        self.advance(|_| 100)
    }

    pub fn is_finished(&self) -> bool {
        self.percent() == 100
    }

    fn advance<F: Fn(u8) -> u8>(&self, step: F) -> u8 {
        let previous = self.percent
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |p| {
                if p >= 100 {
                    None
                } else {
                    Some(step(p).max(p))
                }
            })
            .unwrap_or(100);

        if previous >= 100 {
            100
        } else {
            step(previous).max(previous)
        }
    }
}
