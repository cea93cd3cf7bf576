// Tue Jan 13 2026 - Alex

use crate::table::ResultTable;
use std::sync::mpsc::{channel, Receiver, Sender};

/// One compute unit's output, tagged with its batch index.
#[derive(Debug, Clone)]
pub struct PartialResult {
    pub batch: usize,
    pub table: ResultTable,
}

/// Append-only sink for partial results. Units write through a
/// [`CollectorSlot`]; only the owner of the collector can read.
pub struct ResultCollector {
    sender: Sender<PartialResult>,
    receiver: Receiver<PartialResult>,
    issued: usize,
}

impl ResultCollector {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            sender,
            receiver,
            issued: 0,
        }
    }

    pub fn slot(&mut self, batch: usize) -> CollectorSlot {
        self.issued += 1;
        CollectorSlot {
            batch,
            sender: self.sender.clone(),
        }
    }

    pub fn issued(&self) -> usize {
        self.issued
    }

    /// Everything appended so far, in append order. Callers must only drain
    /// once every slot has been used or dropped.
    pub fn drain(self) -> Vec<PartialResult> {
        let Self { sender, receiver, .. } = self;
        drop(sender);
        receiver.try_iter().collect()
    }
}

impl Default for ResultCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Write handle for one unit. `append` consumes it, so a unit can append
/// at most once.
pub struct CollectorSlot {
    batch: usize,
    sender: Sender<PartialResult>,
}

impl CollectorSlot {
    pub fn batch(&self) -> usize {
        self.batch
    }

    /// Fails only when the collector has already been dropped.
    pub fn append(self, table: ResultTable) -> Result<(), ResultTable> {
        self.sender
            .send(PartialResult { batch: self.batch, table })
            .map_err(|e| e.0.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn table(id: i64) -> ResultTable {
        let mut t = ResultTable::new("id", vec![]);
        t.push_row(id, vec![]).unwrap();
        t
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let mut collector = ResultCollector::new();
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let slot = collector.slot(i);
                thread::spawn(move || slot.append(table(i as i64)).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(collector.issued(), 16);
        let mut batches: Vec<usize> = collector.drain().iter().map(|p| p.batch).collect();
        batches.sort_unstable();
        assert_eq!(batches, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_unused_slot_adds_nothing() {
        let mut collector = ResultCollector::new();
        let used = collector.slot(0);
        let _unused = collector.slot(1);
        used.append(table(1)).unwrap();

        let partials = collector.drain();
        assert_eq!(partials.len(), 1);
        assert_eq!(partials[0].table.ids(), vec![1]);
    }

    #[test]
    fn test_append_after_drop_returns_table() {
        let mut collector = ResultCollector::new();
        let slot = collector.slot(0);
        drop(collector);

        let rejected = slot.append(table(7)).unwrap_err();
        assert_eq!(rejected.ids(), vec![7]);
    }
}
