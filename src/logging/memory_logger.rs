//! The MemoryLogger takes in a [crossbeam::channel::Receiver] containing [LogEntry] and appends them to a shared vector
//! until every [super::LogInterface] holding the other end has been dropped.

use std::sync::Arc;

use crate::shim::channel;
use derive_more::Constructor;
use parking_lot::Mutex;

use super::LogEntry;

/// A logger keeping every entry in memory.
#[derive(Clone, Constructor)]
pub struct MemoryLogger {
    queue: channel::Receiver<LogEntry>,
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl super::LogProcessor for MemoryLogger {
    fn spawn(&mut self) {
        let mut batch = vec![];
        loop {
            // Block for the first entry, then grab whatever else is already queued.
            match self.queue.recv() {
                Ok(entry) => batch.push(entry),
                Err(channel::RecvError) => break,
            }
            batch.extend(self.queue.try_iter());
            self.entries.lock().append(&mut batch);
        }
    }
}
