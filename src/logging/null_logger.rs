use super::LogProcessor;

/// A processor which discards everything; useful to keep a log channel alive without storing entries.
#[derive(Clone)]
pub struct NullLogger {}

impl LogProcessor for NullLogger {
    fn spawn(&mut self) {} // Does nothing.
}
