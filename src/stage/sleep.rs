use std::time::Duration;

use super::{guard::Guard, Halt, Pipeline, Stage};
use crate::{
    cancel::CancellationToken,
    channel::{Receiver, Sender},
};

/// Holds every item for a fixed delay before forwarding it. Items are handled strictly one at a time.
pub(super) struct SleepStage<T> {
    guard: Guard,
    input: Receiver<T>,
    output: Sender<T>,
    delay: Duration,
}

impl<T: Send + 'static> Stage for SleepStage<T> {
    const NAME: &'static str = "Sleep";

    fn run(&mut self) -> Result<(), Halt> {
        loop {
            let value = self.guard.recv(&self.input)?;
            // A cancellation during the delay drops the held item.
            self.guard.wait(self.delay)?;
            self.guard.send(&self.output, value)?;
        }
    }
}

impl Pipeline {
    /// Delays each item of `source` by `delay`, which bounds throughput to roughly one item per `delay`.
    ///
    /// A zero delay returns `source` itself, without spawning a stage.
    pub fn sleep<T: Send + 'static>(
        &self,
        token: &CancellationToken,
        source: Receiver<T>,
        delay: Duration,
    ) -> Receiver<T> {
        if delay.is_zero() {
            return source;
        }
        let (output, relay) = self.channel();
        self.spawn(SleepStage {
            guard: Guard::new(token.clone()),
            input: source,
            output,
            delay,
        });
        relay
    }
}
