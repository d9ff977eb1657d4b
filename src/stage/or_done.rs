use super::{guard::Guard, Halt, Pipeline, Stage};
use crate::{
    cancel::CancellationToken,
    channel::{Receiver, Sender},
};

/// Forwards a source until it closes or the token is cancelled.
pub(super) struct OrDoneStage<T> {
    guard: Guard,
    input: Receiver<T>,
    output: Sender<T>,
}

impl<T: Send + 'static> Stage for OrDoneStage<T> {
    const NAME: &'static str = "OrDone";

    fn run(&mut self) -> Result<(), Halt> {
        loop {
            let value = self.guard.recv(&self.input)?;
            self.guard.send(&self.output, value)?;
        }
    }
}

impl Pipeline {
    /// Relays `source` until it is exhausted or `token` is cancelled.
    /// Neither the read nor the write can block past cancellation, so the relay never outlives its token.
    pub fn or_done<T: Send + 'static>(
        &self,
        token: &CancellationToken,
        source: Receiver<T>,
    ) -> Receiver<T> {
        let (output, relay) = self.channel();
        self.spawn(OrDoneStage {
            guard: Guard::new(token.clone()),
            input: source,
            output,
        });
        relay
    }
}
