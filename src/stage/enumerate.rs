use super::{guard::Guard, Halt, Pipeline, Stage};
use crate::{
    cancel::CancellationToken,
    channel::{Receiver, Sender, Source},
};

pub(super) struct EnumerateStage<T> {
    // Enumerate has no token of its own; this one is never cancelled.
    guard: Guard,
    input: Receiver<T>,
    output: Sender<(usize, T)>,
    index: usize,
}

impl<T: Send + 'static> Stage for EnumerateStage<T> {
    const NAME: &'static str = "Enumerate";

    fn run(&mut self) -> Result<(), Halt> {
        loop {
            let value = self.guard.recv(&self.input)?;
            self.guard.send(&self.output, (self.index, value))?;
            self.index += 1;
        }
    }
}

impl Pipeline {
    /// Pairs every item of `source` with its zero-based position.
    ///
    /// An absent source yields an absent output, while a closed, empty source yields a closed, empty output.
    pub fn enumerate<S>(&self, source: S) -> Option<Receiver<(usize, S::Item)>>
    where
        S: Source,
        S::Item: Send + 'static,
    {
        let input = source.into_source()?;
        let (output, relay) = self.channel();
        self.spawn(EnumerateStage {
            guard: Guard::new(CancellationToken::new()),
            input,
            output,
            index: 0,
        });
        Some(relay)
    }
}
