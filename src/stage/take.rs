use super::{guard::Guard, Halt, Pipeline, Stage};
use crate::{
    cancel::CancellationToken,
    channel::{closed, Receiver, Sender, Source},
};

/// Forwards at most `remaining` more items.
pub(super) struct TakeStage<T> {
    guard: Guard,
    input: Receiver<T>,
    output: Sender<T>,
    remaining: usize,
}

impl<T: Send + 'static> Stage for TakeStage<T> {
    const NAME: &'static str = "Take";

    fn run(&mut self) -> Result<(), Halt> {
        while self.remaining > 0 {
            let value = self.guard.recv(&self.input)?;
            self.guard.send(&self.output, value)?;
            self.remaining -= 1;
        }
        Ok(())
    }
}

impl Pipeline {
    /// Forwards at most `count` items of `source`, then closes.
    ///
    /// A source closing early is never padded: the output just closes after what was available. A `count` of zero
    /// closes immediately without reading the source. An absent source yields an absent output.
    pub fn take<S>(
        &self,
        token: &CancellationToken,
        source: S,
        count: usize,
    ) -> Option<Receiver<S::Item>>
    where
        S: Source,
        S::Item: Send + 'static,
    {
        let input = source.into_source()?;
        if count == 0 {
            return Some(closed());
        }
        let (output, relay) = self.channel();
        self.spawn(TakeStage {
            guard: Guard::new(token.clone()),
            input,
            output,
            remaining: count,
        });
        Some(relay)
    }
}
