use super::{guard::Guard, Halt, Pipeline, Stage, StageError};
use crate::{
    cancel::CancellationToken,
    channel::{closed, Receiver, Sender},
};

/// Replays a fixed list of values in order, forever.
pub(super) struct RepeatStage<T> {
    guard: Guard,
    values: Vec<T>,
    output: Sender<T>,
}

impl<T: Clone + Send + 'static> Stage for RepeatStage<T> {
    const NAME: &'static str = "Repeat";

    fn run(&mut self) -> Result<(), Halt> {
        for value in self.values.iter().cycle() {
            self.guard.send(&self.output, value.clone())?;
        }
        // Only reachable with no values, which are never spawned.
        Ok(())
    }
}

/// Emits a freshly generated value per iteration, forever.
pub(super) struct RepeatFuncStage<T, F> {
    guard: Guard,
    generator: F,
    output: Sender<T>,
}

impl<T, F> Stage for RepeatFuncStage<T, F>
where
    T: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    const NAME: &'static str = "RepeatFunc";

    fn run(&mut self) -> Result<(), Halt> {
        loop {
            self.guard.check()?;
            let value = (self.generator)();
            self.guard.send(&self.output, value)?;
        }
    }
}

impl Pipeline {
    /// Cycles through `values` (`values[i % len]`) until `token` is cancelled.
    ///
    /// With no values, or with a token that is already cancelled, the output is closed immediately and no stage is spawned.
    pub fn repeat<T, I>(&self, token: &CancellationToken, values: I) -> Receiver<T>
    where
        T: Clone + Send + 'static,
        I: IntoIterator<Item = T>,
    {
        let values: Vec<T> = values.into_iter().collect();
        if values.is_empty() || token.is_cancelled() {
            return closed();
        }
        let (output, relay) = self.channel();
        self.spawn(RepeatStage {
            guard: Guard::new(token.clone()),
            values,
            output,
        });
        relay
    }

    /// Emits `generator()` until `token` is cancelled. The generator is called once per emission, so stateful
    /// generators (counters, random sources) are expected.
    ///
    /// # Panics
    /// Panics if `generator` is `None`. Use [Pipeline::try_repeat_func] to get the error instead.
    pub fn repeat_func<T, F>(&self, token: &CancellationToken, generator: Option<F>) -> Receiver<T>
    where
        T: Send + 'static,
        F: FnMut() -> T + Send + 'static,
    {
        self.try_repeat_func(token, generator)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Fallible form of [Pipeline::repeat_func].
    pub fn try_repeat_func<T, F>(
        &self,
        token: &CancellationToken,
        generator: Option<F>,
    ) -> Result<Receiver<T>, StageError>
    where
        T: Send + 'static,
        F: FnMut() -> T + Send + 'static,
    {
        let generator = generator.ok_or(StageError::MissingGenerator)?;
        let (output, relay) = self.channel();
        self.try_spawn(RepeatFuncStage {
            guard: Guard::new(token.clone()),
            generator,
            output,
        })?;
        Ok(relay)
    }
}
