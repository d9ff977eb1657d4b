//! Pipeline stages.
//! Every combinator spawns exactly one stage (Or spawns a small tree of them) which owns its output channel(s) and runs
//! on its own thread until the source ends, the token is cancelled, or every reader hung up.

mod enumerate;
mod guard;
mod or;
mod or_done;
mod repeat;
mod sleep;
mod take;
mod tee;

use std::time::Duration;

use derive_builder::Builder;
use linkme::distributed_slice;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cancel::CancellationToken,
    channel::{Receiver, Sender, Source},
    datastructures::{Identifier, VerboseIdentifier},
    logging::{copy_log, log_event_cb, registry::METRICS, with_log_scope, LogEvent},
    shim::{self, RunMode},
};

/// Failures when constructing stages.
#[derive(Debug, Error)]
pub enum StageError {
    /// RepeatFunc was handed no generator. This is a programming error and is never recovered from.
    #[error("RepeatFunc requires a generator, but none was supplied")]
    MissingGenerator,

    /// The operating system refused to start the stage thread.
    #[error("Failed to spawn stage {name}")]
    Spawn {
        /// The thread name of the stage
        name: String,
        /// The underlying spawn failure
        source: std::io::Error,
    },

    /// The configured real-time priority is out of range.
    #[error("Invalid thread priority {priority}: {reason}")]
    Priority {
        /// The rejected priority
        priority: u8,
        /// Why it was rejected
        reason: String,
    },
}

/// Why a stage stopped running.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The stage finished its own quota (e.g. Take forwarded all N items).
    Completed,

    /// The source channel was closed and drained.
    Exhausted,

    /// The token was cancelled.
    Cancelled,

    /// Every reader of the output hung up.
    Disconnected,
}

/// Lifecycle events emitted by every stage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum StageEvent {
    /// The stage thread started running.
    Started {
        /// The stage type
        stage: String,
    },

    /// The stage thread is about to close its outputs.
    Finished {
        /// The stage type
        stage: String,
        /// The reason it stopped
        halt: Halt,
    },
}

impl LogEvent for StageEvent {
    const NAME: &'static str = "StageEvent";
}

#[distributed_slice(METRICS)]
static STAGE_EVENT: &'static str = StageEvent::NAME;

/// A single running unit of a pipeline. Outputs are owned by the stage and close when it is dropped.
pub(crate) trait Stage: Send + 'static {
    /// Name used for the stage thread and log entries.
    const NAME: &'static str;

    /// Runs until the stage halts. `Ok` means the stage completed on its own terms.
    fn run(&mut self) -> Result<(), Halt>;
}

/// Options shared by every stage spawned from a [Pipeline].
#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned", default)]
pub struct PipelineOptions {
    /// Scheduling of stage threads
    pub run_mode: RunMode,

    /// Real-time priority of stage threads, in `0..=99`. Only used under [RunMode::FIFO].
    pub fifo_priority: u8,

    /// Buffer size of every stage-owned output. Zero makes each hand-off a rendezvous.
    pub capacity: usize,

    /// Stack size of stage threads, or the platform default
    #[builder(setter(strip_option))]
    pub stack_size: Option<usize>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            run_mode: RunMode::default(),
            fifo_priority: 10,
            capacity: 0,
            stack_size: None,
        }
    }
}

/// Spawns stages with a fixed set of [PipelineOptions].
/// The free functions of this crate use `Pipeline::default()`.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    /// Constructs a pipeline spawning stages with `options`.
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// The options every stage of this pipeline is spawned with.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    fn channel<T>(&self) -> (Sender<T>, Receiver<T>) {
        crossbeam::channel::bounded(self.options.capacity)
    }

    /// Starts `stage` on a fresh thread, which inherits the calling thread's logger.
    pub(crate) fn try_spawn<S: Stage>(&self, mut stage: S) -> Result<(), StageError> {
        let info = VerboseIdentifier {
            id: Identifier::new(),
            name: S::NAME.to_string(),
        };
        let thread_name = info.to_string();
        let builder = shim::make_builder(&self.options, thread_name.clone())?;
        let inherited = copy_log();
        shim::spawn(builder, move || {
            with_log_scope(inherited, info.id, move || {
                let _ = log_event_cb(|| StageEvent::Started {
                    stage: info.name.clone(),
                });
                let halt = match stage.run() {
                    Ok(()) => Halt::Completed,
                    Err(halt) => halt,
                };
                let _ = log_event_cb(|| StageEvent::Finished {
                    stage: info.name,
                    halt,
                });
                // Closes the outputs only after the finish event went out.
                drop(stage);
            })
        })
        .map_err(|source| StageError::Spawn {
            name: thread_name,
            source,
        })
    }

    pub(crate) fn spawn<S: Stage>(&self, stage: S) {
        self.try_spawn(stage).unwrap_or_else(|err| panic!("{err}"));
    }
}

/// Combines tokens: the result is cancelled as soon as any input is. See [Pipeline::or].
pub fn or(tokens: &[CancellationToken]) -> CancellationToken {
    Pipeline::default().or(tokens)
}

/// Relays `source` until it ends or `token` is cancelled. See [Pipeline::or_done].
pub fn or_done<T: Send + 'static>(token: &CancellationToken, source: Receiver<T>) -> Receiver<T> {
    Pipeline::default().or_done(token, source)
}

/// Cycles through `values` forever. See [Pipeline::repeat].
pub fn repeat<T, I>(token: &CancellationToken, values: I) -> Receiver<T>
where
    T: Clone + Send + 'static,
    I: IntoIterator<Item = T>,
{
    Pipeline::default().repeat(token, values)
}

/// Emits the output of `generator` forever. See [Pipeline::repeat_func].
pub fn repeat_func<T, F>(token: &CancellationToken, generator: Option<F>) -> Receiver<T>
where
    T: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    Pipeline::default().repeat_func(token, generator)
}

/// Forwards at most `count` items. See [Pipeline::take].
pub fn take<S>(token: &CancellationToken, source: S, count: usize) -> Option<Receiver<S::Item>>
where
    S: Source,
    S::Item: Send + 'static,
{
    Pipeline::default().take(token, source, count)
}

/// Delays every item by `delay`. See [Pipeline::sleep].
pub fn sleep<T: Send + 'static>(
    token: &CancellationToken,
    source: Receiver<T>,
    delay: Duration,
) -> Receiver<T> {
    Pipeline::default().sleep(token, source, delay)
}

/// Duplicates every item onto two outputs. See [Pipeline::tee].
pub fn tee<T: Clone + Send + 'static>(
    token: &CancellationToken,
    source: Receiver<T>,
) -> (Receiver<T>, Receiver<T>) {
    Pipeline::default().tee(token, source)
}

/// Pairs every item with its zero-based index. See [Pipeline::enumerate].
pub fn enumerate<S>(source: S) -> Option<Receiver<(usize, S::Item)>>
where
    S: Source,
    S::Item: Send + 'static,
{
    Pipeline::default().enumerate(source)
}

#[cfg(test)]
mod tests {
    use super::{Pipeline, PipelineOptions, PipelineOptionsBuilder, StageError};
    use crate::{cancel::CancellationToken, channel::drain, shim::RunMode};

    #[test]
    fn options_default_to_rendezvous() {
        let options = PipelineOptions::default();
        assert_eq!(options.capacity, 0);
        assert_eq!(options.run_mode, RunMode::Simple);
        assert_eq!(options.stack_size, None);
        assert_eq!(options.fifo_priority, 10);
    }

    #[test]
    fn out_of_range_priority_is_rejected() {
        let options = PipelineOptionsBuilder::default()
            .run_mode(RunMode::FIFO)
            .fifo_priority(200)
            .build()
            .unwrap();
        let token = CancellationToken::new();
        let mut next = 0u32;
        let generator = move || {
            next += 1;
            next
        };
        match Pipeline::new(options).try_repeat_func(&token, Some(generator)) {
            Err(StageError::Priority { priority, .. }) => assert_eq!(priority, 200),
            other => panic!("Expected a priority error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn builder_overrides_fields() {
        let options = PipelineOptionsBuilder::default()
            .capacity(4)
            .stack_size(1 << 20)
            .build()
            .unwrap();
        assert_eq!(options.capacity, 4);
        assert_eq!(options.stack_size, Some(1 << 20));
    }

    #[test]
    fn free_functions_compose() {
        let token = CancellationToken::new();
        let numbered = super::enumerate(super::take(&token, super::repeat(&token, ["x", "y"]), 3));
        assert_eq!(drain(numbered), Some(vec![(0, "x"), (1, "y"), (2, "x")]));
    }
}
