use crate::stage::{PipelineOptions, StageError};

/// Re-exports for channel behaviors
pub mod channel {
    pub use crossbeam::channel::*;
}

pub use thread_priority::ThreadBuilder as Builder;

/// Constructs a thread builder based on the [super::RunMode] and thread settings in `options`
pub fn make_builder(options: &PipelineOptions, name: String) -> Result<Builder, StageError> {
    let builder = thread_priority::ThreadBuilder::default().name(name);
    let builder = match options.stack_size {
        Some(size) => builder.stack_size(size),
        None => builder,
    };
    match options.run_mode {
        super::RunMode::Simple => Ok(builder),
        super::RunMode::FIFO => {
            let value: thread_priority::ThreadPriorityValue =
                options.fifo_priority.try_into().map_err(|reason: &'static str| {
                    StageError::Priority {
                        priority: options.fifo_priority,
                        reason: reason.to_string(),
                    }
                })?;
            let policy = thread_priority::unix::ThreadSchedulePolicy::Realtime(
                thread_priority::RealtimeThreadSchedulePolicy::Fifo,
            );
            Ok(builder
                .priority(thread_priority::ThreadPriority::Crossplatform(value))
                .policy(policy))
        }
    }
}

/// Spawns a detached thread. Stage threads are never joined: they finish by closing their outputs.
pub fn spawn<F>(builder: Builder, f: F) -> std::io::Result<()>
where
    F: FnOnce() + Send + 'static,
{
    builder.spawn_careless(f).map(|_| ())
}
