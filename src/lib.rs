//! Composable, cancellable channel-pipeline stages.
//!
//! Every combinator spawns a stage on its own thread and hands back the stage's output channel right away. Stages stop
//! (closing their outputs) when the source ends, when their [CancellationToken] is cancelled, or when every reader
//! has hung up.
//!
//! ```
//! use weir::{channel::drain, stage, CancellationToken};
//!
//! let token = CancellationToken::new();
//! let numbers = stage::take(&token, stage::repeat(&token, [1, 2]), 5);
//! assert_eq!(drain(numbers), Some(vec![1, 2, 1, 2, 1]));
//! ```

pub mod cancel;
pub mod channel;
pub mod harness;
pub mod logging;
pub mod shim;
pub mod stage;

mod datastructures;

pub use cancel::CancellationToken;
pub use stage::{Halt, Pipeline, PipelineOptions, PipelineOptionsBuilder, StageError, StageEvent};

// utility grouping for the peripherals
pub mod structures {
    pub use crate::datastructures::*;
}

// Re-exports everything needed to assemble pipelines.
pub mod pipeline_tools {
    pub use crate::cancel::CancellationToken;
    pub use crate::channel::{closed, drain, from_values, Receiver, Sender, Source};

    pub use crate::stage::{enumerate, or, or_done, repeat, repeat_func, sleep, take, tee, Pipeline};

    pub use crate::logging::log_event;
}
