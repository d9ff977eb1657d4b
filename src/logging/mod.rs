//! Logging support for pipeline execution.
//! Stages and tokens emit small structured events (start, finish, cancellation) which are pushed into a channel and
//! handed to a [LogProcessor]. Recording is only active with the `logging` feature; otherwise every entry point is a no-op.

use bson::Bson;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, num::TryFromIntError};
use thiserror::Error;

// Adds a logger that does nothing.
mod null_logger;
pub use null_logger::*;

mod memory_logger;
pub use memory_logger::MemoryLogger;

mod log_interface;
pub use log_interface::LogInterface;

mod log_functions;
pub use log_functions::*;

use self::registry::{get_metrics_vec, METRICS};

/// Handles the registering/checking of LogEntry names
pub mod registry;

/// Errors which may occur when attempting to log.
#[derive(Error, Debug)]
pub enum LogError {
    /// Attempted to convert time (in us) to i64, but ran out of time. This is unlikely to ever happen.
    #[error("Error converting time into i64. Did we run out of time?")]
    TimeConversionError(TryFromIntError),

    /// The processor side of the log channel was dropped, so the event that was sent will never be seen.
    #[error("Could not send event! Was a LogProcessor attached?")]
    SendError,

    /// The filter that was registered wasn't valid -- some of the filter types weren't registered.
    #[error(
        "Invalid Log Filter Defined: {0:?} were not registered filters! Options: {:?}",
        get_metrics_vec()
    )]
    InvalidFilter(Vec<String>),

    /// Failed to convert the message into bson.
    #[error("Serialization Error")]
    SerializationError(bson::ser::Error),
}

/// A real log entry, which is eventually handed to a [LogProcessor].
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    /// Time in microseconds since the logger was created
    pub timestamp: i64,

    /// Identity of the stage (or token) that emitted the event
    pub context: usize,

    /// String name of the logging event type
    pub event_type: String,

    /// The actual data of the event
    pub event_data: Bson,
}

/// All logs types must expose a name, which is used by filters.
pub trait LogEvent: Serialize {
    /// The declared name of the logging type. This is used to report the the event type in the [LogEntry], as well as check filters in [LogFilter]
    const NAME: &'static str;
}

/// Log Processors are responsible for processing logs (i.e. storing them somewhere).
pub trait LogProcessor: Send {
    /// Starts the logging job, invoked within a dedicated thread.
    fn spawn(&mut self);
}

/// Log filtering policies
#[derive(Debug, Default, Clone)]
pub enum LogFilter {
    /// Enables ALL logging
    #[default]
    AllowAll,

    /// Only enable a subset of logs, based on their registered LogEvent::NAME
    Some(HashSet<String>),
}

impl LogFilter {
    /// Checks to see if all elements of the LogFilter are actually registered metrics.
    pub fn check(&self) -> Result<(), LogError> {
        match self {
            LogFilter::AllowAll => Ok(()),
            LogFilter::Some(set) => {
                let invalids: Vec<_> = set
                    .iter()
                    .filter(|key| !METRICS.contains(&key.as_str()))
                    .cloned()
                    .collect();
                if invalids.is_empty() {
                    Ok(())
                } else {
                    Err(LogError::InvalidFilter(invalids))
                }
            }
        }
    }

    /// Checks to see if a log type T is enabled, without actually requiring an instance of T.
    /// This allows checking even when the event is a callback.
    pub fn enabled<T: LogEvent>(&self) -> bool {
        match self {
            LogFilter::AllowAll => true,
            LogFilter::Some(filter) => filter.contains(T::NAME),
        }
    }
}
