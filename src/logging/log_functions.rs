use cfg_if::cfg_if;

use super::{LogError, LogEvent};
use crate::{datastructures::Identifier, logging::LogInterface};

// Each stage runs on its own thread, so every logger is stashed into a thread-local.
cfg_if! {
    if #[cfg(feature = "logging")] {
        use std::cell::RefCell;

        thread_local! {
            static LOGGER: RefCell<Option<LogInterface>> = const { RefCell::new(None) };
        }
    }
}

cfg_if! {
    if #[cfg(feature = "logging")] {

        /// Logs with a callback. This should be used when constructing the event is particularly expensive.
        /// The callback is only invoked if the logger is set AND the filter permits the event.
        #[inline]
        pub fn log_event_cb<T: LogEvent, F>(callback: F) -> Result<(), LogError>
        where
            F: FnOnce() -> T,
        {
            LOGGER.with(|logger| match logger.borrow().as_ref() {
                Some(interface) if interface.log_filter.enabled::<T>() => interface.log(&callback()),
                Some(_) => Ok(()),
                None => Ok(()),
            })
        }

        /// Standard logging method, which logs to the underlying logger.
        #[inline]
        pub fn log_event<T: LogEvent>(event: &T) -> Result<(), LogError> {
            LOGGER.with(|logger| match logger.borrow().as_ref() {
                Some(interface) if interface.log_filter.enabled::<T>() => interface.log(event),
                Some(_) => Ok(()),
                None => Ok(()),
            })
        }

        /// Initializes the thread-local log with a specific logger.
        pub fn initialize_log(logger: LogInterface) {
            LOGGER.with(|lg| *lg.borrow_mut() = Some(logger));
        }

        /// Detaches the thread-local logger, releasing its end of the log channel.
        pub fn clear_log() {
            LOGGER.with(|lg| lg.borrow_mut().take());
        }

        /// Gets the current logger, used for 'inheriting' loggers from the spawning thread.
        pub fn copy_log() -> Option<LogInterface> {
            LOGGER.with(|cur_logger| cur_logger.borrow().clone())
        }

        /// Runs `f` with the thread-local logger re-identified as `id`, when a logger was inherited.
        pub(crate) fn with_log_scope<R>(inherited: Option<LogInterface>, id: Identifier, f: impl FnOnce() -> R) -> R {
            if let Some(logger) = inherited {
                initialize_log(logger.with_id(id));
            }
            let result = f();
            clear_log();
            result
        }

    } else {
        // Marked as allow(unused) so that we can keep the same signature and names.

        /// No-op without logging enabled
        #[allow(unused)]
        #[inline]
        pub fn log_event_cb<T: LogEvent, F>(callback: F) -> Result<(), LogError>
        where
            F: FnOnce() -> T,
        {
            Ok(())
        }

        /// No-op without logging enabled
        #[allow(unused)]
        #[inline]
        pub fn log_event<T: LogEvent>(event: &T) -> Result<(), LogError> { Ok(()) }

        /// No-op without logging enabled
        #[allow(unused)]
        #[inline]
        pub fn initialize_log(logger: LogInterface) {}

        /// No-op without logging enabled
        #[allow(unused)]
        #[inline]
        pub fn clear_log() {}

        /// No-op without logging enabled
        #[allow(unused)]
        #[inline]
        pub fn copy_log() -> Option<LogInterface> { None }

        #[allow(unused)]
        #[inline]
        pub(crate) fn with_log_scope<R>(inherited: Option<LogInterface>, id: Identifier, f: impl FnOnce() -> R) -> R {
            f()
        }
    }
}
