//! A shim module isolating how stages are scheduled onto threads.

cfg_if::cfg_if! {
    if #[cfg(feature = "os-threads")] {
        mod os_threads;

        pub use os_threads::*;
    } else {
        compile_error!("weir needs a threading backend: enable the `os-threads` feature");
    }
}

/// Options available when spawning stage threads
/// Execution mode for each thread
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Execute under the default OS scheduler, such as CFS for Linux
    #[default]
    Simple,

    /// Use FIFO (real-time) scheduling. This is higher performance, but may lead to starvation of other processes.
    FIFO,
}
