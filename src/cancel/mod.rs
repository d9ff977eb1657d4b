//! Cancellation tokens shared by every stage.
//!
//! A [CancellationToken] moves from active to cancelled exactly once. Cancelling a token cancels every token derived
//! from it, while derived tokens never reach back up to their parent or siblings. The [CancellationToken::done]
//! signal is a receiver whose only sender is dropped at the cancellation instant, so it can sit in a
//! [crossbeam::select!] next to data channels.

use std::{
    convert::Infallible,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use linkme::distributed_slice;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crossbeam::channel::{self, select};

use crate::{
    datastructures::Identifier,
    logging::{copy_log, log_event, registry::METRICS, with_log_scope, LogEvent},
    shim,
    stage::{PipelineOptions, StageError},
};

/// The signal handed out by [CancellationToken::done]. Nothing is ever sent on it; it disconnects on cancellation.
pub type Done = channel::Receiver<Infallible>;

/// Events emitted by tokens.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum TokenEvent {
    /// The token (and thus every token derived from it) was cancelled
    Cancelled {
        /// Identity of the token state
        token: usize,
    },
}

impl LogEvent for TokenEvent {
    const NAME: &'static str = "TokenEvent";
}

#[distributed_slice(METRICS)]
static TOKEN_EVENT: &'static str = TokenEvent::NAME;

struct TokenState {
    id: Identifier,
    cancelled: AtomicBool,
    // Dropping the sender disconnects `done`, which wakes every select watching it.
    trigger: Mutex<Option<channel::Sender<Infallible>>>,
    done: Done,
    children: Mutex<Vec<Weak<TokenState>>>,
}

impl TokenState {
    fn new() -> Self {
        let (trigger, done) = channel::bounded(0);
        Self {
            id: Identifier::new(),
            cancelled: AtomicBool::new(false),
            trigger: Mutex::new(Some(trigger)),
            done,
            children: Mutex::new(vec![]),
        }
    }

    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        drop(self.trigger.lock().take());
        let _ = log_event(&TokenEvent::Cancelled { token: self.id.id });

        let children = std::mem::take(&mut *self.children.lock());
        children
            .iter()
            .filter_map(Weak::upgrade)
            .for_each(|child| child.cancel());
    }
}

/// A derivable, monotonic, one-way cancellation signal.
///
/// Clones share the same state: cancelling any clone cancels them all.
#[derive(Clone)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl CancellationToken {
    /// Constructs a root token, which is only ever cancelled explicitly.
    pub fn new() -> Self {
        Self {
            state: Arc::new(TokenState::new()),
        }
    }

    /// Derives a token which is cancelled whenever `parent` is.
    /// If the parent is already cancelled, so is the returned token.
    pub fn with_parent(parent: &CancellationToken) -> Self {
        let child = Self::new();
        let mut children = parent.state.children.lock();
        if parent.is_cancelled() {
            child.cancel();
        } else {
            children.retain(|weak| weak.strong_count() > 0);
            children.push(Arc::downgrade(&child.state));
        }
        child
    }

    /// Derives a token which additionally cancels itself once `timeout` has elapsed.
    ///
    /// The timer runs on its own thread, racing the deadline against the token's own [CancellationToken::done]
    /// so that it exits as soon as the token is cancelled by any other path.
    pub fn with_timeout(parent: &CancellationToken, timeout: Duration) -> Self {
        let child = Self::with_parent(parent);
        if child.is_cancelled() {
            return child;
        }
        if timeout.is_zero() {
            child.cancel();
            return child;
        }
        let timer = child.clone();
        child.watch("Timeout", move || {
            select! {
                recv(channel::after(timeout)) -> _ => timer.cancel(),
                recv(timer.done()) -> _ => (),
            }
        });
        child
    }

    /// Wraps a raw signal channel into a token. The token is cancelled as soon as the signal yields a value or is
    /// closed. An absent signal produces a token which is already cancelled.
    pub fn from_signal<D: Send + 'static>(signal: Option<channel::Receiver<D>>) -> Self {
        let token = Self::new();
        let Some(signal) = signal else {
            token.cancel();
            return token;
        };
        let watcher = token.clone();
        token.watch("Signal", move || {
            select! {
                recv(signal) -> _ => watcher.cancel(),
                recv(watcher.done()) -> _ => (),
            }
        });
        token
    }

    /// Moves the token to the cancelled state, along with every token derived from it.
    /// Cancelling twice is a no-op.
    pub fn cancel(&self) {
        self.state.cancel();
    }

    /// A signal which becomes ready exactly when the token is cancelled, and stays ready afterwards.
    pub fn done(&self) -> &Done {
        &self.state.done
    }

    /// Snapshot of the current state.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// The identifier of the underlying token state, shared by all clones.
    pub fn id(&self) -> Identifier {
        self.state.id
    }

    /// True if both handles refer to the same token state.
    pub fn same_as(&self, other: &CancellationToken) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Runs `f` on a watcher thread named after this token. The watcher inherits the calling thread's logger, so
    /// cancellations it triggers are logged like explicit ones. It holds that logger until `f` returns.
    fn watch<F: FnOnce() + Send + 'static>(&self, kind: &str, f: F) {
        let id = self.id();
        let name = format!("{id}({kind})");
        let inherited = copy_log();
        let spawned = shim::make_builder(&PipelineOptions::default(), name.clone())
            .and_then(|builder| {
                shim::spawn(builder, move || with_log_scope(inherited, id, f))
                    .map_err(|source| StageError::Spawn { name, source })
            });
        if let Err(err) = spawned {
            panic!("{err}");
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("id", &self.id())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
