use std::sync::atomic::AtomicUsize;

use serde::{Deserialize, Serialize};

/// A guaranteed unique identifier for a stage or a cancellation token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Copy, Serialize, Deserialize)]
pub struct Identifier {
    /// The actual ID
    pub id: usize,
}
static COUNTER: AtomicUsize = AtomicUsize::new(0);
impl Identifier {
    /// Obtains a new identifier by incrementing an atomic ID.
    pub fn new() -> Self {
        let id = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Self { id }
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ID_{}", self.id)
    }
}

/// A more complete identifier, replete with a name. This is mostly used to name threads and log entries.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerboseIdentifier {
    /// The underlying identifier
    pub id: Identifier,

    /// Some convenient name for debugging, usually the type of the stage.
    pub name: String,
}

impl std::fmt::Display for VerboseIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.id, self.name)
    }
}
