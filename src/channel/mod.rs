//! Channels connecting stages.
//!
//! Stages talk over plain [crossbeam::channel] channels. A channel closes once its last [Sender] is dropped, and every
//! stage owns the only sender of its output, so closure happens exactly once on every exit path.
//!
//! A pipeline which was never constructed is *absent* (`None`), which is a different state from a pipeline whose channel
//! is closed and empty. [Source] lets combinators accept either form.

pub use crossbeam::channel::{Receiver, Sender};

use crossbeam::channel;

/// Anything a relay stage can read from: a present receiver, or a possibly absent one.
pub trait Source {
    /// The values carried by the source.
    type Item;

    /// Normalizes into the maybe-absent form.
    fn into_source(self) -> Option<Receiver<Self::Item>>;
}

impl<T> Source for Receiver<T> {
    type Item = T;

    fn into_source(self) -> Option<Receiver<T>> {
        Some(self)
    }
}

impl<T> Source for Option<Receiver<T>> {
    type Item = T;

    fn into_source(self) -> Option<Receiver<T>> {
        self
    }
}

/// A channel holding `values`, already closed: readers drain the values then observe end-of-stream.
pub fn from_values<T, I>(values: I) -> Receiver<T>
where
    I: IntoIterator<Item = T>,
{
    let values: Vec<T> = values.into_iter().collect();
    let (snd, rcv) = channel::bounded(values.len());
    for value in values {
        // The buffer is sized to fit everything and the receiver is alive.
        let _ = snd.send(value);
    }
    rcv
}

/// A channel which is closed and empty.
pub fn closed<T>() -> Receiver<T> {
    let (_, rcv) = channel::bounded(0);
    rcv
}

/// Reads a source to the end. Absence is preserved: `None` stays `None`, while a closed-empty channel gives `Some(vec![])`.
pub fn drain<S: Source>(source: S) -> Option<Vec<S::Item>> {
    source.into_source().map(|rcv| rcv.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::{closed, drain, from_values, Receiver};

    #[test]
    fn from_values_is_closed_after_values() {
        let rcv = from_values(["a", "b"]);
        assert_eq!(rcv.recv(), Ok("a"));
        assert_eq!(rcv.recv(), Ok("b"));
        assert!(rcv.recv().is_err());
    }

    #[test]
    fn drain_preserves_absence() {
        assert_eq!(drain(None::<Receiver<i32>>), None);
        assert_eq!(drain(closed::<i32>()), Some(vec![]));
        assert_eq!(drain(from_values(1..4)), Some(vec![1, 2, 3]));
    }
}
