//! Cancellation fan-in.
//!
//! `select!` needs a fixed number of arms, so a large fan-in is reduced as a tree: each stage watches at most three
//! input tokens plus the combined token of the next level down. The next level in turn watches the combined token of
//! this level, so whichever leaf fires first tears down every stage of the tree.

use crossbeam::channel::select;

use super::{Halt, Pipeline, Stage};
use crate::cancel::CancellationToken;

enum Watch {
    Pair([CancellationToken; 2]),
    Triple([CancellationToken; 3]),
    // The last token is the combined token of the subtree covering the remaining inputs.
    Tree([CancellationToken; 3], CancellationToken),
}

pub(super) struct OrStage {
    watch: Watch,
    combined: CancellationToken,
}

impl Stage for OrStage {
    const NAME: &'static str = "Or";

    fn run(&mut self) -> Result<(), Halt> {
        let combined = &self.combined;
        match &self.watch {
            Watch::Pair([a, b]) => select! {
                recv(a.done()) -> _ => (),
                recv(b.done()) -> _ => (),
                recv(combined.done()) -> _ => (),
            },
            Watch::Triple([a, b, c]) => select! {
                recv(a.done()) -> _ => (),
                recv(b.done()) -> _ => (),
                recv(c.done()) -> _ => (),
                recv(combined.done()) -> _ => (),
            },
            Watch::Tree([a, b, c], rest) => select! {
                recv(a.done()) -> _ => (),
                recv(b.done()) -> _ => (),
                recv(c.done()) -> _ => (),
                recv(rest.done()) -> _ => (),
            },
        }
        combined.cancel();
        Ok(())
    }
}

impl Pipeline {
    /// Returns a token which is cancelled the instant any of `tokens` is.
    ///
    /// No tokens yields a fresh root token that never cancels on its own. A single token is returned as is, without
    /// spawning anything. Cancelling the returned token directly also releases every stage watching the inputs.
    pub fn or(&self, tokens: &[CancellationToken]) -> CancellationToken {
        let combined = CancellationToken::new();
        let watch = match tokens {
            [] => return combined,
            [single] => return single.clone(),
            [a, b] => Watch::Pair([a.clone(), b.clone()]),
            [a, b, c] => Watch::Triple([a.clone(), b.clone(), c.clone()]),
            [a, b, c, rest @ ..] => {
                let mut remaining = rest.to_vec();
                remaining.push(combined.clone());
                Watch::Tree([a.clone(), b.clone(), c.clone()], self.or(&remaining))
            }
        };
        self.spawn(OrStage {
            watch,
            combined: combined.clone(),
        });
        combined
    }
}
