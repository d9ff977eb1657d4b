//! Consumer-side helpers for driving pipelines under cancellation.
//! A [Case] describes when to cancel (before starting, after some number of observed items, after some elapsed
//! time), and [Case::collect_until] adds a per-value trigger; whichever fires first wins. Collection always keeps reading until the pipeline closes, so a stage
//! that fails to close its output shows up as a hang rather than as a silently short result.

use std::{thread, time::Duration};

use derive_builder::Builder;

use crate::{
    cancel::CancellationToken,
    channel::{Receiver, Source},
};

/// Cancellation triggers for a single run of a pipeline.
#[derive(Clone, Debug, Default, Builder)]
#[builder(pattern = "owned", default)]
pub struct Case {
    /// Cancel the token before the pipeline is even constructed.
    pub cancel_at_start: bool,

    /// Cancel once this many items were observed on an output. Later items are drained and discarded.
    #[builder(setter(strip_option))]
    pub cancel_after_items: Option<usize>,

    /// Cancel once this much time has passed since the token was created.
    #[builder(setter(strip_option))]
    pub cancel_after: Option<Duration>,
}

impl Case {
    /// Builds the token the pipeline under test should run with.
    pub fn token(&self) -> CancellationToken {
        let root = CancellationToken::new();
        let token = match self.cancel_after {
            Some(timeout) => CancellationToken::with_timeout(&root, timeout),
            None => root,
        };
        if self.cancel_at_start {
            token.cancel();
        }
        token
    }

    /// Constructs a pipeline with `invoke` and collects what it emits.
    /// Returns `None` when `invoke` produced no pipeline at all.
    pub fn collect<S, F>(&self, invoke: F) -> Option<Vec<S::Item>>
    where
        S: Source,
        F: FnOnce(&CancellationToken) -> S,
    {
        self.collect_until(invoke, |_| false)
    }

    /// Like [Case::collect], additionally cancelling right after the first item for which `stop` holds.
    /// That item is still part of the result.
    pub fn collect_until<S, F, P>(&self, invoke: F, stop: P) -> Option<Vec<S::Item>>
    where
        S: Source,
        F: FnOnce(&CancellationToken) -> S,
        P: FnMut(&S::Item) -> bool,
    {
        let token = self.token();
        let output = invoke(&token).into_source()?;
        Some(self.record(&token, &output, stop))
    }

    /// Like [Case::collect] for pipelines with two outputs, reading both concurrently.
    /// The item trigger fires as soon as either output reaches the limit.
    pub fn collect_pair<T, F>(&self, invoke: F) -> (Vec<T>, Vec<T>)
    where
        T: Send,
        F: FnOnce(&CancellationToken) -> (Receiver<T>, Receiver<T>),
    {
        let token = self.token();
        let (first, second) = invoke(&token);
        thread::scope(|s| {
            let reader = s.spawn(|| self.record(&token, &second, |_| false));
            let got = self.record(&token, &first, |_| false);
            let other = reader
                .join()
                .unwrap_or_else(|err| std::panic::resume_unwind(err));
            (got, other)
        })
    }

    fn record<T, P>(&self, token: &CancellationToken, output: &Receiver<T>, mut stop: P) -> Vec<T>
    where
        P: FnMut(&T) -> bool,
    {
        let limit = self.cancel_after_items.unwrap_or(usize::MAX);
        let mut recording = limit > 0;
        if !recording {
            token.cancel();
        }
        let mut got = vec![];
        for value in output.iter() {
            if !recording {
                continue;
            }
            let stopped = stop(&value);
            got.push(value);
            if stopped || got.len() == limit {
                recording = false;
                token.cancel();
            }
        }
        got
    }
}
