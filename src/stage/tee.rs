use crossbeam::channel::Select;

use super::{guard::Guard, Halt, Pipeline, Stage};
use crate::{
    cancel::CancellationToken,
    channel::{Receiver, Sender},
};

enum Offer {
    Cancelled,
    Accepted(usize),
    // The reader of this output hung up.
    Gone(usize),
}

/// Delivers every item to both outputs before reading the next one.
///
/// An item is offered to every output still waiting for it in a single select, so a fast reader never waits behind a
/// slow one. If the token fires mid-delivery, the item may have reached zero, one or both outputs.
pub(super) struct TeeStage<T> {
    guard: Guard,
    input: Receiver<T>,
    outputs: [Option<Sender<T>>; 2],
}

impl<T: Clone> TeeStage<T> {
    fn offer(&self, value: &T, pending: &[bool; 2]) -> Offer {
        let mut sel = Select::new();
        let cancel = sel.recv(self.guard.done());
        let targets: Vec<_> = self
            .outputs
            .iter()
            .enumerate()
            .filter(|(slot, _)| pending[*slot])
            .filter_map(|(slot, output)| output.as_ref().map(|output| (slot, output)))
            .map(|(slot, output)| (sel.send(output), slot, output))
            .collect();

        let oper = sel.select();
        let index = oper.index();
        if index == cancel {
            let _ = oper.recv(self.guard.done());
            return Offer::Cancelled;
        }
        match targets.iter().find(|(op, _, _)| *op == index) {
            Some((_, slot, output)) => match oper.send(output, value.clone()) {
                Ok(()) => Offer::Accepted(*slot),
                Err(_) => Offer::Gone(*slot),
            },
            None => unreachable!("Select returned an operation that was never registered"),
        }
    }

    fn deliver(&mut self, value: T) -> Result<(), Halt> {
        let mut pending = [self.outputs[0].is_some(), self.outputs[1].is_some()];
        while pending.contains(&true) {
            self.guard.check()?;
            match self.offer(&value, &pending) {
                Offer::Cancelled => return Err(Halt::Cancelled),
                Offer::Accepted(slot) => pending[slot] = false,
                Offer::Gone(slot) => {
                    pending[slot] = false;
                    self.outputs[slot] = None;
                }
            }
        }
        if self.outputs.iter().all(Option::is_none) {
            return Err(Halt::Disconnected);
        }
        Ok(())
    }
}

impl<T: Clone + Send + 'static> Stage for TeeStage<T> {
    const NAME: &'static str = "Tee";

    fn run(&mut self) -> Result<(), Halt> {
        loop {
            let value = self.guard.recv(&self.input)?;
            self.deliver(value)?;
        }
    }
}

impl Pipeline {
    /// Splits `source` into two outputs which both observe every item, in source order.
    ///
    /// The outputs may be read at different paces; the stage only advances to the next item once both outputs took the
    /// current one. If one reader hangs up, the other keeps receiving.
    pub fn tee<T: Clone + Send + 'static>(
        &self,
        token: &CancellationToken,
        source: Receiver<T>,
    ) -> (Receiver<T>, Receiver<T>) {
        let (first, first_relay) = self.channel();
        let (second, second_relay) = self.channel();
        self.spawn(TeeStage {
            guard: Guard::new(token.clone()),
            input: source,
            outputs: [Some(first), Some(second)],
        });
        (first_relay, second_relay)
    }
}
