//! The double guard: every blocking receive and every blocking send of a stage races against cancellation.

use std::time::Duration;

use crossbeam::channel::{self, select};

use super::Halt;
use crate::{
    cancel::{CancellationToken, Done},
    channel::{Receiver, Sender},
};

pub(crate) struct Guard {
    token: CancellationToken,
}

impl Guard {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub(crate) fn done(&self) -> &Done {
        self.token.done()
    }

    /// Fails fast once the token is cancelled, so a cancelled stage never races a ready channel.
    pub(crate) fn check(&self) -> Result<(), Halt> {
        if self.token.is_cancelled() {
            Err(Halt::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Waits for the next value of `source`, or for cancellation.
    pub(crate) fn recv<T>(&self, source: &Receiver<T>) -> Result<T, Halt> {
        self.check()?;
        select! {
            recv(self.done()) -> _ => Err(Halt::Cancelled),
            recv(source) -> msg => msg.map_err(|_| Halt::Exhausted),
        }
    }

    /// Hands `value` to `output`, or abandons it on cancellation.
    pub(crate) fn send<T>(&self, output: &Sender<T>, value: T) -> Result<(), Halt> {
        self.check()?;
        select! {
            recv(self.done()) -> _ => Err(Halt::Cancelled),
            send(output, value) -> res => res.map_err(|_| Halt::Disconnected),
        }
    }

    /// Sleeps for `delay`, waking early on cancellation.
    pub(crate) fn wait(&self, delay: Duration) -> Result<(), Halt> {
        self.check()?;
        select! {
            recv(self.done()) -> _ => Err(Halt::Cancelled),
            recv(channel::after(delay)) -> _ => Ok(()),
        }
    }
}
