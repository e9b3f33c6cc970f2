// src/completion.rs
//! One-shot completion handles for asynchronous feed loads.
//!
//! The loader receives a [`CompletionSignal`] and fires it exactly once when rendering is
//! done. The waiting side holds the matching [`Completion`] and waits with an explicit limit.

use log::trace;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionError {
    #[error("completion signal did not fire within {0:?}")]
    TimedOut(Duration),

    #[error("completion signal was dropped without firing")]
    Abandoned,
}

#[derive(Debug)]
pub struct CompletionSignal {
    tx: oneshot::Sender<()>,
}

impl CompletionSignal {
    /// Fires the signal. Consuming `self` makes a second fire impossible.
    pub fn fire(self) {
        if self.tx.send(()).is_err() {
            trace!("Completion fired after the waiter went away");
        }
    }
}

#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<()>,
}

impl Completion {
    pub async fn wait(self, limit: Duration) -> Result<(), CompletionError> {
        match tokio::time::timeout(limit, self.rx).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(CompletionError::Abandoned),
            Err(_) => Err(CompletionError::TimedOut(limit)),
        }
    }
}

pub fn completion_pair() -> (CompletionSignal, Completion) {
    let (tx, rx) = oneshot::channel();
    (CompletionSignal { tx }, Completion { rx })
}
