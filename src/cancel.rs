//! Cooperative cancellation shared by the lexer, parser and player.
//!
//! A [`CancelToken`] is the receiving end of a channel nobody ever writes to.
//! Cancelling drops the only sender, which disconnects the channel and wakes
//! every clone blocked in `select!` or [`CancelToken::sleep`] at once.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Returned by token operations once cancellation has been requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// The owning side: call [`Canceller::cancel`] to fire every derived token.
#[derive(Debug, Clone)]
pub struct Canceller {
    sender: Arc<Mutex<Option<Sender<()>>>>,
}

/// A cloneable handle observed by long-running work.
#[derive(Debug, Clone)]
pub struct CancelToken {
    receiver: Receiver<()>,
    deadline: Option<Instant>,
    // Keeps the channel connected for tokens with no canceller.
    _anchor: Option<Arc<Sender<()>>>,
}

/// Create a linked canceller/token pair.
pub fn cancel_pair() -> (Canceller, CancelToken) {
    let (tx, rx) = crossbeam_channel::bounded(0);
    (
        Canceller {
            sender: Arc::new(Mutex::new(Some(tx))),
        },
        CancelToken {
            receiver: rx,
            deadline: None,
            _anchor: None,
        },
    )
}

impl Canceller {
    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        // A poisoned lock still holds the sender; take it either way.
        let mut guard = match self.sender.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.take();
    }
}

impl CancelToken {
    /// A token that never fires.
    pub fn never() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(0);
        Self {
            receiver: rx,
            deadline: None,
            _anchor: Some(Arc::new(tx)),
        }
    }

    /// Derive a token that additionally fires at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Derive a token that additionally fires after `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The raw channel, for use inside `crossbeam_channel::select!`.
    ///
    /// Receiving from it only ever yields a disconnection error, which means
    /// the token was cancelled. Deadlines are not reflected here; pair it with
    /// [`CancelToken::deadline_channel`].
    pub fn channel(&self) -> &Receiver<()> {
        &self.receiver
    }

    /// A channel that becomes ready when the deadline passes, or never.
    pub fn deadline_channel(&self) -> Receiver<Instant> {
        match self.deadline {
            Some(deadline) => crossbeam_channel::at(deadline),
            None => crossbeam_channel::never(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        if self
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
        {
            return true;
        }
        matches!(self.receiver.try_recv(), Err(TryRecvError::Disconnected))
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Block for `duration`, returning early with [`Cancelled`] if the token fires.
    pub fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        if duration.is_zero() {
            return self.check();
        }
        let wake = Instant::now() + duration;
        let until = match self.deadline {
            Some(deadline) => deadline.min(wake),
            None => wake,
        };
        match self.receiver.recv_deadline(until) {
            Err(RecvTimeoutError::Timeout) => self.check(),
            // Nothing is ever sent, so any return other than a timeout is a disconnect.
            _ => Err(Cancelled),
        }
    }
}
