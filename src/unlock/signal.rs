//! One-shot completion signals.
//!
//! A signal starts `Pending` and settles at most once, to either `Resolved`
//! or `Rejected`. Settling an already-settled signal is a no-op. The settle
//! side ([`SignalHandle`]) stays inside the crate; consumers only ever see
//! the cloneable, awaitable [`CompletionSignal`].

use tokio::sync::watch;

use crate::error::SignalError;

/// Observable state of a completion signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalState {
    /// Not settled yet.
    Pending,
    /// Settled successfully.
    Resolved,
    /// Settled with a failure reason.
    Rejected(String),
}

/// Read side of a one-shot signal.
#[derive(Debug, Clone)]
pub struct CompletionSignal {
    rx: watch::Receiver<SignalState>,
}

impl CompletionSignal {
    /// Returns the current state without waiting.
    #[must_use]
    pub fn state(&self) -> SignalState {
        self.rx.borrow().clone()
    }

    /// Whether the signal has resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(*self.rx.borrow(), SignalState::Resolved)
    }

    /// Whether the signal is still pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(*self.rx.borrow(), SignalState::Pending)
    }

    /// Waits until the signal settles.
    ///
    /// A signal that never settles keeps this future pending forever.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::Rejected`] if the signal was rejected, or
    /// [`SignalError::Abandoned`] if its owner was dropped while pending.
    pub async fn wait(&self) -> Result<(), SignalError> {
        let mut rx = self.rx.clone();
        let settled = rx
            .wait_for(|state| !matches!(state, SignalState::Pending))
            .await
            .map_err(|_| SignalError::Abandoned)?
            .clone();

        match settled {
            SignalState::Rejected(reason) => Err(SignalError::Rejected(reason)),
            SignalState::Resolved | SignalState::Pending => Ok(()),
        }
    }
}

/// Settle side of a one-shot signal.
#[derive(Debug)]
pub(crate) struct SignalHandle {
    tx: watch::Sender<SignalState>,
}

impl SignalHandle {
    /// Resolves the signal. Returns `true` only for the call that settled it.
    pub(crate) fn resolve(&self) -> bool {
        self.settle(SignalState::Resolved)
    }

    /// Rejects the signal. Returns `true` only for the call that settled it.
    pub(crate) fn reject(&self, reason: impl Into<String>) -> bool {
        self.settle(SignalState::Rejected(reason.into()))
    }

    fn settle(&self, next: SignalState) -> bool {
        self.tx.send_if_modified(|state| {
            if matches!(state, SignalState::Pending) {
                *state = next;
                true
            } else {
                false
            }
        })
    }
}

/// Creates a pending signal pair.
pub(crate) fn signal() -> (SignalHandle, CompletionSignal) {
    let (tx, rx) = watch::channel(SignalState::Pending);
    (SignalHandle { tx }, CompletionSignal { rx })
}
