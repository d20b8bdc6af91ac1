// SPDX-License-Identifier: GPL-3.0-only

//! Single-shot result delivery
//!
//! A [`ResultChannel`] holds the host's success and error callbacks. The
//! first delivery consumes both; every later delivery is a no-op.

use crate::errors::ErrorKind;
use crate::outcome::ScanOutcome;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, warn};

type SuccessFn = Box<dyn FnOnce(String) + Send + 'static>;
type ErrorFn = Box<dyn FnOnce(ErrorKind) + Send + 'static>;

struct Callbacks {
    on_success: SuccessFn,
    on_error: ErrorFn,
}

/// Host-facing success/error callbacks, invocable once per session
pub struct ResultChannel {
    callbacks: Mutex<Option<Callbacks>>,
}

impl ResultChannel {
    pub fn new(
        on_success: impl FnOnce(String) + Send + 'static,
        on_error: impl FnOnce(ErrorKind) + Send + 'static,
    ) -> Self {
        Self {
            callbacks: Mutex::new(Some(Callbacks {
                on_success: Box::new(on_success),
                on_error: Box::new(on_error),
            })),
        }
    }

    /// Channel that forwards its single outcome to a oneshot receiver
    pub fn channel() -> (Self, oneshot::Receiver<ScanOutcome>) {
        fn send(tx: &Mutex<Option<oneshot::Sender<ScanOutcome>>>, outcome: ScanOutcome) {
            if let Ok(mut guard) = tx.lock()
                && let Some(sender) = guard.take()
            {
                // Receiver may already be gone
                let _ = sender.send(outcome);
            }
        }

        let (tx, rx) = oneshot::channel();
        let tx = Arc::new(Mutex::new(Some(tx)));
        let tx_err = tx.clone();

        let channel = Self::new(
            move |text| send(&tx, ScanOutcome::Success(text)),
            move |kind| send(&tx_err, ScanOutcome::Failure(kind)),
        );
        (channel, rx)
    }

    /// Deliver a decoded payload
    ///
    /// Returns false if a result was already delivered.
    pub fn succeed(&self, text: String) -> bool {
        self.deliver(ScanOutcome::Success(text))
    }

    /// Deliver a terminal error
    ///
    /// Returns false if a result was already delivered.
    pub fn fail(&self, kind: ErrorKind) -> bool {
        self.deliver(ScanOutcome::Failure(kind))
    }

    /// Deliver an outcome through the matching callback
    pub fn deliver(&self, outcome: ScanOutcome) -> bool {
        let Some(callbacks) = self.take() else {
            debug!(%outcome, "Result already delivered, ignoring");
            return false;
        };

        // Callbacks run outside the lock so they may call back into the session
        match outcome {
            ScanOutcome::Success(text) => (callbacks.on_success)(text),
            ScanOutcome::Failure(kind) => (callbacks.on_error)(kind),
        }
        true
    }

    /// Whether a result has been delivered
    pub fn is_delivered(&self) -> bool {
        match self.callbacks.lock() {
            Ok(guard) => guard.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }

    fn take(&self) -> Option<Callbacks> {
        match self.callbacks.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => {
                warn!("Result channel lock poisoned");
                poisoned.into_inner().take()
            }
        }
    }
}

impl fmt::Debug for ResultChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultChannel")
            .field("delivered", &self.is_delivered())
            .finish()
    }
}
