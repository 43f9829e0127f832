//! Cancellation signal shared by the coordinator and the registrars.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// Broadcast-once cancellation signal.
///
/// Owned by the coordinator. Everything else gets a [`SignalListener`], which
/// can observe the close event but never trigger it.
#[derive(Debug)]
pub struct CancellationSignal {
    token: CancellationToken,
    closed: AtomicBool,
}

impl CancellationSignal {
    /// Create a new, open signal.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Hand out a read-only view of the signal.
    pub fn listener(&self) -> SignalListener {
        SignalListener {
            token: self.token.clone(),
        }
    }

    /// Close the signal and wake every listener.
    ///
    /// Returns `true` for the call that actually closed it. Later calls are
    /// no-ops and return `false`.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only handle on a [`CancellationSignal`].
///
/// Cheap to clone; every sampling loop holds its own copy.
#[derive(Debug, Clone)]
pub struct SignalListener {
    token: CancellationToken,
}

impl SignalListener {
    /// Resolves once the signal is closed. Resolves immediately if it already is.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
