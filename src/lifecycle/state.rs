//! Run state machine.
//!
//! # States
//! ```text
//! Created → RegistrarsStarting → Serving → Draining → Stopped
//! ```
//!
//! Transitions only move forward. Skipping ahead is allowed (a failed
//! registrar goes straight to `Stopped`), staying put or going back is not.
//! `Stopped` is terminal.

use std::fmt;

/// Where a single exporter run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    /// Signal and barrier exist, nothing started.
    Created,
    /// Registrars are being invoked.
    RegistrarsStarting,
    /// The HTTP server has been started.
    Serving,
    /// Stop requested; in-flight scrapes are finishing.
    Draining,
    /// Signal closed and server released.
    Stopped,
}

impl RunState {
    pub fn can_advance_to(self, next: RunState) -> bool {
        next > self
    }

    pub fn is_terminal(self) -> bool {
        self == RunState::Stopped
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Created => "created",
            RunState::RegistrarsStarting => "registrars-starting",
            RunState::Serving => "serving",
            RunState::Draining => "draining",
            RunState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
