//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Coordinator (coordinator.rs):
//!     initialize → start registrars → start server → await completion → shutdown
//!
//! Cancellation (shutdown.rs):
//!     Coordinator closes the signal once → every sampling loop exits
//!
//! Completion (barrier.rs):
//!     Serving task finishes → coordinator wait returns
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → stop serving, drain, then shut down
//! ```
//!
//! # Design Decisions
//! - Ordered startup: registrars first, server last (no scrape before descriptors exist)
//! - Ordered shutdown: stop serving, drain, then cancel sampling
//! - Only the server drain is time-bounded

pub mod barrier;
pub mod coordinator;
pub mod shutdown;
pub mod signals;
pub mod state;

pub use barrier::CompletionBarrier;
pub use coordinator::{Coordinator, LifecycleError};
pub use shutdown::{CancellationSignal, SignalListener};
pub use state::RunState;
