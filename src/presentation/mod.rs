//! Live presentation: the transition state machine, lifecycle listeners, the synchronous
//! presenter and the presentation thread that drives it.

/// Send/clear state machine and frame planning.
pub mod engine;
/// Transition events and notification payloads.
pub mod event;
/// Lifecycle listeners.
pub mod listener;
/// Synchronous presenter.
pub mod presenter;
/// Presentation state and phases.
pub mod state;
/// The presentation thread.
pub mod worker;
