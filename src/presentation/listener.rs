use std::sync::{Arc, Mutex};

use crate::presentation::event::{DropReason, EventId, TransitionInfo};

/// Observer of transition lifecycle notifications. All methods default to no-ops.
///
/// Callbacks run on the thread that drives the engine, synchronously inside `send`, `clear` or
/// `tick`; keep them short.
pub trait TransitionListener: Send {
    /// An in-transition started.
    fn in_transition_begin(&mut self, _info: &TransitionInfo) {}
    /// An in-transition reached its end; the slide is now shown.
    fn in_transition_complete(&mut self, _info: &TransitionInfo) {}
    /// An out-transition started.
    fn out_transition_begin(&mut self, _info: &TransitionInfo) {}
    /// An out-transition reached its end; nothing is shown.
    fn out_transition_complete(&mut self, _info: &TransitionInfo) {}
    /// An event was dropped instead of (or before) completing.
    fn event_dropped(&mut self, _event: EventId, _reason: DropReason) {}
}

/// The engine's explicit listener list, notified in registration order.
#[derive(Default)]
pub struct Listeners {
    inner: Vec<Box<dyn TransitionListener>>,
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl Listeners {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn add(&mut self, listener: Box<dyn TransitionListener>) {
        self.inner.push(listener);
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub(crate) fn in_begin(&mut self, info: &TransitionInfo) {
        self.inner.iter_mut().for_each(|l| l.in_transition_begin(info));
    }

    pub(crate) fn in_complete(&mut self, info: &TransitionInfo) {
        self.inner
            .iter_mut()
            .for_each(|l| l.in_transition_complete(info));
    }

    pub(crate) fn out_begin(&mut self, info: &TransitionInfo) {
        self.inner
            .iter_mut()
            .for_each(|l| l.out_transition_begin(info));
    }

    pub(crate) fn out_complete(&mut self, info: &TransitionInfo) {
        self.inner
            .iter_mut()
            .for_each(|l| l.out_transition_complete(info));
    }

    pub(crate) fn dropped(&mut self, event: EventId, reason: DropReason) {
        self.inner
            .iter_mut()
            .for_each(|l| l.event_dropped(event, reason));
    }
}

/// One recorded lifecycle notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// `in_transition_begin`.
    InBegin(EventId),
    /// `in_transition_complete`.
    InComplete(EventId),
    /// `out_transition_begin`.
    OutBegin(EventId),
    /// `out_transition_complete`.
    OutComplete(EventId),
    /// `event_dropped`.
    Dropped(EventId, DropReason),
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InBegin(id) => write!(f, "in-begin #{}", id.get()),
            Self::InComplete(id) => write!(f, "in-complete #{}", id.get()),
            Self::OutBegin(id) => write!(f, "out-begin #{}", id.get()),
            Self::OutComplete(id) => write!(f, "out-complete #{}", id.get()),
            Self::Dropped(id, reason) => write!(f, "dropped #{} ({reason:?})", id.get()),
        }
    }
}

/// Listener that records every notification; clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<LifecycleEvent>>>,
}

impl EventLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn snapshot(&self) -> Vec<LifecycleEvent> {
        self.lock().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LifecycleEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, ev: LifecycleEvent) {
        self.lock().push(ev);
    }
}

impl TransitionListener for EventLog {
    fn in_transition_begin(&mut self, info: &TransitionInfo) {
        self.record(LifecycleEvent::InBegin(info.event));
    }

    fn in_transition_complete(&mut self, info: &TransitionInfo) {
        self.record(LifecycleEvent::InComplete(info.event));
    }

    fn out_transition_begin(&mut self, info: &TransitionInfo) {
        self.record(LifecycleEvent::OutBegin(info.event));
    }

    fn out_transition_complete(&mut self, info: &TransitionInfo) {
        self.record(LifecycleEvent::OutComplete(info.event));
    }

    fn event_dropped(&mut self, event: EventId, reason: DropReason) {
        self.record(LifecycleEvent::Dropped(event, reason));
    }
}
