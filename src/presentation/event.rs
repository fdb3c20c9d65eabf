use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::animation::ease::Ease;
use crate::effects::transitions::TransitionKind;
use crate::scene::model::{Slide, SlideId};

static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique, monotonically increasing id of a [`TransitionEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u64);

impl EventId {
    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// What a [`TransitionEvent`] asks for.
#[derive(Clone, Debug)]
pub enum EventKind {
    /// Transition `slide` in.
    Send(Arc<Slide>),
    /// Transition the visible content out.
    Clear,
}

/// A request to start an "in" (send) or "out" (clear) transition.
#[derive(Clone, Debug)]
pub struct TransitionEvent {
    id: EventId,
    kind: EventKind,
    duration: Duration,
    ease: Ease,
    effect: TransitionKind,
}

impl TransitionEvent {
    fn new(kind: EventKind, duration: Duration, ease: Ease, effect: TransitionKind) -> Self {
        Self {
            id: EventId(NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed)),
            kind,
            duration,
            ease,
            effect,
        }
    }

    /// Transition `slide` in over `duration`.
    pub fn send(slide: Arc<Slide>, duration: Duration, ease: Ease, effect: TransitionKind) -> Self {
        Self::new(EventKind::Send(slide), duration, ease, effect)
    }

    /// Transition the visible content out over `duration`.
    pub fn clear(duration: Duration, ease: Ease, effect: TransitionKind) -> Self {
        Self::new(EventKind::Clear, duration, ease, effect)
    }

    /// Id.
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Request kind.
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Transition length.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Easing curve.
    pub fn ease(&self) -> Ease {
        self.ease
    }

    /// Blend effect.
    pub fn effect(&self) -> TransitionKind {
        self.effect
    }

    /// Target slide of a send.
    pub fn slide(&self) -> Option<&Arc<Slide>> {
        match &self.kind {
            EventKind::Send(s) => Some(s),
            EventKind::Clear => None,
        }
    }

    pub(crate) fn info(&self, direction: TransitionDirection) -> TransitionInfo {
        TransitionInfo {
            event: self.id,
            direction,
            slide: self.slide().map(|s| s.id()),
            duration: self.duration,
        }
    }
}

/// Whether a transition brings content in or takes it out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionDirection {
    /// Send.
    In,
    /// Clear.
    Out,
}

/// What listeners are told about a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionInfo {
    /// Event driving the transition.
    pub event: EventId,
    /// In or out.
    pub direction: TransitionDirection,
    /// Slide being sent, for in-transitions.
    pub slide: Option<SlideId>,
    /// Transition length.
    pub duration: Duration,
}

/// Why an event produced no begin/complete callbacks (or stopped producing them).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// A newer event replaced it while its transition was running.
    Superseded,
    /// It would not have changed anything (clear while idle, re-send of the shown slide).
    NoOp,
}
