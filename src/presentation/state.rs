use std::sync::Arc;
use std::time::Instant;

use crate::presentation::event::{EventId, TransitionDirection, TransitionEvent};
use crate::render::surface::Surface;
use crate::scene::model::Slide;

/// Where the presentation is in its show/clear cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing shown.
    #[default]
    Idle,
    /// A slide is transitioning in.
    TransitioningIn,
    /// A slide is fully shown.
    Shown,
    /// Content is transitioning out.
    TransitioningOut,
}

impl Phase {
    /// `true` while a transition is running.
    pub fn is_transitioning(self) -> bool {
        matches!(self, Self::TransitioningIn | Self::TransitioningOut)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::TransitioningIn => "transitioning-in",
            Self::Shown => "shown",
            Self::TransitioningOut => "transitioning-out",
        })
    }
}

/// Something the compositor can draw as one layer.
#[derive(Clone, Debug)]
pub enum Content {
    /// A slide, shown since `since` (media playback is measured from it).
    Slide {
        /// The slide.
        slide: Arc<Slide>,
        /// When it started transitioning in.
        since: Instant,
    },
    /// A frozen, fully composed frame, used when a transition is interrupted mid-way.
    Still(Arc<Surface>),
}

#[derive(Clone, Debug)]
pub(crate) struct InFlight {
    pub(crate) event: TransitionEvent,
    pub(crate) direction: TransitionDirection,
    pub(crate) started: Instant,
}

/// Presentation state owned by the engine.
#[derive(Clone, Debug, Default)]
pub struct PresentationState {
    pub(crate) phase: Phase,
    /// Slide that is shown or transitioning in.
    pub(crate) visible: Option<(Arc<Slide>, Instant)>,
    /// At most one running transition.
    pub(crate) in_flight: Option<InFlight>,
    /// Content under an in-transition, or the outgoing content of an out-transition.
    pub(crate) from: Option<Content>,
}

impl PresentationState {
    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Slide shown or transitioning in.
    pub fn visible(&self) -> Option<&Arc<Slide>> {
        self.visible.as_ref().map(|(s, _)| s)
    }

    /// Event whose transition is running.
    pub fn in_flight(&self) -> Option<EventId> {
        self.in_flight.as_ref().map(|f| f.event.id())
    }

    /// When the running transition started.
    pub fn in_flight_started(&self) -> Option<Instant> {
        self.in_flight.as_ref().map(|f| f.started)
    }

    /// Content the running transition started from.
    pub fn from(&self) -> Option<&Content> {
        self.from.as_ref()
    }

    pub(crate) fn visible_content(&self) -> Option<Content> {
        self.visible.as_ref().map(|(slide, since)| Content::Slide {
            slide: slide.clone(),
            since: *since,
        })
    }
}
