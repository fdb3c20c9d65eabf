use std::sync::Arc;
use std::time::Instant;

use smallvec::SmallVec;

use crate::effects::transitions::TransitionKind;
use crate::presentation::event::{DropReason, EventKind, TransitionDirection, TransitionEvent};
use crate::presentation::listener::{Listeners, TransitionListener};
use crate::presentation::state::{Content, InFlight, Phase, PresentationState};
use crate::render::compositor::LayerParams;
use crate::render::surface::Surface;
use crate::scene::model::{SlideId, SlideKey};

/// One layer of a planned frame, back-to-front.
#[derive(Clone, Debug)]
pub struct Layer {
    /// What to draw.
    pub content: Content,
    /// How to blend it.
    pub params: LayerParams,
}

/// What a frame at a given instant consists of.
#[derive(Clone, Debug)]
pub struct FramePlan {
    /// Phase after this tick.
    pub phase: Phase,
    /// Eased completion of the running transition (`1` when none is running).
    pub progress: f32,
    /// Layers in paint order.
    pub layers: SmallVec<[Layer; 2]>,
}

impl FramePlan {
    /// Slides referenced by the plan.
    pub fn slide_ids(&self) -> impl Iterator<Item = SlideId> + '_ {
        self.layers.iter().filter_map(|l| match &l.content {
            Content::Slide { slide, .. } => Some(slide.id()),
            Content::Still(_) => None,
        })
    }

    /// Slide renditions referenced by the plan.
    pub fn slide_keys(&self) -> impl Iterator<Item = SlideKey> + '_ {
        self.layers.iter().filter_map(|l| match &l.content {
            Content::Slide { slide, .. } => Some(slide.key()),
            Content::Still(_) => None,
        })
    }
}

/// The send/clear state machine.
///
/// `Idle -> TransitioningIn -> Shown -> TransitioningOut -> Idle`. At most one transition runs at
/// a time; a new send or clear during a transition supersedes it. All time is passed in
/// explicitly, and completion is only ever observed by [`TransitionEngine::tick`].
#[derive(Debug, Default)]
pub struct TransitionEngine {
    state: PresentationState,
    listeners: Listeners,
}

impl TransitionEngine {
    /// Idle engine without listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle engine notifying `listeners`.
    pub fn with_listeners(listeners: Listeners) -> Self {
        Self {
            state: PresentationState::default(),
            listeners,
        }
    }

    /// Register another listener.
    pub fn add_listener(&mut self, listener: Box<dyn TransitionListener>) {
        self.listeners.add(listener);
    }

    /// Current state.
    pub fn state(&self) -> &PresentationState {
        &self.state
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Dispatch on the event kind.
    ///
    /// `snapshot` is the last composed frame; it becomes the starting point when this event
    /// interrupts a running transition.
    pub fn submit(
        &mut self,
        event: TransitionEvent,
        now: Instant,
        snapshot: Option<Arc<Surface>>,
    ) {
        match event.kind() {
            EventKind::Send(_) => self.send(event, now, snapshot),
            EventKind::Clear => self.clear(event, now, snapshot),
        }
    }

    /// Begin transitioning `event`'s slide in.
    ///
    /// A clear event passed here is treated as [`TransitionEngine::clear`].
    pub fn send(&mut self, event: TransitionEvent, now: Instant, snapshot: Option<Arc<Surface>>) {
        let Some(slide) = event.slide().cloned() else {
            return self.clear(event, now, snapshot);
        };

        let from = match self.state.phase {
            Phase::Idle => None,
            Phase::Shown => {
                let same = self
                    .state
                    .visible()
                    .is_some_and(|v| v.is_same_rendition(&slide));
                if same {
                    tracing::debug!(event = event.id().get(), "send of the shown slide dropped");
                    self.listeners.dropped(event.id(), DropReason::NoOp);
                    return;
                }
                self.state.visible_content()
            }
            Phase::TransitioningIn | Phase::TransitioningOut => self.supersede(snapshot),
        };

        self.state.from = from;
        self.state.visible = Some((slide, now));
        self.begin(event, TransitionDirection::In, now);
    }

    /// Begin transitioning the visible content out.
    pub fn clear(&mut self, event: TransitionEvent, now: Instant, snapshot: Option<Arc<Surface>>) {
        let from = match self.state.phase {
            Phase::Idle => {
                tracing::debug!(event = event.id().get(), "clear while idle dropped");
                self.listeners.dropped(event.id(), DropReason::NoOp);
                return;
            }
            Phase::Shown => self.state.visible_content(),
            Phase::TransitioningIn | Phase::TransitioningOut => self.supersede(snapshot),
        };

        self.state.from = from;
        self.state.visible = None;
        self.begin(event, TransitionDirection::Out, now);
    }

    /// Abandon the running transition; returns what the next one starts from.
    fn supersede(&mut self, snapshot: Option<Arc<Surface>>) -> Option<Content> {
        let fallback = match self.state.phase {
            Phase::TransitioningIn => self.state.visible_content(),
            _ => self.state.from.take(),
        };
        if let Some(old) = self.state.in_flight.take() {
            tracing::debug!(event = old.event.id().get(), "running transition superseded");
            self.listeners.dropped(old.event.id(), DropReason::Superseded);
        }
        snapshot.map(Content::Still).or(fallback)
    }

    fn begin(&mut self, event: TransitionEvent, direction: TransitionDirection, now: Instant) {
        let info = event.info(direction);
        self.state.phase = match direction {
            TransitionDirection::In => Phase::TransitioningIn,
            TransitionDirection::Out => Phase::TransitioningOut,
        };
        tracing::debug!(
            event = event.id().get(),
            phase = %self.state.phase,
            duration_ms = event.duration().as_millis() as u64,
            "transition begins"
        );
        self.state.in_flight = Some(InFlight {
            event,
            direction,
            started: now,
        });
        match direction {
            TransitionDirection::In => self.listeners.in_begin(&info),
            TransitionDirection::Out => self.listeners.out_begin(&info),
        }
    }

    /// Advance to `now`: complete an elapsed transition and plan the frame.
    pub fn tick(&mut self, now: Instant) -> FramePlan {
        let mut progress = 1.0f32;
        let mut effect = TransitionKind::Cut;

        let elapsed_state = self.state.in_flight.as_ref().map(|f| {
            let elapsed = now.saturating_duration_since(f.started);
            (elapsed >= f.event.duration(), elapsed)
        });
        match elapsed_state {
            Some((true, _)) => self.complete(),
            Some((false, elapsed)) => {
                if let Some(f) = &self.state.in_flight {
                    let (t, d) = (elapsed.as_secs_f64(), f.event.duration().as_secs_f64());
                    let eased = match f.direction {
                        TransitionDirection::In => f.event.ease().ease_in(t, d),
                        TransitionDirection::Out => f.event.ease().ease_out(t, d),
                    };
                    progress = eased as f32;
                    effect = f.event.effect();
                }
            }
            None => {}
        }

        let mut layers = SmallVec::new();
        let full = |content: Content| layer(content, 1.0, TransitionKind::Cut, now);
        match self.state.phase {
            Phase::Idle => {}
            Phase::Shown => layers.extend(self.state.visible_content().map(full)),
            Phase::TransitioningIn => {
                layers.extend(self.state.from.clone().map(full));
                layers.extend(
                    self.state
                        .visible_content()
                        .map(|c| layer(c, progress, effect, now)),
                );
            }
            Phase::TransitioningOut => {
                layers.extend(
                    self.state
                        .from
                        .clone()
                        .map(|c| layer(c, 1.0 - progress, effect, now)),
                );
            }
        }

        FramePlan {
            phase: self.state.phase,
            progress,
            layers,
        }
    }

    fn complete(&mut self) {
        let Some(done) = self.state.in_flight.take() else {
            return;
        };
        let info = done.event.info(done.direction);
        self.state.from = None;
        match done.direction {
            TransitionDirection::In => {
                self.state.phase = Phase::Shown;
                tracing::debug!(event = info.event.get(), "in-transition complete");
                self.listeners.in_complete(&info);
            }
            TransitionDirection::Out => {
                self.state.phase = Phase::Idle;
                self.state.visible = None;
                tracing::debug!(event = info.event.get(), "out-transition complete");
                self.listeners.out_complete(&info);
            }
        }
    }
}

fn layer(content: Content, progress: f32, effect: TransitionKind, now: Instant) -> Layer {
    let media_time = match &content {
        Content::Slide { since, .. } => now.saturating_duration_since(*since).as_secs_f64(),
        Content::Still(_) => 0.0,
    };
    Layer {
        content,
        params: LayerParams {
            progress,
            effect,
            media_time,
        },
    }
}

#[cfg(test)]
#[path = "../../tests/unit/presentation/engine.rs"]
mod tests;
