use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::animation::ease::{Ease, EaseId};
use crate::animation::registry::EasingRegistry;
use crate::assets::text::TextRasterizer;
use crate::config::PresentationConfig;
use crate::effects::transitions::{TransitionKind, parse_transition};
use crate::foundation::core::{Canvas, Rgba8Premul};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::presentation::engine::{FramePlan, TransitionEngine};
use crate::presentation::event::{EventId, TransitionEvent};
use crate::presentation::listener::TransitionListener;
use crate::presentation::state::{Content, Phase, PresentationState};
use crate::render::compositor::{CompositeStats, Compositor};
use crate::render::surface::{FrameRGBA, Surface};
use crate::render::surface_pool::SurfacePoolStats;
use crate::scene::model::Slide;

/// Transition engine, compositor and frame buffer behind one synchronous per-frame API.
///
/// The presenter is single-threaded; [`crate::PresentationThread`] moves one onto its own thread.
#[derive(Debug)]
pub struct Presenter {
    config: PresentationConfig,
    registry: EasingRegistry,
    default_ease: Ease,
    default_effect: TransitionKind,
    clear_color: Rgba8Premul,
    engine: TransitionEngine,
    compositor: Compositor,
    frame: Surface,
    rendered: bool,
}

impl Presenter {
    /// Build from a validated config, loading fonts as configured.
    pub fn new(config: PresentationConfig, registry: EasingRegistry) -> SlidecastResult<Self> {
        let dirs: Vec<&Path> = config.font_dirs.iter().map(|p| p.as_path()).collect();
        let text = if config.system_fonts || !dirs.is_empty() {
            TextRasterizer::with_fonts(config.system_fonts, &dirs)
        } else {
            TextRasterizer::without_fonts()
        };
        Self::with_text(config, registry, text)
    }

    /// Build with an explicit text rasterizer.
    pub fn with_text(
        config: PresentationConfig,
        registry: EasingRegistry,
        text: TextRasterizer,
    ) -> SlidecastResult<Self> {
        config.validate()?;
        let default_ease = registry.get(config.default_easing).ok_or_else(|| {
            SlidecastError::validation(format!(
                "default easing id {} is not registered",
                config.default_easing.0
            ))
        })?;
        let default_effect = parse_transition(&config.transition)?;
        let canvas = config.canvas;
        Ok(Self {
            default_ease,
            default_effect,
            clear_color: config.clear_color.to_rgba8_premul(),
            engine: TransitionEngine::new(),
            compositor: Compositor::new(config.cache, text),
            frame: Surface::new(canvas.width, canvas.height)?,
            rendered: false,
            config,
            registry,
        })
    }

    /// Register a lifecycle listener.
    pub fn add_listener(&mut self, listener: Box<dyn TransitionListener>) {
        self.engine.add_listener(listener);
    }

    /// Configuration in effect (canvas reflects the latest resize).
    pub fn config(&self) -> &PresentationConfig {
        &self.config
    }

    /// Easing table used to resolve ids.
    pub fn registry(&self) -> &EasingRegistry {
        &self.registry
    }

    /// Current output size.
    pub fn canvas(&self) -> Canvas {
        self.config.canvas
    }

    /// The curve for `id`, or the configured default (with a warning) when `id` is unknown.
    pub fn resolve_ease(&self, id: EaseId) -> Ease {
        match self.registry.get(id) {
            Some(ease) => ease,
            None => {
                tracing::warn!(
                    id = id.0,
                    fallback = self.default_ease.name(),
                    "unknown easing id; using the default"
                );
                self.default_ease
            }
        }
    }

    /// Build a send event with the configured effect.
    pub fn send_event_for(
        &self,
        slide: Arc<Slide>,
        duration: Duration,
        easing: EaseId,
    ) -> TransitionEvent {
        TransitionEvent::send(slide, duration, self.resolve_ease(easing), self.default_effect)
    }

    /// Build a clear event with the configured effect.
    pub fn clear_event_for(&self, duration: Duration, easing: EaseId) -> TransitionEvent {
        TransitionEvent::clear(duration, self.resolve_ease(easing), self.default_effect)
    }

    /// Transition `slide` in, starting at `now`.
    pub fn send(
        &mut self,
        slide: Arc<Slide>,
        duration: Duration,
        easing: EaseId,
        now: Instant,
    ) -> EventId {
        let ev = self.send_event_for(slide, duration, easing);
        self.send_event(ev, now)
    }

    /// Transition the visible content out, starting at `now`.
    pub fn clear(&mut self, duration: Duration, easing: EaseId, now: Instant) -> EventId {
        let ev = self.clear_event_for(duration, easing);
        self.send_event(ev, now)
    }

    /// Hand a prepared event to the engine.
    pub fn send_event(&mut self, event: TransitionEvent, now: Instant) -> EventId {
        let id = event.id();
        let snapshot = (self.rendered && self.engine.phase().is_transitioning())
            .then(|| Arc::new(self.frame.clone()));
        self.engine.submit(event, now, snapshot);
        id
    }

    /// Advance to `now` and compose the frame.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn render(&mut self, now: Instant) -> SlidecastResult<&Surface> {
        let plan = self.engine.tick(now);
        self.compose(&plan)?;
        let keep: Vec<_> = plan.slide_keys().collect();
        self.compositor.retain(keep);
        self.rendered = true;
        Ok(&self.frame)
    }

    fn compose(&mut self, plan: &FramePlan) -> SlidecastResult<()> {
        self.frame.clear(self.clear_color);
        for layer in &plan.layers {
            match &layer.content {
                Content::Slide { slide, .. } => {
                    self.compositor
                        .composite_onto(slide, layer.params, &mut self.frame)?;
                }
                Content::Still(still) => {
                    if still.desc() != self.frame.desc() {
                        tracing::debug!("snapshot predates a resize; skipped");
                        continue;
                    }
                    layer
                        .params
                        .effect
                        .apply(&mut self.frame, still, layer.params.progress)?;
                }
            }
        }
        Ok(())
    }

    /// Last composed frame.
    pub fn frame(&self) -> &Surface {
        &self.frame
    }

    /// Copy of the last composed frame.
    pub fn current_frame(&self) -> FrameRGBA {
        self.frame.to_frame()
    }

    /// Change the output size; caches rebuild on the next frame.
    pub fn resize(&mut self, width: u32, height: u32) -> SlidecastResult<()> {
        let canvas = Canvas::new(width, height)?;
        if canvas == self.config.canvas {
            return Ok(());
        }
        self.frame = Surface::new(width, height)?;
        self.config.canvas = canvas;
        self.rendered = false;
        tracing::debug!(width, height, "presentation resized");
        Ok(())
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    /// Engine state.
    pub fn state(&self) -> &PresentationState {
        self.engine.state()
    }

    /// Compositor counters.
    pub fn stats(&self) -> CompositeStats {
        self.compositor.stats()
    }

    /// Surface pool counters.
    pub fn pool_stats(&self) -> SurfacePoolStats {
        self.compositor.pool_stats()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/presentation/presenter.rs"]
mod tests;
