//! Slidecast composes presentation slides into frames for a live output surface.
//!
//! A slide is an ordered stack of components (backgrounds, text, images, media, borders). The
//! crate is organized around the per-frame path:
//!
//! - [`TransitionEngine`] turns `send`/`clear` events into a [`FramePlan`] using easing curves
//!   resolved through an explicit [`EasingRegistry`]
//! - [`Compositor`] draws the planned slides, serving runs of static components from render
//!   caches and repainting media every frame
//! - [`Presenter`] ties both to a frame buffer; [`PresentationThread`] runs one on a dedicated
//!   thread and hands frames to a [`DisplaySurface`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

pub(crate) mod animation;
/// Presentation configuration.
pub mod config;
/// Frame destinations.
pub mod display;
pub(crate) mod effects;
/// Transition engine, presenter and presentation thread.
pub mod presentation;
/// Surfaces and the cached slide compositor.
pub mod render;
pub(crate) mod scene;

pub use crate::animation::ease::{Ease, EaseId};
pub use crate::animation::registry::EasingRegistry;
pub use crate::assets::color::Color;
pub use crate::assets::decode::{PreparedImage, decode_image, load_image};
pub use crate::assets::text::{TextAlign, TextRasterizer, TextStyle};
pub use crate::config::PresentationConfig;
pub use crate::display::sink::{DisplaySurface, InMemoryDisplay, PngSequenceDisplay, write_png};
pub use crate::effects::composite::Direction;
pub use crate::effects::transitions::{TransitionKind, TransitionSpec, parse_transition};
pub use crate::foundation::core::{Canvas, MAX_SURFACE_DIM, Point, Rect, Rgba8Premul, Vec2};
pub use crate::foundation::error::{SlidecastError, SlidecastResult};
pub use crate::presentation::engine::{FramePlan, Layer, TransitionEngine};
pub use crate::presentation::event::{
    DropReason, EventId, EventKind, TransitionDirection, TransitionEvent, TransitionInfo,
};
pub use crate::presentation::listener::{EventLog, LifecycleEvent, Listeners, TransitionListener};
pub use crate::presentation::presenter::Presenter;
pub use crate::presentation::state::{Content, Phase, PresentationState};
pub use crate::presentation::worker::{PresentationThread, PresentationThreadOpts, WorkerStatus};
pub use crate::render::cache::CacheOpts;
pub use crate::render::compositor::{CompositeStats, Compositor, LayerParams};
pub use crate::render::surface::{FrameRGBA, PixelFormat, Surface, SurfaceDesc};
pub use crate::render::surface_pool::{SurfacePoolOpts, SurfacePoolStats};
pub use crate::scene::def::{BoundsDef, ComponentDef, SlideDef, load_slide};
pub use crate::scene::model::{
    ComponentId, ComponentKind, Fill, ImageFit, MediaSource, Slide, SlideComponent, SlideId,
    SlideKey,
};
