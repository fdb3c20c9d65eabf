use std::sync::atomic::{AtomicU64, Ordering};

use crate::assets::color::Color;
use crate::assets::decode::PreparedImage;
use crate::assets::text::TextStyle;
use crate::foundation::core::Rect;
use crate::foundation::error::{SlidecastError, SlidecastResult};

static NEXT_SLIDE_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

// Revisions come from one process-wide counter, so two diverging clones of a slide never end up
// with the same (id, revision) pair.
fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// Immutable identity of a [`Slide`]. Clones of a slide share it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlideId(u64);

impl SlideId {
    /// Raw numeric value, for logs.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// One rendition of a slide: its identity plus the revision it was composed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlideKey {
    /// Slide identity.
    pub id: SlideId,
    /// Slide revision.
    pub revision: u64,
}

/// Immutable identity of a [`SlideComponent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Raw numeric value, for logs.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// How an image is placed inside its component bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFit {
    /// Scale both axes independently to fill the bounds.
    #[default]
    Stretch,
    /// Scale uniformly so the whole image fits; letterboxed.
    Contain,
    /// Scale uniformly so the bounds are covered; cropped.
    Cover,
}

/// What a background paints.
#[derive(Clone, Debug, PartialEq)]
pub enum Fill {
    /// Solid color.
    Color(Color),
    /// Image placed with `fit`.
    Image {
        /// Decoded pixels.
        image: PreparedImage,
        /// Placement inside the bounds.
        fit: ImageFit,
    },
}

/// A time-varying image source (video stand-in: a decoded frame sequence).
#[derive(Clone, Debug, PartialEq)]
pub struct MediaSource {
    /// Frames in playback order; never empty.
    pub frames: Vec<PreparedImage>,
    /// Playback rate in frames per second.
    pub fps: f64,
    /// Restart from the first frame after the last one, instead of holding it.
    pub looping: bool,
}

impl MediaSource {
    /// Build a validated source.
    pub fn new(frames: Vec<PreparedImage>, fps: f64, looping: bool) -> SlidecastResult<Self> {
        if frames.is_empty() {
            return Err(SlidecastError::validation("media needs at least one frame"));
        }
        if !fps.is_finite() || fps <= 0.0 {
            return Err(SlidecastError::validation("media fps must be finite and > 0"));
        }
        Ok(Self {
            frames,
            fps,
            looping,
        })
    }

    /// Frame shown `media_time` seconds after the slide started showing.
    pub fn frame_at(&self, media_time: f64) -> Option<&PreparedImage> {
        let n = self.frames.len();
        if n == 0 {
            return None;
        }
        let t = if media_time.is_finite() {
            media_time.max(0.0)
        } else {
            0.0
        };
        let idx = (t * self.fps).floor() as usize;
        let idx = if self.looping { idx % n } else { idx.min(n - 1) };
        self.frames.get(idx)
    }
}

/// Visual kind of a component.
#[derive(Clone, Debug, PartialEq)]
pub enum ComponentKind {
    /// Slide background.
    Background(Fill),
    /// A block of text.
    Text {
        /// Content; `\n` separates lines.
        text: String,
        /// Font and layout.
        style: TextStyle,
    },
    /// A still image.
    Image {
        /// Decoded pixels.
        image: PreparedImage,
        /// Placement inside the bounds.
        fit: ImageFit,
    },
    /// Time-varying content, repainted every frame.
    Media {
        /// Frame source.
        source: MediaSource,
        /// Placement inside the bounds.
        fit: ImageFit,
    },
    /// An outline drawn just inside the bounds.
    Border {
        /// Stroke color.
        color: Color,
        /// Stroke width in slide units.
        thickness: f64,
    },
}

impl ComponentKind {
    /// `true` when the content changes with time and therefore cannot be cached.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Media { .. })
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Background(_) => "background",
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Media { .. } => "media",
            Self::Border { .. } => "border",
        }
    }
}

/// One renderable unit of a slide.
#[derive(Clone, Debug, PartialEq)]
pub struct SlideComponent {
    id: ComponentId,
    bounds: Rect,
    kind: ComponentKind,
    revision: u64,
}

impl SlideComponent {
    /// New component with a fresh id.
    pub fn new(bounds: Rect, kind: ComponentKind) -> Self {
        Self {
            id: ComponentId(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed)),
            bounds,
            kind,
            revision: next_revision(),
        }
    }

    /// Identity.
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Position and size in slide coordinates.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Visual kind.
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// Bumped on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// See [`ComponentKind::is_dynamic`].
    pub fn is_dynamic(&self) -> bool {
        self.kind.is_dynamic()
    }

    /// Move or resize.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
        self.revision = next_revision();
    }

    /// Replace the visual kind.
    pub fn set_kind(&mut self, kind: ComponentKind) {
        self.kind = kind;
        self.revision = next_revision();
    }
}

/// An ordered stack of components painted back-to-front.
///
/// A slide is edited while owned and shared immutably (`Arc<Slide>`) once sent for presentation.
/// Every mutation bumps [`Slide::revision`]; the pair `(id, revision)` identifies a rendition.
#[derive(Clone, Debug, PartialEq)]
pub struct Slide {
    id: SlideId,
    width: f64,
    height: f64,
    components: Vec<SlideComponent>,
    revision: u64,
}

impl Slide {
    /// Empty slide with logical size `width x height`.
    pub fn new(width: f64, height: f64) -> SlidecastResult<Self> {
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
            return Err(SlidecastError::validation(
                "slide width/height must be finite and > 0",
            ));
        }
        Ok(Self {
            id: SlideId(NEXT_SLIDE_ID.fetch_add(1, Ordering::Relaxed)),
            width,
            height,
            components: Vec::new(),
            revision: next_revision(),
        })
    }

    /// Identity.
    pub fn id(&self) -> SlideId {
        self.id
    }

    /// Logical width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Logical height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Bumped on every structural or visual mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Components in paint order.
    pub fn components(&self) -> &[SlideComponent] {
        &self.components
    }

    /// Look up a component.
    pub fn component(&self, id: ComponentId) -> Option<&SlideComponent> {
        self.components.iter().find(|c| c.id == id)
    }

    /// Identity and revision of this rendition.
    pub fn key(&self) -> SlideKey {
        SlideKey {
            id: self.id,
            revision: self.revision,
        }
    }

    /// `true` when `other` is the same rendition of the same slide.
    pub fn is_same_rendition(&self, other: &Slide) -> bool {
        self.id == other.id && self.revision == other.revision
    }

    /// Append on top of the stack.
    pub fn push(&mut self, component: SlideComponent) -> ComponentId {
        let id = component.id;
        self.components.push(component);
        self.touch();
        id
    }

    /// Insert at paint position `index` (0 = bottom).
    pub fn insert(
        &mut self,
        index: usize,
        component: SlideComponent,
    ) -> SlidecastResult<ComponentId> {
        if index > self.components.len() {
            return Err(SlidecastError::validation(format!(
                "insert index {index} out of range (len {})",
                self.components.len()
            )));
        }
        let id = component.id;
        self.components.insert(index, component);
        self.touch();
        Ok(id)
    }

    /// Remove a component, returning it.
    pub fn remove(&mut self, id: ComponentId) -> Option<SlideComponent> {
        let idx = self.position(id)?;
        let c = self.components.remove(idx);
        self.touch();
        Some(c)
    }

    /// Move a component to paint position `index`.
    pub fn move_component(&mut self, id: ComponentId, index: usize) -> SlidecastResult<()> {
        let from = self.position(id).ok_or_else(|| unknown_component(id))?;
        if index >= self.components.len() {
            return Err(SlidecastError::validation(format!(
                "move index {index} out of range (len {})",
                self.components.len()
            )));
        }
        if from != index {
            let c = self.components.remove(from);
            self.components.insert(index, c);
            self.touch();
        }
        Ok(())
    }

    /// Mutate one component in place; bumps the slide revision.
    pub fn edit_component<R>(
        &mut self,
        id: ComponentId,
        f: impl FnOnce(&mut SlideComponent) -> R,
    ) -> SlidecastResult<R> {
        let idx = self.position(id).ok_or_else(|| unknown_component(id))?;
        let out = f(&mut self.components[idx]);
        self.touch();
        Ok(out)
    }

    fn position(&self, id: ComponentId) -> Option<usize> {
        self.components.iter().position(|c| c.id == id)
    }

    fn touch(&mut self) {
        self.revision = next_revision();
    }
}

fn unknown_component(id: ComponentId) -> SlidecastError {
    SlidecastError::validation(format!("slide has no component {}", id.get()))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
