use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

use crate::assets::color::Color;
use crate::assets::decode::{PreparedImage, load_image};
use crate::assets::text::TextStyle;
use crate::foundation::core::Rect;
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::scene::model::{
    ComponentKind, Fill, ImageFit, MediaSource, Slide, SlideComponent,
};

/// JSON definition of a slide, as stored in slide and show files.
///
/// ```json
/// {
///   "width": 1920, "height": 1080,
///   "components": [
///     { "kind": "background", "color": "#101820" },
///     { "kind": "text", "bounds": { "x": 160, "y": 340, "width": 1600, "height": 400 },
///       "text": "Amazing grace", "style": { "size": 72, "color": "#ffffff" } },
///     { "kind": "border", "color": "#ffffff80", "thickness": 8 }
///   ]
/// }
/// ```
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlideDef {
    /// Logical width.
    pub width: f64,
    /// Logical height.
    pub height: f64,
    /// Components in paint order.
    #[serde(default)]
    pub components: Vec<ComponentDef>,
}

/// Component bounds in slide coordinates. Omitted bounds cover the whole slide.
#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundsDef {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl BoundsDef {
    fn to_rect(self) -> SlidecastResult<Rect> {
        let vals = [self.x, self.y, self.width, self.height];
        if vals.iter().any(|v| !v.is_finite()) || self.width < 0.0 || self.height < 0.0 {
            return Err(SlidecastError::validation(
                "bounds must be finite with non-negative size",
            ));
        }
        Ok(Rect::new(
            self.x,
            self.y,
            self.x + self.width,
            self.y + self.height,
        ))
    }
}

/// One component of a [`SlideDef`], tagged by `kind`.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentDef {
    /// Solid color or image background; exactly one of `color` / `image`.
    Background {
        /// Area to paint.
        #[serde(default)]
        bounds: Option<BoundsDef>,
        /// Solid color.
        #[serde(default)]
        color: Option<Color>,
        /// Image path relative to the definition file.
        #[serde(default)]
        image: Option<String>,
        /// Placement of `image`.
        #[serde(default = "cover")]
        fit: ImageFit,
    },
    /// Text block.
    Text {
        /// Text box.
        #[serde(default)]
        bounds: Option<BoundsDef>,
        /// Content.
        text: String,
        /// Font and layout.
        #[serde(default)]
        style: TextStyle,
    },
    /// Still image.
    Image {
        /// Image box.
        #[serde(default)]
        bounds: Option<BoundsDef>,
        /// Path relative to the definition file.
        source: String,
        /// Placement.
        #[serde(default)]
        fit: ImageFit,
    },
    /// Image-sequence media.
    Media {
        /// Media box.
        #[serde(default)]
        bounds: Option<BoundsDef>,
        /// Frame paths relative to the definition file, in playback order.
        frames: Vec<String>,
        /// Playback rate.
        #[serde(default = "default_media_fps")]
        fps: f64,
        /// Loop after the last frame.
        #[serde(default = "yes")]
        looping: bool,
        /// Placement.
        #[serde(default = "contain")]
        fit: ImageFit,
    },
    /// Outline.
    Border {
        /// Outlined box.
        #[serde(default)]
        bounds: Option<BoundsDef>,
        /// Stroke color.
        #[serde(default)]
        color: Color,
        /// Stroke width in slide units.
        #[serde(default = "default_thickness")]
        thickness: f64,
    },
}

fn cover() -> ImageFit {
    ImageFit::Cover
}

fn contain() -> ImageFit {
    ImageFit::Contain
}

fn default_media_fps() -> f64 {
    25.0
}

fn yes() -> bool {
    true
}

fn default_thickness() -> f64 {
    4.0
}

impl SlideDef {
    /// Parse a definition from JSON text.
    pub fn from_json_str(s: &str) -> SlidecastResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Read and parse a definition file.
    pub fn from_json_path(path: &Path) -> SlidecastResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read slide definition '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Build a [`Slide`], loading image assets relative to `root`.
    ///
    /// Each distinct asset path is decoded once even if several components use it.
    pub fn build_slide(&self, root: &Path) -> SlidecastResult<Slide> {
        let mut slide = Slide::new(self.width, self.height)?;
        let full = Rect::new(0.0, 0.0, self.width, self.height);
        let mut images = ImageLoader {
            root,
            loaded: HashMap::new(),
        };

        for (i, def) in self.components.iter().enumerate() {
            let (bounds, kind) = def
                .resolve(full, &mut images)
                .map_err(|e| SlidecastError::validation(format!("component #{i}: {e}")))?;
            slide.push(SlideComponent::new(bounds, kind));
        }
        Ok(slide)
    }
}

/// Load a slide definition file, resolving assets next to it.
pub fn load_slide(path: &Path) -> SlidecastResult<Slide> {
    let def = SlideDef::from_json_path(path)?;
    let root = path.parent().unwrap_or_else(|| Path::new("."));
    def.build_slide(root)
}

struct ImageLoader<'a> {
    root: &'a Path,
    loaded: HashMap<String, PreparedImage>,
}

impl ImageLoader<'_> {
    fn load(&mut self, source: &str) -> SlidecastResult<PreparedImage> {
        if let Some(img) = self.loaded.get(source) {
            return Ok(img.clone());
        }
        let img = load_image(self.root, source)?;
        self.loaded.insert(source.to_owned(), img.clone());
        Ok(img)
    }
}

impl ComponentDef {
    fn resolve(
        &self,
        full: Rect,
        images: &mut ImageLoader<'_>,
    ) -> SlidecastResult<(Rect, ComponentKind)> {
        let bounds = |b: &Option<BoundsDef>| -> SlidecastResult<Rect> {
            match b {
                Some(b) => b.to_rect(),
                None => Ok(full),
            }
        };

        match self {
            Self::Background {
                bounds: b,
                color,
                image,
                fit,
            } => {
                let fill = match (color, image) {
                    (Some(c), None) => Fill::Color(*c),
                    (None, Some(src)) => Fill::Image {
                        image: images.load(src)?,
                        fit: *fit,
                    },
                    _ => {
                        return Err(SlidecastError::validation(
                            "background needs exactly one of 'color' or 'image'",
                        ));
                    }
                };
                Ok((bounds(b)?, ComponentKind::Background(fill)))
            }
            Self::Text {
                bounds: b,
                text,
                style,
            } => {
                if !style.size.is_finite() || style.size <= 0.0 {
                    return Err(SlidecastError::validation("text size must be > 0"));
                }
                Ok((
                    bounds(b)?,
                    ComponentKind::Text {
                        text: text.clone(),
                        style: style.clone(),
                    },
                ))
            }
            Self::Image {
                bounds: b,
                source,
                fit,
            } => Ok((
                bounds(b)?,
                ComponentKind::Image {
                    image: images.load(source)?,
                    fit: *fit,
                },
            )),
            Self::Media {
                bounds: b,
                frames,
                fps,
                looping,
                fit,
            } => {
                let frames = frames
                    .iter()
                    .map(|f| images.load(f))
                    .collect::<SlidecastResult<Vec<_>>>()?;
                Ok((
                    bounds(b)?,
                    ComponentKind::Media {
                        source: MediaSource::new(frames, *fps, *looping)?,
                        fit: *fit,
                    },
                ))
            }
            Self::Border {
                bounds: b,
                color,
                thickness,
            } => {
                if !thickness.is_finite() || *thickness < 0.0 {
                    return Err(SlidecastError::validation(
                        "border thickness must be finite and >= 0",
                    ));
                }
                Ok((
                    bounds(b)?,
                    ComponentKind::Border {
                        color: *color,
                        thickness: *thickness,
                    },
                ))
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/def.rs"]
mod tests;
