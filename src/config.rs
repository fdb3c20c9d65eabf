//! Presentation configuration, loadable from JSON.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use crate::animation::ease::EaseId;
use crate::assets::color::Color;
use crate::effects::transitions::{TransitionSpec, parse_transition};
use crate::foundation::core::Canvas;
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::render::cache::CacheOpts;

/// Highest frame rate the presentation thread will pace to.
pub const MAX_FPS: f64 = 240.0;

/// Everything a [`crate::Presenter`] needs to know up front. Every field has a default.
///
/// ```json
/// { "canvas": { "width": 1280, "height": 720 }, "fps": 30,
///   "clear_color": "#000000", "default_easing": 30,
///   "transition": { "kind": "wipe", "params": { "dir": "ltr", "soft_edge": 0.1 } },
///   "cache": { "enabled": true, "max_pool_bytes": 134217728 } }
/// ```
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PresentationConfig {
    /// Output size in pixels.
    pub canvas: Canvas,
    /// Target frames per second of the presentation thread.
    pub fps: f64,
    /// Color behind every slide.
    pub clear_color: Color,
    /// Easing used when a requested easing id is unknown.
    pub default_easing: EaseId,
    /// Default in-transition length in milliseconds.
    pub default_in_ms: u64,
    /// Default out-transition length in milliseconds.
    pub default_out_ms: u64,
    /// Effect used by `send`/`clear` unless an event carries its own.
    pub transition: TransitionSpec,
    /// Render cache and surface pool options.
    pub cache: CacheOpts,
    /// Load installed system fonts for text components.
    pub system_fonts: bool,
    /// Extra directories scanned for `.ttf`/`.otf`/`.ttc` files.
    pub font_dirs: Vec<PathBuf>,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            fps: 30.0,
            clear_color: Color::rgba(0.0, 0.0, 0.0, 1.0),
            default_easing: EaseId(30),
            default_in_ms: 500,
            default_out_ms: 500,
            transition: TransitionSpec::default(),
            cache: CacheOpts::default(),
            system_fonts: true,
            font_dirs: Vec::new(),
        }
    }
}

impl PresentationConfig {
    /// Parse from JSON text and validate.
    pub fn from_json_str(s: &str) -> SlidecastResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a config file. Relative font directories resolve against the
    /// file's directory.
    pub fn from_json_path(path: &Path) -> SlidecastResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let mut cfg = Self::from_json_str(&s)?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        for dir in &mut cfg.font_dirs {
            if dir.is_relative() {
                *dir = root.join(&*dir);
            }
        }
        Ok(cfg)
    }

    /// Reject sizes, rates and transitions the engine cannot run with.
    pub fn validate(&self) -> SlidecastResult<()> {
        self.canvas.validate()?;
        if !self.fps.is_finite() || self.fps <= 0.0 || self.fps > MAX_FPS {
            return Err(SlidecastError::validation(format!(
                "fps must be in (0, {MAX_FPS}], got {}",
                self.fps
            )));
        }
        parse_transition(&self.transition)?;
        Ok(())
    }

    /// Default in-transition length.
    pub fn default_in(&self) -> Duration {
        Duration::from_millis(self.default_in_ms)
    }

    /// Default out-transition length.
    pub fn default_out(&self) -> Duration {
        Duration::from_millis(self.default_out_ms)
    }

    /// Time between frames at the configured rate.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.clamp(1e-3, MAX_FPS))
    }
}
