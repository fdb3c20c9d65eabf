use std::path::Path;
use std::sync::Arc;

use crate::assets::color::Color;
use crate::foundation::core::MAX_SURFACE_DIM;
use crate::foundation::error::{SlidecastError, SlidecastResult};

/// Horizontal alignment of text lines inside their box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    /// Flush left.
    Left,
    /// Centered (lyrics and scripture default).
    #[default]
    Center,
    /// Flush right.
    Right,
}

/// Visual style of a text component.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextStyle {
    /// Font family name; generic families (`sans-serif`, `serif`) are accepted.
    #[serde(default = "default_family")]
    pub font_family: String,
    /// Font size in slide units.
    #[serde(default = "default_size")]
    pub size: f32,
    /// Fill color.
    #[serde(default)]
    pub color: Color,
    /// Line alignment.
    #[serde(default)]
    pub align: TextAlign,
    /// Line advance as a multiple of the font size.
    #[serde(default = "default_line_height")]
    pub line_height: f32,
}

fn default_family() -> String {
    "sans-serif".to_owned()
}

fn default_size() -> f32 {
    48.0
}

fn default_line_height() -> f32 {
    1.2
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: default_family(),
            size: default_size(),
            color: Color::default(),
            align: TextAlign::default(),
            line_height: default_line_height(),
        }
    }
}

/// Rasterizes text blocks through `usvg`/`resvg` against an explicit font database.
///
/// Building the database is the expensive part (system font scan), so one rasterizer is created
/// per compositor and reused for every text component.
#[derive(Clone)]
pub struct TextRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for TextRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRasterizer")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl TextRasterizer {
    /// Rasterizer with no fonts loaded. Text renders as nothing; useful for tests.
    pub fn without_fonts() -> Self {
        Self {
            fontdb: Arc::new(usvg::fontdb::Database::new()),
        }
    }

    /// Rasterizer backed by the system fonts (when `system_fonts`) plus any `.ttf`/`.otf`/`.ttc`
    /// files in `extra_dirs`.
    pub fn with_fonts(system_fonts: bool, extra_dirs: &[&Path]) -> Self {
        let mut db = usvg::fontdb::Database::new();
        if system_fonts {
            db.load_system_fonts();
        }
        for dir in extra_dirs {
            load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!(faces = db.len(), "font database loaded");
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Number of font faces available.
    pub fn face_count(&self) -> usize {
        self.fontdb.len()
    }

    /// Render `text` into a `width x height` premultiplied RGBA8 buffer.
    ///
    /// `scale` maps slide units to pixels for the font size.
    pub fn rasterize(
        &self,
        text: &str,
        style: &TextStyle,
        scale: f32,
        width: u32,
        height: u32,
    ) -> SlidecastResult<Vec<u8>> {
        self.rasterize_window(text, style, scale, (width, height), (0, 0, width, height))
    }

    /// Lay `text` out in a `layout` sized box but only paint the `(x, y, w, h)` window of it.
    ///
    /// The returned buffer is `w x h`; the window is relative to the box origin.
    pub(crate) fn rasterize_window(
        &self,
        text: &str,
        style: &TextStyle,
        scale: f32,
        (width, height): (u32, u32),
        (x, y, w, h): (u32, u32, u32, u32),
    ) -> SlidecastResult<Vec<u8>> {
        let size_px = style.size * scale;
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(SlidecastError::validation(
                "text size must be finite and > 0",
            ));
        }
        if w > MAX_SURFACE_DIM || h > MAX_SURFACE_DIM {
            return Err(SlidecastError::render(format!(
                "text pixmap {w}x{h} exceeds max {MAX_SURFACE_DIM}x{MAX_SURFACE_DIM}"
            )));
        }
        let mut pixmap = resvg::tiny_skia::Pixmap::new(w, h)
            .ok_or_else(|| SlidecastError::render("failed to allocate text pixmap"))?;

        if !text.trim().is_empty() {
            let svg = text_svg(text, style, size_px, width, height);
            let opts = usvg::Options {
                fontdb: self.fontdb.clone(),
                ..Default::default()
            };
            let tree = usvg::Tree::from_str(&svg, &opts)
                .map_err(|e| SlidecastError::render(format!("text layout failed: {e}")))?;
            resvg::render(
                &tree,
                resvg::tiny_skia::Transform::from_translate(-(x as f32), -(y as f32)),
                &mut pixmap.as_mut(),
            );
        }

        Ok(pixmap.take())
    }
}

fn text_svg(text: &str, style: &TextStyle, size_px: f32, width: u32, height: u32) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let advance = size_px * style.line_height.max(0.1);
    let block_h = advance * (lines.len().saturating_sub(1) as f32) + size_px;
    let top = ((height as f32) - block_h) / 2.0;
    // Approximate ascent: baselines sit ~0.8em below the line top.
    let first_baseline = top + size_px * 0.8;

    let (x, anchor) = match style.align {
        TextAlign::Left => (0.0, "start"),
        TextAlign::Center => ((width as f32) / 2.0, "middle"),
        TextAlign::Right => (width as f32, "end"),
    };
    let (fill, opacity) = style.color.to_svg_parts();

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}"><text font-family="{}" font-size="{size_px}" fill="{fill}" fill-opacity="{opacity}" text-anchor="{anchor}" xml:space="preserve">"#,
        escape_xml(&style.font_family),
    );
    for (i, line) in lines.iter().enumerate() {
        let y = first_baseline + advance * (i as f32);
        svg.push_str(&format!(
            r#"<tspan x="{x}" y="{y}">{}</tspan>"#,
            escape_xml(line)
        ));
    }
    svg.push_str("</text></svg>");
    svg
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable font");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;
