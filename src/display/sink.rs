use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;

use crate::foundation::core::Canvas;
use crate::foundation::error::SlidecastResult;
use crate::render::surface::{FrameRGBA, PixelFormat};

/// Consumer of presented frames.
///
/// Ordering contract: `begin` once, then `present` any number of times in presentation order,
/// then `end` once.
pub trait DisplaySurface: Send {
    /// Pixel format the display wants frames (and therefore cache buffers) in.
    fn preferred_format(&self) -> PixelFormat {
        PixelFormat::Rgba8Premul
    }
    /// Called once before the first frame.
    fn begin(&mut self, canvas: Canvas) -> SlidecastResult<()>;
    /// Show one frame.
    fn present(&mut self, frame: &FrameRGBA) -> SlidecastResult<()>;
    /// Called once after the last frame.
    fn end(&mut self) -> SlidecastResult<()>;
}

#[derive(Debug, Default)]
struct Captured {
    canvas: Option<Canvas>,
    frames: Vec<FrameRGBA>,
    ended: bool,
}

/// Display that keeps every presented frame in memory. Clones share the same storage, so a clone
/// kept by the caller observes frames presented on another thread.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDisplay {
    inner: Arc<Mutex<Captured>>,
}

impl InMemoryDisplay {
    /// Empty display.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Captured> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Canvas passed to `begin`, if it was called.
    pub fn canvas(&self) -> Option<Canvas> {
        self.lock().canvas
    }

    /// Copy of every presented frame.
    pub fn frames(&self) -> Vec<FrameRGBA> {
        self.lock().frames.clone()
    }

    /// Number of presented frames.
    pub fn len(&self) -> usize {
        self.lock().frames.len()
    }

    /// `true` when nothing was presented.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `end` was called.
    pub fn is_ended(&self) -> bool {
        self.lock().ended
    }
}

impl DisplaySurface for InMemoryDisplay {
    fn begin(&mut self, canvas: Canvas) -> SlidecastResult<()> {
        let mut c = self.lock();
        c.canvas = Some(canvas);
        c.frames.clear();
        c.ended = false;
        Ok(())
    }

    fn present(&mut self, frame: &FrameRGBA) -> SlidecastResult<()> {
        self.lock().frames.push(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> SlidecastResult<()> {
        self.lock().ended = true;
        Ok(())
    }
}

/// Display writing each presented frame to `dir/frame_000000.png`, `frame_000001.png`, ...
#[derive(Debug)]
pub struct PngSequenceDisplay {
    dir: PathBuf,
    next: u64,
}

impl PngSequenceDisplay {
    /// Write into `dir` (created on `begin`).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next: 0,
        }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of frames written so far.
    pub fn written(&self) -> u64 {
        self.next
    }
}

impl DisplaySurface for PngSequenceDisplay {
    fn begin(&mut self, _canvas: Canvas) -> SlidecastResult<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create output dir '{}'", self.dir.display()))?;
        self.next = 0;
        Ok(())
    }

    fn present(&mut self, frame: &FrameRGBA) -> SlidecastResult<()> {
        let path = self.dir.join(format!("frame_{:06}.png", self.next));
        write_png(&path, frame)?;
        self.next += 1;
        Ok(())
    }

    fn end(&mut self) -> SlidecastResult<()> {
        tracing::debug!(frames = self.next, dir = %self.dir.display(), "png sequence written");
        Ok(())
    }
}

/// Write a frame as a straight-alpha RGBA PNG.
pub fn write_png(path: &Path, frame: &FrameRGBA) -> SlidecastResult<()> {
    let straight;
    let data = if frame.premultiplied && frame.data.chunks_exact(4).any(|p| p[3] != 255) {
        straight = unpremultiply(&frame.data);
        &straight
    } else {
        &frame.data
    };
    image::save_buffer_with_format(
        path,
        data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

fn unpremultiply(premul: &[u8]) -> Vec<u8> {
    let mut out = premul.to_vec();
    for px in out.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/display/sink.rs"]
mod tests;
