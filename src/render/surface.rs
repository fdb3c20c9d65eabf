use std::hash::Hasher as _;

use crate::effects::composite::over;
use crate::foundation::core::{Canvas, MAX_SURFACE_DIM, Rgba8Premul};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::foundation::math::FrameHasher;

/// Pixel layouts a surface can be allocated in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Premultiplied RGBA8, row-major, tightly packed.
    #[default]
    Rgba8Premul,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8Premul => 4,
        }
    }
}

/// Size and format of an offscreen buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceDesc {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: PixelFormat,
}

impl SurfaceDesc {
    /// Descriptor for a canvas in the given format.
    pub fn new(canvas: Canvas, format: PixelFormat) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            format,
        }
    }

    /// Total byte length of a buffer with this descriptor.
    pub fn byte_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(self.format.bytes_per_pixel())
    }

    pub(crate) fn validate(self) -> SlidecastResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SlidecastError::cache("surface width/height must be > 0"));
        }
        if self.width > MAX_SURFACE_DIM || self.height > MAX_SURFACE_DIM {
            return Err(SlidecastError::cache(format!(
                "surface size too large: {}x{} (max {MAX_SURFACE_DIM}x{MAX_SURFACE_DIM})",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Integer pixel rectangle; may extend past the surface and is clipped on use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PixelRect {
    pub(crate) x: i64,
    pub(crate) y: i64,
    pub(crate) w: u32,
    pub(crate) h: u32,
}

impl PixelRect {
    pub(crate) fn is_empty(self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Overlap of `self` and `other`, or `None` when they do not overlap.
    pub(crate) fn intersect(self, other: PixelRect) -> Option<PixelRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + i64::from(self.w)).min(other.x + i64::from(other.w));
        let y1 = (self.y + i64::from(self.h)).min(other.y + i64::from(other.h));
        (x1 > x0 && y1 > y0).then(|| PixelRect {
            x: x0,
            y: y0,
            w: (x1 - x0) as u32,
            h: (y1 - y0) as u32,
        })
    }
}

/// A CPU raster buffer in premultiplied RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    desc: SurfaceDesc,
    data: Vec<u8>,
}

impl Surface {
    /// Allocate a transparent surface.
    pub fn new(width: u32, height: u32) -> SlidecastResult<Self> {
        Self::with_desc(SurfaceDesc {
            width,
            height,
            format: PixelFormat::Rgba8Premul,
        })
    }

    /// Allocate a transparent surface for `desc`.
    pub fn with_desc(desc: SurfaceDesc) -> SlidecastResult<Self> {
        desc.validate()?;
        Ok(Self {
            desc,
            data: vec![0; desc.byte_len()],
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.desc.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.desc.height
    }

    /// Whole-surface rectangle at the origin.
    pub(crate) fn bounds(&self) -> PixelRect {
        PixelRect {
            x: 0,
            y: 0,
            w: self.desc.width,
            h: self.desc.height,
        }
    }

    /// Buffer descriptor.
    pub fn desc(&self) -> SurfaceDesc {
        self.desc
    }

    /// Raw pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Overwrite every pixel with `color`.
    pub fn clear(&mut self, color: Rgba8Premul) {
        let px = color.to_array();
        for d in self.data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    /// Replace this surface's pixels with `src`'s. Sizes must match.
    pub fn copy_from(&mut self, src: &Surface) -> SlidecastResult<()> {
        if self.desc != src.desc {
            return Err(SlidecastError::render(
                "copy_from expects surfaces with identical descriptors",
            ));
        }
        self.data.copy_from_slice(&src.data);
        Ok(())
    }

    /// Blend a solid color over `rect` (clipped).
    pub(crate) fn fill_rect(&mut self, rect: PixelRect, color: Rgba8Premul) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return;
        };
        let src = color.to_array();
        let stride = self.desc.width as usize * 4;
        for y in y0..y1 {
            let row = y * stride;
            for x in x0..x1 {
                let i = row + x * 4;
                let d = [
                    self.data[i],
                    self.data[i + 1],
                    self.data[i + 2],
                    self.data[i + 3],
                ];
                self.data[i..i + 4].copy_from_slice(&over(d, src, 1.0));
            }
        }
    }

    /// Blend a `rect.w x rect.h` premultiplied buffer over `rect` (clipped).
    pub(crate) fn draw_premul(&mut self, rect: PixelRect, src: &[u8]) -> SlidecastResult<()> {
        let expected = (rect.w as usize) * (rect.h as usize) * 4;
        if src.len() != expected {
            return Err(SlidecastError::render(format!(
                "draw_premul expects {expected} bytes, got {}",
                src.len()
            )));
        }
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return Ok(());
        };
        let stride = self.desc.width as usize * 4;
        let src_stride = rect.w as usize * 4;
        for y in y0..y1 {
            let sy = (y as i64 - rect.y) as usize;
            for x in x0..x1 {
                let sx = (x as i64 - rect.x) as usize;
                let si = sy * src_stride + sx * 4;
                let di = y * stride + x * 4;
                let s = [src[si], src[si + 1], src[si + 2], src[si + 3]];
                if s[3] == 0 {
                    continue;
                }
                let d = [
                    self.data[di],
                    self.data[di + 1],
                    self.data[di + 2],
                    self.data[di + 3],
                ];
                self.data[di..di + 4].copy_from_slice(&over(d, s, 1.0));
            }
        }
        Ok(())
    }

    fn clip(&self, rect: PixelRect) -> Option<(usize, usize, usize, usize)> {
        if rect.is_empty() {
            return None;
        }
        let w = i64::from(self.desc.width);
        let h = i64::from(self.desc.height);
        let x0 = rect.x.clamp(0, w);
        let y0 = rect.y.clamp(0, h);
        let x1 = (rect.x + i64::from(rect.w)).clamp(0, w);
        let y1 = (rect.y + i64::from(rect.h)).clamp(0, h);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }

    /// Copy the pixels out into an owned frame.
    pub fn to_frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.desc.width,
            height: self.desc.height,
            data: self.data.clone(),
            premultiplied: true,
        }
    }

    pub(crate) fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub(crate) fn from_pooled(desc: SurfaceDesc, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), desc.byte_len());
        Self { desc, data }
    }
}

/// A composed frame as RGBA8 pixels, detached from the presentation thread.
///
/// Frames are **premultiplied alpha**; the `premultiplied` flag makes this explicit at API
/// boundaries. Presentation frames are opaque (composed over the clear color), so they can be
/// written to PNG as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Content hash used to skip re-presenting identical frames.
    pub fn fingerprint(&self) -> u64 {
        let mut h = FrameHasher::default();
        h.write_u32(self.width);
        h.write_u32(self.height);
        h.write_usize(self.data.len());
        h.write(&self.data);
        h.finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
