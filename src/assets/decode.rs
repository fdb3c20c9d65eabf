use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{SlidecastError, SlidecastResult};

/// Decoded raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Wrap already premultiplied pixels, checking the buffer length.
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> SlidecastResult<Self> {
        if width == 0 || height == 0 {
            return Err(SlidecastError::validation("image width/height must be > 0"));
        }
        let expected = (width as usize) * (height as usize) * 4;
        if rgba8_premul.len() != expected {
            return Err(SlidecastError::validation(format!(
                "image buffer has {} bytes, expected {expected}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Resample to `width x height` (bilinear on premultiplied data).
    pub(crate) fn resized(&self, width: u32, height: u32) -> SlidecastResult<Vec<u8>> {
        if width == self.width && height == self.height {
            return Ok(self.rgba8_premul.as_ref().clone());
        }
        self.resized_region((0, 0, self.width, self.height), width, height)
    }

    /// Resample the source sub-rectangle `(x, y, w, h)` to `width x height`.
    pub(crate) fn resized_region(
        &self,
        (x, y, w, h): (u32, u32, u32, u32),
        width: u32,
        height: u32,
    ) -> SlidecastResult<Vec<u8>> {
        if width == 0 || height == 0 || w == 0 || h == 0 {
            return Err(SlidecastError::render("cannot resize image to an empty size"));
        }
        if x.saturating_add(w) > self.width || y.saturating_add(h) > self.height {
            return Err(SlidecastError::render(format!(
                "region {w}x{h}+{x}+{y} is outside the {}x{} image",
                self.width, self.height
            )));
        }
        let src = image::ImageBuffer::<image::Rgba<u8>, Vec<u8>>::from_raw(
            self.width,
            self.height,
            self.rgba8_premul.as_ref().clone(),
        )
        .ok_or_else(|| SlidecastError::render("image buffer does not match its dimensions"))?;
        let region = image::imageops::crop_imm(&src, x, y, w, h).to_image();
        let out =
            image::imageops::resize(&region, width, height, image::imageops::FilterType::Triangle);
        Ok(out.into_raw())
    }
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> SlidecastResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    PreparedImage::from_premul(width, height, rgba8_premul)
}

/// Read and decode an image stored at `source`, relative to `root`.
pub fn load_image(root: &Path, source: &str) -> SlidecastResult<PreparedImage> {
    let rel = normalize_rel_path(source)?;
    let path = root.join(Path::new(&rel));
    let bytes = std::fs::read(&path)
        .with_context(|| format!("read image bytes from '{}'", path.display()))?;
    decode_image(&bytes)
}

/// Normalize and validate definition-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> SlidecastResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(SlidecastError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(SlidecastError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(SlidecastError::validation(
                "asset paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(SlidecastError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((u16::from(px[0]) * a + 127) / 255) as u8;
        px[1] = ((u16::from(px[1]) * a + 127) / 255) as u8;
        px[2] = ((u16::from(px[2]) * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
