use crate::assets::decode::PreparedImage;
use crate::assets::text::TextRasterizer;
use crate::foundation::core::{MAX_SURFACE_DIM, Rect};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::render::surface::{PixelRect, Surface};
use crate::scene::model::{ComponentKind, Fill, ImageFit, SlideComponent};

/// Per-frame inputs for painting components into a surface.
pub(crate) struct RasterCtx<'a> {
    pub(crate) text: &'a TextRasterizer,
    /// Slide-to-pixel scale on x.
    pub(crate) sx: f64,
    /// Slide-to-pixel scale on y.
    pub(crate) sy: f64,
    /// Seconds since the slide started showing; drives media frames.
    pub(crate) media_time: f64,
}

impl RasterCtx<'_> {
    fn uniform_scale(&self) -> f64 {
        self.sx.min(self.sy)
    }

    fn to_pixels(&self, r: Rect) -> PixelRect {
        let x0 = (r.x0 * self.sx).round();
        let y0 = (r.y0 * self.sy).round();
        let x1 = (r.x1 * self.sx).round();
        let y1 = (r.y1 * self.sy).round();
        PixelRect {
            x: x0 as i64,
            y: y0 as i64,
            w: (x1 - x0).max(0.0) as u32,
            h: (y1 - y0).max(0.0) as u32,
        }
    }
}

/// Paint one component over `target`.
pub(crate) fn draw_component(
    target: &mut Surface,
    component: &SlideComponent,
    ctx: &RasterCtx<'_>,
) -> SlidecastResult<()> {
    let rect = ctx.to_pixels(component.bounds());
    if rect.is_empty() {
        return Ok(());
    }

    match component.kind() {
        ComponentKind::Background(Fill::Color(c)) => {
            target.fill_rect(rect, c.to_rgba8_premul());
            Ok(())
        }
        ComponentKind::Background(Fill::Image { image, fit })
        | ComponentKind::Image { image, fit } => draw_image(target, image, *fit, rect),
        ComponentKind::Media { source, fit } => match source.frame_at(ctx.media_time) {
            Some(frame) => draw_image(target, frame, *fit, rect),
            None => Ok(()),
        },
        ComponentKind::Text { text, style } => {
            ensure_drawable(rect, "text box")?;
            let Some(visible) = rect.intersect(target.bounds()) else {
                return Ok(());
            };
            let window = (
                (visible.x - rect.x) as u32,
                (visible.y - rect.y) as u32,
                visible.w,
                visible.h,
            );
            let scale = ctx.uniform_scale() as f32;
            let px = ctx.text.rasterize_window(text, style, scale, (rect.w, rect.h), window)?;
            target.draw_premul(visible, &px)
        }
        ComponentKind::Border { color, thickness } => {
            draw_border(target, rect, *thickness * ctx.uniform_scale(), color.to_rgba8_premul());
            Ok(())
        }
    }
}

fn draw_border(
    target: &mut Surface,
    rect: PixelRect,
    thickness: f64,
    color: crate::foundation::core::Rgba8Premul,
) {
    if thickness <= 0.0 {
        return;
    }
    let t = (thickness.round() as u32).max(1);
    let tw = t.min(rect.w);
    let th = t.min(rect.h);
    target.fill_rect(PixelRect { h: th, ..rect }, color);
    if rect.h > th {
        let bottom = th.min(rect.h - th);
        target.fill_rect(
            PixelRect {
                y: rect.y + i64::from(rect.h - bottom),
                h: bottom,
                ..rect
            },
            color,
        );
    }
    let inner_h = rect.h.saturating_sub(th * 2);
    if inner_h == 0 {
        return;
    }
    let side = PixelRect {
        y: rect.y + i64::from(th),
        w: tw,
        h: inner_h,
        ..rect
    };
    target.fill_rect(side, color);
    if rect.w > tw {
        let right = tw.min(rect.w - tw);
        target.fill_rect(
            PixelRect {
                x: rect.x + i64::from(rect.w - right),
                w: right,
                ..side
            },
            color,
        );
    }
}

/// Where an image of `iw x ih` lands inside `bounds` for `fit`.
pub(crate) fn fit_rect(iw: u32, ih: u32, fit: ImageFit, bounds: PixelRect) -> PixelRect {
    let (bw, bh) = (f64::from(bounds.w), f64::from(bounds.h));
    let scale = match fit {
        ImageFit::Stretch => return bounds,
        ImageFit::Contain => (bw / f64::from(iw)).min(bh / f64::from(ih)),
        ImageFit::Cover => (bw / f64::from(iw)).max(bh / f64::from(ih)),
    };
    let w = (f64::from(iw) * scale).round().max(1.0);
    let h = (f64::from(ih) * scale).round().max(1.0);
    PixelRect {
        x: bounds.x + ((bw - w) / 2.0).round() as i64,
        y: bounds.y + ((bh - h) / 2.0).round() as i64,
        w: w as u32,
        h: h as u32,
    }
}

fn ensure_drawable(rect: PixelRect, what: &str) -> SlidecastResult<()> {
    if rect.w > MAX_SURFACE_DIM || rect.h > MAX_SURFACE_DIM {
        return Err(SlidecastError::render(format!(
            "{what} {}x{} exceeds max {MAX_SURFACE_DIM}x{MAX_SURFACE_DIM}",
            rect.w, rect.h
        )));
    }
    Ok(())
}

fn draw_image(
    target: &mut Surface,
    image: &PreparedImage,
    fit: ImageFit,
    bounds: PixelRect,
) -> SlidecastResult<()> {
    let placed = fit_rect(image.width, image.height, fit, bounds);
    let Some(visible) = placed.intersect(bounds).and_then(|r| r.intersect(target.bounds())) else {
        return Ok(());
    };
    if visible == placed {
        ensure_drawable(placed, "image")?;
        let px = image.resized(placed.w, placed.h)?;
        return target.draw_premul(placed, &px);
    }

    // Only the source pixels under `visible` are resampled.
    let kx = f64::from(image.width) / f64::from(placed.w);
    let ky = f64::from(image.height) / f64::from(placed.h);
    let (sx0, sx1) = source_span(visible.x - placed.x, visible.w, kx, image.width);
    let (sy0, sy1) = source_span(visible.y - placed.y, visible.h, ky, image.height);
    let dx0 = (f64::from(sx0) / kx).round() as i64;
    let dx1 = (f64::from(sx1) / kx).round() as i64;
    let dy0 = (f64::from(sy0) / ky).round() as i64;
    let dy1 = (f64::from(sy1) / ky).round() as i64;
    let scaled = PixelRect {
        x: placed.x + dx0,
        y: placed.y + dy0,
        w: (dx1 - dx0).max(1) as u32,
        h: (dy1 - dy0).max(1) as u32,
    };
    ensure_drawable(scaled, "image region")?;
    let px = image.resized_region((sx0, sy0, sx1 - sx0, sy1 - sy0), scaled.w, scaled.h)?;

    let Some(visible) = visible.intersect(scaled) else {
        return Ok(());
    };
    let cx = (visible.x - scaled.x) as usize;
    let cy = (visible.y - scaled.y) as usize;
    let (cw, ch) = (visible.w as usize, visible.h as usize);
    let stride = scaled.w as usize * 4;
    let mut cropped = Vec::with_capacity(cw * ch * 4);
    for row in cy..cy + ch {
        let start = row * stride + cx * 4;
        cropped.extend_from_slice(&px[start..start + cw * 4]);
    }
    target.draw_premul(visible, &cropped)
}

/// Source pixel range `[start, end)` covering destination offsets `offset..offset + len`
/// at `k` source pixels per destination pixel.
fn source_span(offset: i64, len: u32, k: f64, size: u32) -> (u32, u32) {
    let start = ((offset as f64 * k).floor().max(0.0) as u32).min(size - 1);
    let end = (((offset as f64 + f64::from(len)) * k).ceil() as u32).clamp(start + 1, size);
    (start, end)
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
