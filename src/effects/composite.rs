use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::foundation::math::{mul_div255_u8, unit_to_u8};

pub(crate) type PremulRgba8 = [u8; 4];

/// Direction a wipe edge or a pushed layer travels in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    /// Left edge towards right edge.
    #[default]
    LeftToRight,
    /// Right edge towards left edge.
    RightToLeft,
    /// Top edge towards bottom edge.
    TopToBottom,
    /// Bottom edge towards top edge.
    BottomToTop,
}

pub(crate) fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = unit_to_u8(opacity);
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

fn check_lengths(dst: &[u8], src: &[u8], what: &str) -> SlidecastResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(SlidecastError::render(format!(
            "{what} expects equal-length rgba8 buffers"
        )));
    }
    Ok(())
}

pub(crate) fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> SlidecastResult<()> {
    check_lengths(dst, src, "over_in_place")?;
    if opacity <= 0.0 {
        return Ok(());
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Blend `src` over `dst` shifted by `(dx, dy)` pixels; pixels shifted off-surface are dropped.
pub(crate) fn over_offset_in_place(
    dst: &mut [u8],
    src: &[u8],
    width: u32,
    height: u32,
    dx: i64,
    dy: i64,
) -> SlidecastResult<()> {
    check_lengths(dst, src, "over_offset_in_place")?;
    if dst.len() != (width as usize) * (height as usize) * 4 {
        return Err(SlidecastError::render(
            "over_offset_in_place expects buffers matching width*height*4",
        ));
    }
    let (w, h) = (i64::from(width), i64::from(height));
    for y in 0..h {
        let sy = y - dy;
        if sy < 0 || sy >= h {
            continue;
        }
        for x in 0..w {
            let sx = x - dx;
            if sx < 0 || sx >= w {
                continue;
            }
            let si = ((sy * w + sx) * 4) as usize;
            if src[si + 3] == 0 {
                continue;
            }
            let di = ((y * w + x) * 4) as usize;
            let s = [src[si], src[si + 1], src[si + 2], src[si + 3]];
            let d = [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]];
            dst[di..di + 4].copy_from_slice(&over(d, s, 1.0));
        }
    }
    Ok(())
}

/// Blend `src` over `dst` through a moving wipe mask.
pub(crate) fn wipe_over_in_place(
    dst: &mut [u8],
    src: &[u8],
    params: WipeParams,
) -> SlidecastResult<()> {
    let WipeParams {
        width,
        height,
        t,
        dir,
        soft_edge,
    } = params;
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| SlidecastError::render("wipe buffer size overflow"))?;

    if dst.len() != expected_len || src.len() != expected_len {
        return Err(SlidecastError::render(
            "wipe_over_in_place expects buffers matching width*height*4",
        ));
    }

    let t = t.clamp(0.0, 1.0);
    let soft_edge = soft_edge.max(0.0);

    let axis_len = match dir {
        Direction::LeftToRight | Direction::RightToLeft => width as f32,
        Direction::TopToBottom | Direction::BottomToTop => height as f32,
    };
    let soft_px = soft_edge * axis_len;

    let edge = t * (axis_len + 2.0 * soft_px) - soft_px;
    let a_edge = edge - soft_px;
    let b_edge = edge + soft_px;

    for y in 0..height {
        for x in 0..width {
            let pos = match dir {
                Direction::LeftToRight => x as f32,
                Direction::RightToLeft => (width - 1 - x) as f32,
                Direction::TopToBottom => y as f32,
                Direction::BottomToTop => (height - 1 - y) as f32,
            };

            let m = if soft_px <= 0.0 {
                if pos < edge { 1.0 } else { 0.0 }
            } else {
                1.0 - smoothstep(a_edge, b_edge, pos)
            };
            if m <= 0.0 {
                continue;
            }

            let idx = ((y as usize) * (width as usize) + (x as usize)) * 4;
            let sp = [src[idx], src[idx + 1], src[idx + 2], src[idx + 3]];
            let dp = [dst[idx], dst[idx + 1], dst[idx + 2], dst[idx + 3]];
            dst[idx..idx + 4].copy_from_slice(&over(dp, sp, m));
        }
    }

    Ok(())
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct WipeParams {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) t: f32,
    pub(crate) dir: Direction,
    pub(crate) soft_edge: f32,
}

fn smoothstep(a: f32, b: f32, x: f32) -> f32 {
    if x <= a {
        return 0.0;
    }
    if x >= b {
        return 1.0;
    }
    let t = (x - a) / (b - a);
    (t * t * (3.0 - 2.0 * t)).clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
