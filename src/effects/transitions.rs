use crate::effects::composite::{
    Direction, WipeParams, over_in_place, over_offset_in_place, wipe_over_in_place,
};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::render::surface::Surface;

/// Serialized transition selection, e.g. `{"kind": "wipe", "params": {"dir": "ttb"}}`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransitionSpec {
    /// Transition kind name (`cut`, `fade`, `wipe`, `push`).
    pub kind: String,
    /// Kind-specific parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl Default for TransitionSpec {
    fn default() -> Self {
        Self {
            kind: "fade".to_owned(),
            params: serde_json::Value::Null,
        }
    }
}

/// How a layer enters (or, run backwards, leaves) the presentation surface.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum TransitionKind {
    /// Drawn fully regardless of progress.
    Cut,
    /// Opacity follows progress.
    #[default]
    Fade,
    /// Revealed behind a moving edge.
    Wipe {
        /// Direction the edge travels.
        dir: Direction,
        /// Width of the soft edge as a fraction of the axis length, in `[0, 1]`.
        soft_edge: f32,
    },
    /// Slides in from the edge it travels away from.
    Push {
        /// Direction of travel.
        dir: Direction,
    },
}

impl TransitionKind {
    /// Draw `src` over `dst` with this effect at `progress` (0 = invisible, 1 = fully placed).
    pub fn apply(self, dst: &mut Surface, src: &Surface, progress: f32) -> SlidecastResult<()> {
        if dst.desc() != src.desc() {
            return Err(SlidecastError::render(
                "transition layers must match the destination size",
            ));
        }
        let p = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let (width, height) = (dst.width(), dst.height());
        match self {
            Self::Cut => over_in_place(dst.data_mut(), src.data(), 1.0),
            Self::Fade => over_in_place(dst.data_mut(), src.data(), p),
            Self::Wipe { dir, soft_edge } => {
                if p >= 1.0 {
                    return over_in_place(dst.data_mut(), src.data(), 1.0);
                }
                wipe_over_in_place(
                    dst.data_mut(),
                    src.data(),
                    WipeParams {
                        width,
                        height,
                        t: p,
                        dir,
                        soft_edge,
                    },
                )
            }
            Self::Push { dir } => {
                let remaining = 1.0 - p;
                let (dx, dy) = match dir {
                    Direction::LeftToRight => (-(remaining * width as f32).round() as i64, 0),
                    Direction::RightToLeft => ((remaining * width as f32).round() as i64, 0),
                    Direction::TopToBottom => (0, -(remaining * height as f32).round() as i64),
                    Direction::BottomToTop => (0, (remaining * height as f32).round() as i64),
                };
                over_offset_in_place(dst.data_mut(), src.data(), width, height, dx, dy)
            }
        }
    }

    /// `true` when nothing would be drawn at `progress`.
    pub fn is_invisible_at(self, progress: f32) -> bool {
        !matches!(self, Self::Cut) && progress <= 0.0
    }
}

/// Parse a [`TransitionSpec`] into a concrete [`TransitionKind`].
pub fn parse_transition(spec: &TransitionSpec) -> SlidecastResult<TransitionKind> {
    let kind = spec.kind.trim().to_ascii_lowercase();
    if kind.is_empty() {
        return Err(SlidecastError::validation("transition kind must be non-empty"));
    }

    let params = if spec.params.is_null() {
        None
    } else {
        Some(spec.params.as_object().ok_or_else(|| {
            SlidecastError::validation(format!("{kind} params must be an object"))
        })?)
    };
    let dir = || -> SlidecastResult<Direction> {
        match params.and_then(|p| p.get("dir")).and_then(|v| v.as_str()) {
            None => Ok(Direction::LeftToRight),
            Some(s) => parse_direction(s),
        }
    };

    match kind.as_str() {
        "cut" | "none" => Ok(TransitionKind::Cut),
        "fade" | "crossfade" => Ok(TransitionKind::Fade),
        "wipe" => {
            let soft_edge = match params
                .and_then(|p| p.get("soft_edge"))
                .and_then(|v| v.as_f64())
            {
                None => 0.0,
                Some(v) => {
                    let f = v as f32;
                    if !f.is_finite() {
                        return Err(SlidecastError::validation(
                            "wipe.soft_edge must be finite when set",
                        ));
                    }
                    f.clamp(0.0, 1.0)
                }
            };
            Ok(TransitionKind::Wipe {
                dir: dir()?,
                soft_edge,
            })
        }
        "push" | "slide" => Ok(TransitionKind::Push { dir: dir()? }),
        _ => Err(SlidecastError::validation(format!(
            "unknown transition kind '{kind}'"
        ))),
    }
}

fn parse_direction(s: &str) -> SlidecastResult<Direction> {
    match s.trim().to_ascii_lowercase().as_str() {
        "left_to_right" | "lefttoright" | "ltr" => Ok(Direction::LeftToRight),
        "right_to_left" | "righttoleft" | "rtl" => Ok(Direction::RightToLeft),
        "top_to_bottom" | "toptobottom" | "ttb" => Ok(Direction::TopToBottom),
        "bottom_to_top" | "bottomtotop" | "btt" => Ok(Direction::BottomToTop),
        other => Err(SlidecastError::validation(format!(
            "unknown transition dir '{other}'"
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/transitions.rs"]
mod tests;
