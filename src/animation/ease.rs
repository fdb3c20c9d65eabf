use std::f64::consts::{FRAC_PI_2, PI};

/// Stable persisted identifier of an easing curve family.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct EaseId(pub u16);

/// An easing curve family.
///
/// Every family exposes three variants over absolute time: [`Ease::ease_in`], [`Ease::ease_out`]
/// and [`Ease::ease_in_out`]. All of them map `time` in `[0, duration]` to a completion fraction in
/// `[0, 1]` (elastic overshoots inside the interval but still lands exactly on 0 and 1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Ease {
    /// Constant velocity.
    Linear,
    /// `t^2`.
    Quadratic,
    /// `t^3`.
    Cubic,
    /// `t^4`.
    Quartic,
    /// `t^5`.
    Quintic,
    /// Quarter sine wave.
    Sine,
    /// `2^(10(t-1))`.
    Exponential,
    /// Quarter circle.
    Circular,
    /// Damped oscillation that overshoots before settling.
    Elastic {
        /// Overshoot amplitude, clamped to `>= 1`.
        amplitude: f64,
        /// Oscillations per unit time; the period is `1 / oscillations`.
        oscillations: f64,
    },
}

impl Ease {
    /// Elastic curve with the default amplitude (1) and three oscillations.
    pub const ELASTIC: Ease = Ease::Elastic {
        amplitude: 1.0,
        oscillations: 3.0,
    };

    /// Persisted id of this family. Parameters of elastic curves are not part of the id.
    pub const fn id(self) -> EaseId {
        match self {
            Self::Linear => EaseId(10),
            Self::Quadratic => EaseId(20),
            Self::Cubic => EaseId(30),
            Self::Quartic => EaseId(40),
            Self::Quintic => EaseId(50),
            Self::Sine => EaseId(60),
            Self::Exponential => EaseId(70),
            Self::Circular => EaseId(80),
            Self::Elastic { .. } => EaseId(90),
        }
    }

    /// Lowercase family name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Quadratic => "quadratic",
            Self::Cubic => "cubic",
            Self::Quartic => "quartic",
            Self::Quintic => "quintic",
            Self::Sine => "sine",
            Self::Exponential => "exponential",
            Self::Circular => "circular",
            Self::Elastic { .. } => "elastic",
        }
    }

    /// `true` for the polynomial families whose in/out halves mirror each other exactly.
    pub const fn is_symmetric(self) -> bool {
        matches!(
            self,
            Self::Linear | Self::Quadratic | Self::Cubic | Self::Quartic | Self::Quintic
        )
    }

    /// Accelerate from 0.
    pub fn ease_in(self, time: f64, duration: f64) -> f64 {
        match unit_time(time, duration) {
            Unit::Start => 0.0,
            Unit::End => 1.0,
            Unit::Inner(t) => self.in_unit(t),
        }
    }

    /// Decelerate into 1.
    pub fn ease_out(self, time: f64, duration: f64) -> f64 {
        match unit_time(time, duration) {
            Unit::Start => 0.0,
            Unit::End => 1.0,
            Unit::Inner(t) => self.out_unit(t),
        }
    }

    /// Ease in over the first half, ease out over the second.
    pub fn ease_in_out(self, time: f64, duration: f64) -> f64 {
        match unit_time(time, duration) {
            Unit::Start => 0.0,
            Unit::End => 1.0,
            Unit::Inner(t) => {
                if t < 0.5 {
                    self.in_unit(2.0 * t) / 2.0
                } else {
                    0.5 + self.out_unit(2.0 * t - 1.0) / 2.0
                }
            }
        }
    }

    fn in_unit(self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Self::Linear => t,
            Self::Quadratic => t * t,
            Self::Cubic => t * t * t,
            Self::Quartic => t.powi(4),
            Self::Quintic => t.powi(5),
            Self::Sine => 1.0 - (t * FRAC_PI_2).cos(),
            Self::Exponential => 2f64.powf(10.0 * (t - 1.0)),
            Self::Circular => 1.0 - (1.0 - t * t).sqrt(),
            Self::Elastic {
                amplitude,
                oscillations,
            } => elastic_in(t, amplitude, oscillations),
        }
    }

    fn out_unit(self, t: f64) -> f64 {
        1.0 - self.in_unit(1.0 - t)
    }
}

enum Unit {
    Start,
    End,
    Inner(f64),
}

// Endpoints are exact for every family; the general formulas (elastic, exponential) are not.
fn unit_time(time: f64, duration: f64) -> Unit {
    if duration.is_nan() || duration <= 0.0 || time >= duration {
        return Unit::End;
    }
    if time.is_nan() || time <= 0.0 {
        return Unit::Start;
    }
    Unit::Inner(time / duration)
}

fn elastic_in(t: f64, amplitude: f64, oscillations: f64) -> f64 {
    let a = if amplitude.is_finite() {
        amplitude.max(1.0)
    } else {
        1.0
    };
    let period = 1.0 / oscillations.max(0.1);
    let s = period / (2.0 * PI) * (1.0 / a).asin();
    let t1 = t - 1.0;
    -(a * 2f64.powf(10.0 * t1) * ((t1 - s) * (2.0 * PI) / period).sin())
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
