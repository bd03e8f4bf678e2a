//! Spline-wide configuration types: interpolation modes, curve type, tangent
//! algorithms, loop parameters and extrapolation policies.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SplineError};
use crate::interval::TimeInterval;
use crate::value::{cast_value, SplineValue};

/// Interpolation of the segment that starts at a knot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpMode {
    /// No value anywhere in the segment.
    ValueBlock,
    #[default]
    Held,
    Linear,
    /// Cubic, interpreted per the spline's [`CurveType`].
    Curve,
}

/// Cubic basis used for `InterpMode::Curve` segments.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveType {
    #[default]
    Bezier,
    Hermite,
}

/// How a tangent's slope and width are derived.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TangentAlgorithm {
    /// Slope as authored.
    #[default]
    None,
    /// Slope as authored; marks the tangent as hand-edited.
    Custom,
    /// Slope and width computed from the neighboring knots.
    AutoEase,
}

/// Behavior before the first knot or after the last one.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Extrapolation<V> {
    ValueBlock,
    #[default]
    Held,
    Linear,
    Sloped {
        slope: V,
    },
    LoopRepeat,
    LoopReset,
    LoopOscillate,
}

impl<V: SplineValue> Extrapolation<V> {
    pub fn sloped(slope: V) -> Self {
        Self::Sloped { slope }
    }

    #[inline]
    pub fn is_looping(&self) -> bool {
        matches!(
            self,
            Extrapolation::LoopRepeat | Extrapolation::LoopReset | Extrapolation::LoopOscillate
        )
    }

    pub fn cast<T: SplineValue>(&self) -> Result<Extrapolation<T>> {
        Ok(match *self {
            Extrapolation::ValueBlock => Extrapolation::ValueBlock,
            Extrapolation::Held => Extrapolation::Held,
            Extrapolation::Linear => Extrapolation::Linear,
            Extrapolation::Sloped { slope } => Extrapolation::Sloped {
                slope: cast_value(slope)?,
            },
            Extrapolation::LoopRepeat => Extrapolation::LoopRepeat,
            Extrapolation::LoopReset => Extrapolation::LoopReset,
            Extrapolation::LoopOscillate => Extrapolation::LoopOscillate,
        })
    }
}

/// Inner-loop description: the prototype `[proto_start, proto_end)` is
/// repeated `num_pre_loops` times before itself and `num_post_loops` times
/// after, each repetition shifted in value by `value_offset`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoopParams<V> {
    pub proto_start: f64,
    pub proto_end: f64,
    pub num_pre_loops: i32,
    pub num_post_loops: i32,
    #[serde(default)]
    pub value_offset: V,
}

impl<V: SplineValue> LoopParams<V> {
    pub fn new(proto_start: f64, proto_end: f64) -> Self {
        Self {
            proto_start,
            proto_end,
            num_pre_loops: 0,
            num_post_loops: 0,
            value_offset: V::zero(),
        }
    }

    pub fn with_loops(mut self, num_pre_loops: i32, num_post_loops: i32) -> Self {
        self.num_pre_loops = num_pre_loops;
        self.num_post_loops = num_post_loops;
        self
    }

    pub fn with_value_offset(mut self, value_offset: V) -> Self {
        self.value_offset = value_offset;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.proto_start.is_finite() || !self.proto_end.is_finite() {
            return Err(SplineError::invalid_loop_params(format!(
                "prototype bounds must be finite, got [{}, {}]",
                self.proto_start, self.proto_end
            )));
        }
        if self.proto_start >= self.proto_end {
            return Err(SplineError::invalid_loop_params(format!(
                "prototype start {} must precede end {}",
                self.proto_start, self.proto_end
            )));
        }
        if self.num_pre_loops < 0 || self.num_post_loops < 0 {
            return Err(SplineError::invalid_loop_params(format!(
                "loop counts must be non-negative, got pre={} post={}",
                self.num_pre_loops, self.num_post_loops
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn period(&self) -> f64 {
        self.proto_end - self.proto_start
    }

    #[inline]
    pub fn has_repeats(&self) -> bool {
        self.num_pre_loops > 0 || self.num_post_loops > 0
    }

    /// Time of `time` moved by `iterations` whole periods.
    #[inline]
    pub fn shift_time(&self, time: f64, iterations: i64) -> f64 {
        time + iterations as f64 * self.period()
    }

    /// The half-open prototype interval.
    pub fn prototype_interval(&self) -> TimeInterval {
        TimeInterval::new(self.proto_start, self.proto_end).with_closed(true, false)
    }

    /// Prototype plus every repetition, closed on both ends. The end is the
    /// time of the last closing echo.
    pub fn looped_interval(&self) -> TimeInterval {
        TimeInterval::new(
            self.shift_time(self.proto_start, -i64::from(self.num_pre_loops)),
            self.shift_time(self.proto_start, i64::from(self.num_post_loops) + 1),
        )
    }

    pub fn cast<T: SplineValue>(&self) -> Result<LoopParams<T>> {
        Ok(LoopParams {
            proto_start: self.proto_start,
            proto_end: self.proto_end,
            num_pre_loops: self.num_pre_loops,
            num_post_loops: self.num_post_loops,
            value_offset: cast_value(self.value_offset)?,
        })
    }
}
