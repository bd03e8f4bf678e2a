//! Knots: authored control points of a spline.

use serde::{Deserialize, Serialize};

use crate::data::{InterpMode, TangentAlgorithm};
use crate::error::{Result, SplineError};
use crate::value::{cast_value, SplineValue};

/// One side of a knot's tangent.
///
/// `width` is a time extent (always non-negative); `slope` is value per unit
/// time. Pre tangents point backward in time, post tangents forward.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tangent<V> {
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub slope: V,
    #[serde(default)]
    pub algorithm: TangentAlgorithm,
}

impl<V: SplineValue> Tangent<V> {
    pub fn new(width: f64, slope: V) -> Self {
        Self {
            width,
            slope,
            algorithm: TangentAlgorithm::None,
        }
    }

    pub fn custom(width: f64, slope: V) -> Self {
        Self {
            width,
            slope,
            algorithm: TangentAlgorithm::Custom,
        }
    }

    pub fn auto_ease() -> Self {
        Self {
            width: 0.0,
            slope: V::zero(),
            algorithm: TangentAlgorithm::AutoEase,
        }
    }

    pub fn with_algorithm(mut self, algorithm: TangentAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Value extent of the tangent (`width * slope`).
    #[inline]
    pub fn height(&self) -> V {
        self.slope.scale(self.width)
    }

    pub fn cast<T: SplineValue>(&self) -> Result<Tangent<T>> {
        Ok(Tangent {
            width: self.width,
            slope: cast_value(self.slope)?,
            algorithm: self.algorithm,
        })
    }
}

/// An authored control point.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Knot<V> {
    pub time: f64,
    /// Value approached from the right.
    pub value: V,
    /// Value approached from the left, when different from `value`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_value: Option<V>,
    /// Interpolation of the segment starting at this knot.
    #[serde(default)]
    pub next_interp: InterpMode,
    #[serde(default)]
    pub pre_tangent: Tangent<V>,
    #[serde(default)]
    pub post_tangent: Tangent<V>,
}

impl<V: SplineValue> Knot<V> {
    pub fn new(time: f64, value: V) -> Self {
        Self {
            time,
            value,
            pre_value: None,
            next_interp: InterpMode::Held,
            pre_tangent: Tangent::default(),
            post_tangent: Tangent::default(),
        }
    }

    pub fn with_interp(mut self, next_interp: InterpMode) -> Self {
        self.next_interp = next_interp;
        self
    }

    pub fn with_pre_value(mut self, pre_value: V) -> Self {
        self.pre_value = Some(pre_value);
        self
    }

    pub fn with_pre_tangent(mut self, tangent: Tangent<V>) -> Self {
        self.pre_tangent = tangent;
        self
    }

    pub fn with_post_tangent(mut self, tangent: Tangent<V>) -> Self {
        self.post_tangent = tangent;
        self
    }

    /// Set both tangent algorithms.
    pub fn with_algorithm(mut self, algorithm: TangentAlgorithm) -> Self {
        self.pre_tangent.algorithm = algorithm;
        self.post_tangent.algorithm = algorithm;
        self
    }

    /// Value approached from the left.
    #[inline]
    pub fn pre_value(&self) -> V {
        self.pre_value.unwrap_or(self.value)
    }

    #[inline]
    pub fn is_dual_valued(&self) -> bool {
        self.pre_value.is_some_and(|pv| pv != self.value)
    }

    /// Value extent of the pre tangent, pointing backward in time.
    #[inline]
    pub fn pre_height(&self) -> V {
        -self.pre_tangent.height()
    }

    #[inline]
    pub fn post_height(&self) -> V {
        self.post_tangent.height()
    }

    /// Copy moved by `dt` in time and `dv` in value.
    pub fn shifted(&self, dt: f64, dv: V) -> Self {
        let mut out = *self;
        out.time += dt;
        out.value = out.value + dv;
        out.pre_value = out.pre_value.map(|pv| pv + dv);
        out
    }

    /// Reject knots the store cannot hold.
    pub fn validate(&self) -> Result<()> {
        if !self.time.is_finite() {
            return Err(SplineError::InvalidKnot {
                reason: format!("knot time must be finite, got {}", self.time),
            });
        }
        for (side, tangent) in [("pre", &self.pre_tangent), ("post", &self.post_tangent)] {
            if !(tangent.width >= 0.0) || !tangent.width.is_finite() {
                return Err(SplineError::InvalidKnot {
                    reason: format!(
                        "{side} tangent width at time {} must be finite and non-negative, got {}",
                        self.time, tangent.width
                    ),
                });
            }
        }
        Ok(())
    }

    /// Convert to a castable value type.
    pub fn cast<T: SplineValue>(&self) -> Result<Knot<T>> {
        Ok(Knot {
            time: self.time,
            value: cast_value(self.value)?,
            pre_value: self.pre_value.map(cast_value).transpose()?,
            next_interp: self.next_interp,
            pre_tangent: self.pre_tangent.cast()?,
            post_tangent: self.post_tangent.cast()?,
        })
    }
}
