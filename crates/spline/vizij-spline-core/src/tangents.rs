//! Tangent resolution.
//!
//! Each side of a knot is resolved from the knot, its immediate neighbors,
//! and the curve type:
//!
//! - `None` / `Custom`: slope as authored. Width becomes a third of the
//!   distance to the neighbor on that side when the curve type is Hermite
//!   and that neighbor exists.
//! - `AutoEase`: slope eases between the slopes to the neighbors and is
//!   flattened at local extrema; width is a third of the distance to the
//!   neighbor. With a neighbor on one side only, the side facing it gets a
//!   flat slope; the side facing the spline boundary is left as authored.
//!
//! The same rules run inside a [`Spline`](crate::Spline) and through
//! [`Knot::update_tangents`] for knots edited outside one.

use crate::data::{CurveType, TangentAlgorithm};
use crate::error::{Result, SplineError};
use crate::knot::{Knot, Tangent};
use crate::value::SplineValue;

/// Ease slope for one component, with neighbor slopes `p` and `n` and the
/// knot's fractional position `f` between its neighbors.
fn ease_component(p: f64, n: f64, f: f64) -> f64 {
    let u = f - 0.5;
    let g = 0.5 + u * (0.5 + 2.0 * u * u);
    let slope = (1.0 - g) * p + g * n;
    if p * n < 0.0 {
        0.0
    } else if n > 0.0 {
        slope.min(3.0 * n).min(3.0 * p)
    } else {
        slope.max(3.0 * n).max(3.0 * p)
    }
}

/// Auto-ease slope of `knot` between `prev` and `next`.
pub fn auto_ease_slope<V: SplineValue>(prev: &Knot<V>, knot: &Knot<V>, next: &Knot<V>) -> V {
    let p_slope = (knot.pre_value() - prev.value).scale(1.0 / (knot.time - prev.time));
    let n_slope = (next.pre_value() - knot.value).scale(1.0 / (next.time - knot.time));
    let f = (knot.time - prev.time) / (next.time - prev.time);
    p_slope.zip_map(n_slope, |p, n| ease_component(p, n, f))
}

fn resolve_side<V: SplineValue>(
    tangent: &mut Tangent<V>,
    neighbor_distance: Option<f64>,
    ease_slope: Option<V>,
    curve_type: CurveType,
) -> bool {
    let before = *tangent;
    match tangent.algorithm {
        TangentAlgorithm::None | TangentAlgorithm::Custom => {
            if let (CurveType::Hermite, Some(dist)) = (curve_type, neighbor_distance) {
                tangent.width = dist / 3.0;
            }
        }
        TangentAlgorithm::AutoEase => {
            if let Some(dist) = neighbor_distance {
                tangent.width = dist / 3.0;
                tangent.slope = ease_slope.unwrap_or_else(V::zero);
            }
        }
    }
    *tangent != before
}

/// Resolve both sides of `knot` in place. Neighbors must bracket the knot.
/// Returns whether anything changed.
pub(crate) fn resolve_tangents<V: SplineValue>(
    knot: &mut Knot<V>,
    prev: Option<&Knot<V>>,
    next: Option<&Knot<V>>,
    curve_type: CurveType,
) -> bool {
    let ease = match (prev, next) {
        (Some(p), Some(n)) => Some(auto_ease_slope(p, knot, n)),
        _ => None,
    };
    let pre_dist = prev.map(|p| knot.time - p.time);
    let post_dist = next.map(|n| n.time - knot.time);
    let pre_changed = resolve_side(&mut knot.pre_tangent, pre_dist, ease, curve_type);
    let post_changed = resolve_side(&mut knot.post_tangent, post_dist, ease, curve_type);
    pre_changed || post_changed
}

impl<V: SplineValue> Knot<V> {
    /// Recompute this knot's tangents from explicit neighbors, outside any
    /// spline. With no neighbors nothing changes.
    ///
    /// Fails without modifying the knot if a neighbor is not strictly on its
    /// side of the knot. Returns whether the knot changed.
    pub fn update_tangents(
        &mut self,
        prev: Option<&Knot<V>>,
        next: Option<&Knot<V>>,
        curve_type: CurveType,
    ) -> Result<bool> {
        if let Some(p) = prev {
            if !(p.time < self.time) {
                return Err(SplineError::InvalidNeighbors {
                    reason: format!(
                        "previous knot at {} is not before knot at {}",
                        p.time, self.time
                    ),
                });
            }
        }
        if let Some(n) = next {
            if !(n.time > self.time) {
                return Err(SplineError::InvalidNeighbors {
                    reason: format!(
                        "next knot at {} is not after knot at {}",
                        n.time, self.time
                    ),
                });
            }
        }
        Ok(resolve_tangents(self, prev, next, curve_type))
    }
}
