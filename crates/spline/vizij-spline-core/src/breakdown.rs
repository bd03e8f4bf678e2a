//! Breakdown: inserting a knot without changing the curve's shape.
//!
//! The new knot takes its value (and, inside a Curve segment, its tangents)
//! from the curve at the breakdown time. Bezier segments are split with De
//! Casteljau's algorithm so both halves retrace the original segment; Hermite
//! segments take the value and derivative of the original cubic.
//!
//! The edit is built on a copy of the spline and committed only once it is
//! complete. The returned interval is found by comparing the effective knot
//! sequences (echoes included) before and after, so the curve is unchanged
//! outside it even when the edit is mirrored into loop repetitions or moves
//! an auto-ease tangent on the far side of a neighbor.

use log::debug;

use crate::data::{CurveType, Extrapolation, InterpMode, TangentAlgorithm};
use crate::error::{Result, SplineError};
use crate::eval::EvalAspect;
use crate::interp::functions::{bezier_parameter, lerp};
use crate::interval::TimeInterval;
use crate::knot::{Knot, Tangent};
use crate::loops::ViewKnot;
use crate::regression::{self, AntiRegressionMode};
use crate::spline::Spline;
use crate::value::SplineValue;

/// A Bezier control point in (time, value) space.
#[derive(Copy, Clone, Debug)]
struct Point<V> {
    t: f64,
    v: V,
}

impl<V: SplineValue> Point<V> {
    fn lerp(self, other: Self, u: f64) -> Self {
        Self {
            t: self.t + (other.t - self.t) * u,
            v: lerp(self.v, other.v, u),
        }
    }
}

/// Express the handle vector `(dt, dv)` as a tangent. Vertical handles get
/// `near_vertical` as the slope of their largest component.
fn tangent_from_vector<V: SplineValue>(dt: f64, dv: V, near_vertical: f64) -> Tangent<V> {
    if dt > 0.0 {
        return Tangent::new(dt, dv.scale(1.0 / dt));
    }
    let rise = dv.max_abs();
    if rise == 0.0 {
        return Tangent::new(0.0, V::zero());
    }
    let width = rise / near_vertical;
    Tangent::new(width, dv.scale(1.0 / width))
}

/// Knots produced by a breakdown: the new knot and the neighbors as they
/// should be after the edit. Generated neighbors are never written back.
struct BreakdownEdit<V> {
    knot: Knot<V>,
    prev: Option<ViewKnot<V>>,
    next: Option<ViewKnot<V>>,
}

/// What a segment's shape depends on. Unused fields stay `None` so that
/// tangent changes on held or linear segments do not count as changes.
#[derive(Debug, PartialEq)]
struct SegmentSignature<V> {
    start: f64,
    end: f64,
    interp: InterpMode,
    start_value: Option<V>,
    end_value: Option<V>,
    start_tangent: Option<(f64, V)>,
    end_tangent: Option<(f64, V)>,
}

fn segment_signature<V: SplineValue>(
    a: &Knot<V>,
    b: &Knot<V>,
    curve_type: CurveType,
) -> SegmentSignature<V> {
    let mut sig = SegmentSignature {
        start: a.time,
        end: b.time,
        interp: a.next_interp,
        start_value: None,
        end_value: None,
        start_tangent: None,
        end_tangent: None,
    };
    match a.next_interp {
        InterpMode::ValueBlock => {}
        InterpMode::Held => sig.start_value = Some(a.value),
        InterpMode::Linear => {
            sig.start_value = Some(a.value);
            sig.end_value = Some(b.pre_value());
        }
        InterpMode::Curve => {
            sig.start_value = Some(a.value);
            sig.end_value = Some(b.pre_value());
            // Hermite segments ignore widths
            let width = |w: f64| if curve_type == CurveType::Hermite { 0.0 } else { w };
            sig.start_tangent = Some((width(a.post_tangent.width), a.post_tangent.slope));
            sig.end_tangent = Some((width(b.pre_tangent.width), b.pre_tangent.slope));
        }
    }
    sig
}

fn values_close<V: SplineValue>(a: Option<V>, b: Option<V>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            let scale = a.max_abs().max(b.max_abs()).max(1.0);
            a.approx_eq(&b, 1e-9 * scale)
        }
        _ => false,
    }
}

impl<V: SplineValue> Spline<V> {
    /// Whether [`Spline::breakdown`] would succeed at `time`. The error
    /// carries the reason.
    pub fn can_breakdown(&self, time: f64) -> Result<()> {
        if self.is_empty() {
            return Err(SplineError::precondition(
                "Cannot breakdown an empty spline.",
            ));
        }
        if !time.is_finite() {
            return Err(SplineError::precondition(format!(
                "Cannot breakdown a spline at a non-finite time. (time={time})"
            )));
        }
        let echoed = self.has_inner_loops().then(|| self.inner_loop_params()).flatten();
        if let Some(params) = echoed {
            if params.looped_interval().contains(time)
                && !params.prototype_interval().contains(time)
            {
                return Err(SplineError::precondition(format!(
                    "Cannot breakdown a spline in a region masked by inner looping. (time={time})"
                )));
            }
        }

        let view = self.knot_view();
        let len = view.len();
        if len > 1 {
            if time < view.time(0) && self.pre_extrapolation().is_looping() {
                return Err(SplineError::precondition(format!(
                    "Cannot breakdown a spline in a looping pre-extrapolation region. (time={time})"
                )));
            }
            if time > view.time(len - 1) && self.post_extrapolation().is_looping() {
                return Err(SplineError::precondition(format!(
                    "Cannot breakdown a spline in a looping post-extrapolation region. (time={time})"
                )));
            }
        }

        let lb = view.lower_bound(time);
        if lb < len && view.time(lb) == time {
            return Err(SplineError::precondition(format!(
                "Cannot breakdown a spline at an existing knot. (time={time})"
            )));
        }
        Ok(())
    }

    /// Insert a knot at `time` that leaves the curve's shape unchanged
    /// outside the returned interval. Fails without modifying the spline if
    /// [`Spline::can_breakdown`] refuses.
    pub fn breakdown(&mut self, time: f64) -> Result<TimeInterval> {
        if let Err(err) = self.can_breakdown(time) {
            debug!("breakdown refused: {err}");
            return Err(err);
        }

        let mut edited = self.clone();
        edited.apply_breakdown(time)?;
        let interval = changed_interval(self, &edited)
            .unwrap_or_else(|| TimeInterval::new(time, time));
        debug!(
            "breakdown at {time}, affected [{}, {}]",
            interval.min, interval.max
        );
        *self = edited;
        Ok(interval)
    }

    fn apply_breakdown(&mut self, time: f64) -> Result<()> {
        let edit = {
            let view = self.knot_view();
            let len = view.len();
            let lb = view.lower_bound(time);
            let prev = (lb > 0).then(|| view.get(lb - 1));
            let next = (lb < len).then(|| view.get(lb));
            match (prev, next) {
                (None, Some(next)) => self.breakdown_before_start(time, next),
                (Some(prev), None) => self.breakdown_after_end(time, prev),
                (Some(prev), Some(next)) => self.breakdown_between(time, prev, next),
                (None, None) => {
                    return Err(SplineError::precondition(
                        "Cannot breakdown an empty spline.",
                    ))
                }
            }
        };

        for neighbor in [edit.prev, edit.next].into_iter().flatten() {
            if let Some(index) = neighbor.source {
                self.knots_mut()[index] = neighbor.knot;
            }
        }
        let index = match self.find(time) {
            Ok(_) => {
                return Err(SplineError::precondition(format!(
                    "Cannot breakdown a spline at an existing knot. (time={time})"
                )))
            }
            Err(i) => i,
        };
        self.knots_mut().insert(index, edit.knot);
        self.update_knot_tangents(index, false);
        Ok(())
    }

    /// A knot on the extrapolated curve, interpolating the way the
    /// extrapolation it replaces does.
    fn extrapolated_knot(&self, time: f64, pre: bool) -> Knot<V> {
        let extrap = if pre {
            self.pre_extrapolation()
        } else {
            self.post_extrapolation()
        };
        let slope = self.extrapolation_slope(&self.knot_view(), pre);
        let mut knot = Knot::new(time, V::zero());
        if let Some(value) = self.eval(time) {
            knot.value = value;
        }
        knot.next_interp = match extrap {
            Extrapolation::ValueBlock => InterpMode::ValueBlock,
            Extrapolation::Linear | Extrapolation::Sloped { .. } => {
                let slope = slope.unwrap_or_else(V::zero);
                knot.pre_tangent.slope = slope;
                knot.post_tangent.slope = slope;
                InterpMode::Linear
            }
            _ => InterpMode::Held,
        };
        knot
    }

    fn breakdown_before_start(&self, time: f64, next: ViewKnot<V>) -> BreakdownEdit<V> {
        let mut knot = self.extrapolated_knot(time, true);
        if knot.next_interp == InterpMode::ValueBlock {
            knot.value = next.knot.pre_value();
        }
        knot.pre_tangent.width = next.knot.pre_tangent.width;
        knot.post_tangent.width = (next.knot.time - time) / 3.0;
        BreakdownEdit {
            knot,
            prev: None,
            next: None,
        }
    }

    fn breakdown_after_end(&self, time: f64, mut prev: ViewKnot<V>) -> BreakdownEdit<V> {
        let mut knot = self.extrapolated_knot(time, false);
        if knot.next_interp == InterpMode::ValueBlock {
            knot.value = prev.knot.value;
        }
        knot.pre_tangent.width = (time - prev.knot.time) / 3.0;
        knot.post_tangent.width = prev.knot.post_tangent.width;
        // the old last knot now starts a segment that must match the
        // extrapolation it replaces
        prev.knot.next_interp = knot.next_interp;
        BreakdownEdit {
            knot,
            prev: Some(prev),
            next: None,
        }
    }

    fn breakdown_between(
        &self,
        time: f64,
        mut prev: ViewKnot<V>,
        mut next: ViewKnot<V>,
    ) -> BreakdownEdit<V> {
        let mut knot = Knot::new(time, prev.knot.value);
        knot.next_interp = prev.knot.next_interp;
        knot.pre_tangent.width = (time - prev.knot.time) / 3.0;
        knot.post_tangent.width = (next.knot.time - time) / 3.0;

        match prev.knot.next_interp {
            InterpMode::ValueBlock | InterpMode::Held => {}
            InterpMode::Linear => {
                if let Some(value) =
                    self.interpolate(&prev.knot, &next.knot, time, EvalAspect::Value)
                {
                    knot.value = value;
                }
            }
            InterpMode::Curve => {
                match self.curve_type() {
                    CurveType::Hermite => {
                        let value =
                            self.interpolate(&prev.knot, &next.knot, time, EvalAspect::Value);
                        let slope =
                            self.interpolate(&prev.knot, &next.knot, time, EvalAspect::Derivative);
                        knot.value = value.unwrap_or(prev.knot.value);
                        let slope = slope.unwrap_or_else(V::zero);
                        knot.pre_tangent.slope = slope;
                        knot.post_tangent.slope = slope;
                    }
                    CurveType::Bezier => {
                        self.split_bezier(time, &mut prev.knot, &mut knot, &mut next.knot);
                    }
                }
                prev.knot.post_tangent.algorithm = TangentAlgorithm::None;
                knot.pre_tangent.algorithm = TangentAlgorithm::None;
                knot.post_tangent.algorithm = TangentAlgorithm::None;
                next.knot.pre_tangent.algorithm = TangentAlgorithm::None;
            }
        }

        BreakdownEdit {
            knot,
            prev: Some(prev),
            next: Some(next),
        }
    }

    fn split_bezier(&self, time: f64, prev: &mut Knot<V>, knot: &mut Knot<V>, next: &mut Knot<V>) {
        regression::process_segment(prev, next, AntiRegressionMode::KeepRatio);

        let cp0 = Point {
            t: prev.time,
            v: prev.value,
        };
        let cp1 = Point {
            t: prev.time + prev.post_tangent.width,
            v: prev.value + prev.post_height(),
        };
        let cp2 = Point {
            t: next.time - next.pre_tangent.width,
            v: next.pre_value() + next.pre_height(),
        };
        let cp3 = Point {
            t: next.time,
            v: next.pre_value(),
        };
        let u = bezier_parameter(
            [cp0.t, cp1.t, cp2.t, cp3.t],
            time,
            self.config().parameter_epsilon,
        );

        let q1 = cp0.lerp(cp1, u);
        let q2 = cp1.lerp(cp2, u);
        let q3 = cp2.lerp(cp3, u);
        let r1 = q1.lerp(q2, u);
        let r2 = q2.lerp(q3, u);
        let split = r1.lerp(r2, u);

        let near_vertical = self.config().near_vertical_slope;
        prev.post_tangent = tangent_from_vector(q1.t - cp0.t, q1.v - cp0.v, near_vertical);
        knot.pre_tangent = tangent_from_vector(split.t - r1.t, split.v - r1.v, near_vertical);
        knot.post_tangent = tangent_from_vector(r2.t - split.t, r2.v - split.v, near_vertical);
        next.pre_tangent = tangent_from_vector(cp3.t - q3.t, cp3.v - q3.v, near_vertical);
        knot.value = split.v;
        knot.next_interp = InterpMode::Curve;

        regression::process_segment(prev, knot, AntiRegressionMode::KeepRatio);
        regression::process_segment(knot, next, AntiRegressionMode::KeepRatio);
    }
}

/// Hull of every time at which `after` may evaluate differently from
/// `before`, or `None` if nothing changed.
fn changed_interval<V: SplineValue>(before: &Spline<V>, after: &Spline<V>) -> Option<TimeInterval> {
    let old_view = before.knot_view();
    let old: Vec<Knot<V>> = (0..old_view.len()).map(|i| old_view.get(i).knot).collect();
    let new_view = after.knot_view();
    let new: Vec<ViewKnot<V>> = (0..new_view.len()).map(|i| new_view.get(i)).collect();
    let curve_type = after.curve_type();

    let mut changed: Option<TimeInterval> = None;
    let mut add = |iv: TimeInterval| {
        changed = Some(match changed {
            Some(c) => c.union(&iv),
            None => iv,
        });
    };

    for pair in new.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let unchanged = match old.binary_search_by(|k| k.time.total_cmp(&a.knot.time)) {
            Ok(j) => {
                j + 1 < old.len()
                    && old[j + 1].time == b.knot.time
                    && segment_signature(&old[j], &old[j + 1], before.curve_type())
                        == segment_signature(&a.knot, &b.knot, curve_type)
            }
            Err(_) => false,
        };
        if !unchanged {
            let keeps_value =
                |k: &ViewKnot<V>| k.is_generated() && before.eval(k.knot.time) == after.eval(k.knot.time);
            add(TimeInterval::new(a.knot.time, b.knot.time)
                .with_closed(!keeps_value(a), !keeps_value(b)));
        }
    }

    if let (Some(old_first), Some(new_first)) = (old.first(), new.first()) {
        let edge = old_first.time.min(new_first.knot.time);
        let same = [1.0, 2.0]
            .iter()
            .all(|d| values_close(before.eval(edge - d), after.eval(edge - d)));
        if !same {
            add(TimeInterval::new(f64::NEG_INFINITY, edge).with_closed(false, true));
        }
    }
    if let (Some(old_last), Some(new_last)) = (old.last(), new.last()) {
        let edge = old_last.time.max(new_last.knot.time);
        let same = [1.0, 2.0]
            .iter()
            .all(|d| values_close(before.eval(edge + d), after.eval(edge + d)));
        if !same {
            add(TimeInterval::new(edge, f64::INFINITY).with_closed(true, false));
        }
    }

    let mut changed = changed?;
    // looping extrapolation repeats whatever changed inside the knot range
    if after.pre_extrapolation().is_looping() && new.len() > 1 {
        changed.extend_to_negative_infinity();
    }
    if after.post_extrapolation().is_looping() && new.len() > 1 {
        changed.extend_to_positive_infinity();
    }
    Some(changed)
}
