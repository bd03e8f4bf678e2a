//! Evaluation.
//!
//! Order of resolution for a query at time `t`:
//! 1. extrapolating loops fold `t` into the effective knot range,
//! 2. the effective knot sequence (inner loops already expanded) is searched,
//! 3. the query is answered at a knot, by extrapolation, or by interpolating
//!    the bracketing segment.

use crate::data::{CurveType, Extrapolation, InterpMode};
use crate::interp::functions::{
    bezier_curve, bezier_curve_derivative, bezier_parameter, hermite_derivative, hermite_value,
    Cubic,
};
use crate::knot::Knot;
use crate::loops::KnotView;
use crate::regression::{self, AntiRegressionMode};
use crate::spline::Spline;
use crate::value::SplineValue;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum EvalAspect {
    Value,
    /// Value as if every segment were held.
    HeldValue,
    Derivative,
}

/// Side of the query time. `Post` is also used for plain "at time" queries.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum EvalLocation {
    Pre,
    Post,
}

impl EvalLocation {
    fn flipped(self) -> Self {
        match self {
            EvalLocation::Pre => EvalLocation::Post,
            EvalLocation::Post => EvalLocation::Pre,
        }
    }
}

/// Query state after loop folding.
struct Folded<V> {
    time: f64,
    location: EvalLocation,
    value_offset: V,
    negate: bool,
}

/// Slope of the straight segment from `start` to `end`.
#[inline]
fn segment_slope<V: SplineValue>(start: &Knot<V>, end: &Knot<V>) -> V {
    (end.pre_value() - start.value).scale(1.0 / (end.time - start.time))
}

fn eval_bezier<V: SplineValue>(
    start_in: &Knot<V>,
    end_in: &Knot<V>,
    time: f64,
    aspect: EvalAspect,
    eps: f64,
) -> V {
    // evaluation always de-regresses with the keep-ratio strategy
    let mut start = *start_in;
    let mut end = *end_in;
    regression::process_segment(&mut start, &mut end, AntiRegressionMode::KeepRatio);

    let times = [
        start.time,
        start.time + start.post_tangent.width,
        end.time - end.pre_tangent.width,
        end.time,
    ];
    let u = bezier_parameter(times, time, eps);
    let p0 = start.value;
    let p1 = start.value + start.post_height();
    let p2 = end.pre_value() + end.pre_height();
    let p3 = end.pre_value();

    match aspect {
        EvalAspect::Derivative => {
            let dt = Cubic::from_points(times[0], times[1], times[2], times[3])
                .derivative()
                .eval(u);
            bezier_curve_derivative(p0, p1, p2, p3, u).scale(1.0 / dt)
        }
        _ => bezier_curve(p0, p1, p2, p3, u),
    }
}

fn eval_hermite<V: SplineValue>(
    start: &Knot<V>,
    end: &Knot<V>,
    time: f64,
    aspect: EvalAspect,
) -> V {
    let args = (
        start.time,
        start.value,
        start.post_tangent.slope,
        end.time,
        end.pre_value(),
        end.pre_tangent.slope,
    );
    match aspect {
        EvalAspect::Derivative => {
            hermite_derivative(args.0, args.1, args.2, args.3, args.4, args.5, time)
        }
        _ => hermite_value(args.0, args.1, args.2, args.3, args.4, args.5, time),
    }
}

impl<V: SplineValue> Spline<V> {
    /// Value at `time`; at a dual-valued knot this is the right-side value.
    /// `None` where the spline has no value (value blocks, or no knots).
    pub fn eval(&self, time: f64) -> Option<V> {
        self.eval_impl(time, EvalAspect::Value, EvalLocation::Post)
    }

    /// Value approached from the left.
    pub fn eval_pre_value(&self, time: f64) -> Option<V> {
        self.eval_impl(time, EvalAspect::Value, EvalLocation::Pre)
    }

    /// First derivative with respect to time.
    pub fn eval_derivative(&self, time: f64) -> Option<V> {
        self.eval_impl(time, EvalAspect::Derivative, EvalLocation::Post)
    }

    pub fn eval_pre_derivative(&self, time: f64) -> Option<V> {
        self.eval_impl(time, EvalAspect::Derivative, EvalLocation::Pre)
    }

    /// Value as if every segment were held.
    pub fn eval_held(&self, time: f64) -> Option<V> {
        self.eval_impl(time, EvalAspect::HeldValue, EvalLocation::Post)
    }

    pub(crate) fn eval_impl(
        &self,
        time: f64,
        aspect: EvalAspect,
        location: EvalLocation,
    ) -> Option<V> {
        if self.is_empty() {
            return None;
        }
        let view = self.knot_view();
        let mut folded = Folded {
            time,
            location,
            value_offset: V::zero(),
            negate: false,
        };
        self.fold_extrapolating_loops(&view, &mut folded, aspect);

        let result = self.eval_main(&view, folded.time, aspect, folded.location)?;
        let result = result + folded.value_offset;
        Some(if folded.negate { -result } else { result })
    }

    fn fold_extrapolating_loops(
        &self,
        view: &KnotView<'_, V>,
        folded: &mut Folded<V>,
        aspect: EvalAspect,
    ) {
        let len = view.len();
        let pre = self.pre_extrapolation();
        let post = self.post_extrapolation();
        if len < 2 || !(pre.is_looping() || post.is_looping()) {
            return;
        }
        let first = view.get(0).knot;
        let last = view.get(len - 1).knot;
        let t = folded.time;
        let at_pre = folded.location == EvalLocation::Pre;
        let in_range = if at_pre {
            t > first.time && t <= last.time
        } else {
            t >= first.time && t < last.time
        };
        if in_range {
            return;
        }

        let in_pre_region = if at_pre {
            t <= first.time
        } else {
            t < first.time
        };
        let (mode, offset) = if in_pre_region {
            (pre, first.time - t)
        } else {
            (post, t - last.time)
        };
        if !mode.is_looping() {
            return;
        }

        let span = last.time - first.time;
        let iterations = offset / span;
        let whole = iterations.trunc();
        let on_boundary = whole == iterations;
        // landing exactly on a boundary from the side that stays in range
        let short = on_boundary && (in_pre_region != at_pre);
        let hops = (if short { whole } else { whole + 1.0 }) as i64;
        let hop = if in_pre_region { hops } else { -hops };

        folded.time += hop as f64 * span;
        match mode {
            Extrapolation::LoopRepeat => {
                if aspect != EvalAspect::Derivative {
                    let rise = last.value - first.pre_value();
                    folded.value_offset = folded.value_offset - rise.scale(hop as f64);
                }
            }
            Extrapolation::LoopOscillate => {
                if hop % 2 != 0 {
                    folded.time = first.time + (span - (folded.time - first.time));
                    folded.location = folded.location.flipped();
                    if aspect == EvalAspect::Derivative {
                        folded.negate = !folded.negate;
                    }
                }
            }
            _ => {}
        }
    }

    fn eval_main(
        &self,
        view: &KnotView<'_, V>,
        time: f64,
        aspect: EvalAspect,
        location: EvalLocation,
    ) -> Option<V> {
        let len = view.len();
        let lb = view.lower_bound(time);
        let at_knot = lb < len && view.time(lb) == time;

        if at_knot {
            return self.eval_at_knot(view, lb, aspect, location);
        }
        if lb == 0 {
            return self.extrapolate(view, time, aspect, true);
        }
        if lb == len {
            return self.extrapolate(view, time, aspect, false);
        }
        let start = view.get(lb - 1).knot;
        let end = view.get(lb).knot;
        self.interpolate(&start, &end, time, aspect)
    }

    fn eval_at_knot(
        &self,
        view: &KnotView<'_, V>,
        index: usize,
        aspect: EvalAspect,
        location: EvalLocation,
    ) -> Option<V> {
        let len = view.len();
        let knot = view.get(index).knot;
        let derivative = aspect == EvalAspect::Derivative;

        match location {
            EvalLocation::Pre if index == 0 => {
                if self.pre_extrapolation() == Extrapolation::ValueBlock {
                    return None;
                }
                if derivative {
                    self.extrapolation_slope(view, true)
                } else {
                    Some(knot.pre_value())
                }
            }
            EvalLocation::Pre => {
                let prev = view.get(index - 1).knot;
                match prev.next_interp {
                    InterpMode::ValueBlock => None,
                    InterpMode::Held if derivative => Some(V::zero()),
                    InterpMode::Held => Some(prev.value),
                    _ if aspect == EvalAspect::HeldValue => Some(prev.value),
                    _ if !derivative => Some(knot.pre_value()),
                    InterpMode::Linear => Some(segment_slope(&prev, &knot)),
                    InterpMode::Curve => Some(knot.pre_tangent.slope),
                }
            }
            EvalLocation::Post if index == len - 1 => {
                if self.post_extrapolation() == Extrapolation::ValueBlock {
                    return None;
                }
                if derivative {
                    self.extrapolation_slope(view, false)
                } else {
                    Some(knot.value)
                }
            }
            EvalLocation::Post => match knot.next_interp {
                InterpMode::ValueBlock => None,
                _ if !derivative => Some(knot.value),
                InterpMode::Held => Some(V::zero()),
                InterpMode::Linear => Some(segment_slope(&knot, &view.get(index + 1).knot)),
                InterpMode::Curve => Some(knot.post_tangent.slope),
            },
        }
    }

    /// Slope continued past the first (`pre`) or last knot. `None` for
    /// value-blocked extrapolation.
    pub(crate) fn extrapolation_slope(&self, view: &KnotView<'_, V>, pre: bool) -> Option<V> {
        let extrap = if pre {
            self.pre_extrapolation()
        } else {
            self.post_extrapolation()
        };
        match extrap {
            Extrapolation::ValueBlock => return None,
            Extrapolation::Sloped { slope } => return Some(slope),
            Extrapolation::Linear => {}
            _ => return Some(V::zero()),
        }
        let len = view.len();
        if len < 2 {
            return Some(V::zero());
        }
        let (end, adjacent) = if pre {
            (view.get(0).knot, view.get(1).knot)
        } else {
            (view.get(len - 1).knot, view.get(len - 2).knot)
        };
        if end.is_dual_valued() {
            return Some(V::zero());
        }
        let segment = if pre { &end } else { &adjacent };
        Some(match segment.next_interp {
            InterpMode::Held | InterpMode::ValueBlock => V::zero(),
            InterpMode::Linear if pre => segment_slope(&end, &adjacent),
            InterpMode::Linear => segment_slope(&adjacent, &end),
            // continue the inward-facing tangent
            InterpMode::Curve if pre => end.post_tangent.slope,
            InterpMode::Curve => end.pre_tangent.slope,
        })
    }

    fn extrapolate(
        &self,
        view: &KnotView<'_, V>,
        time: f64,
        aspect: EvalAspect,
        pre: bool,
    ) -> Option<V> {
        let extrap = if pre {
            self.pre_extrapolation()
        } else {
            self.post_extrapolation()
        };
        if extrap == Extrapolation::ValueBlock {
            return None;
        }
        let end = if pre {
            view.get(0).knot
        } else {
            view.get(view.len() - 1).knot
        };
        if aspect == EvalAspect::HeldValue {
            return Some(if pre { end.pre_value() } else { end.value });
        }
        let slope = self.extrapolation_slope(view, pre)?;
        Some(match aspect {
            EvalAspect::Derivative => slope,
            _ if pre => end.pre_value() - slope.scale(end.time - time),
            _ => end.value + slope.scale(time - end.time),
        })
    }

    /// Value or derivative inside the segment from `start` to `end`.
    pub(crate) fn interpolate(
        &self,
        start: &Knot<V>,
        end: &Knot<V>,
        time: f64,
        aspect: EvalAspect,
    ) -> Option<V> {
        match start.next_interp {
            InterpMode::ValueBlock => None,
            _ if aspect == EvalAspect::HeldValue => Some(start.value),
            InterpMode::Held => Some(match aspect {
                EvalAspect::Derivative => V::zero(),
                _ => start.value,
            }),
            InterpMode::Linear => {
                let slope = segment_slope(start, end);
                Some(match aspect {
                    EvalAspect::Derivative => slope,
                    _ => start.value + slope.scale(time - start.time),
                })
            }
            InterpMode::Curve => Some(match self.curve_type() {
                CurveType::Bezier => {
                    eval_bezier(start, end, time, aspect, self.config().parameter_epsilon)
                }
                CurveType::Hermite => eval_hermite(start, end, time, aspect),
            }),
        }
    }

    /// Sample values at evenly spaced times over `[start, end]`.
    pub fn sample(&self, start: f64, end: f64, count: usize) -> Vec<(f64, Option<V>)> {
        if count == 0 {
            return Vec::new();
        }
        if count == 1 || end <= start {
            return vec![(start, self.eval(start))];
        }
        let step = (end - start) / (count - 1) as f64;
        (0..count)
            .map(|i| {
                let t = if i == count - 1 {
                    end
                } else {
                    start + step * i as f64
                };
                (t, self.eval(t))
            })
            .collect()
    }
}
