//! Inner-loop expansion.
//!
//! An active inner loop replaces everything inside the looped interval with
//! copies of the prototype knots. The result is the *effective* knot
//! sequence:
//!
//! ```text
//! authored before looped | pre reps | prototype | post reps | closing echo | authored after looped
//! ```
//!
//! [`KnotView`] exposes that sequence by index without allocating. Each
//! repetition is the prototype shifted by a whole number of periods in time
//! and the same number of `value_offset`s in value. Authored knots inside the
//! looped interval but outside the prototype are shadowed.

use crate::data::{LoopParams, TangentAlgorithm};
use crate::interval::TimeInterval;
use crate::knot::Knot;
use crate::spline::Spline;
use crate::value::SplineValue;

/// A knot of the effective sequence.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct ViewKnot<V> {
    pub knot: Knot<V>,
    /// Index into the authored knots, or `None` for an echo.
    pub source: Option<usize>,
}

impl<V> ViewKnot<V> {
    #[inline]
    pub fn is_generated(&self) -> bool {
        self.source.is_none()
    }
}

#[derive(Copy, Clone, Debug)]
struct LoopLayout<V> {
    params: LoopParams<V>,
    looped: TimeInterval,
    /// Authored knots before the looped interval.
    pre_count: usize,
    /// Authored index of the knot at `proto_start`.
    proto_first: usize,
    proto_len: usize,
    /// Authored index of the first knot after the looped interval.
    post_first: usize,
    reps: usize,
}

impl<V: SplineValue> LoopLayout<V> {
    fn new(knots: &[Knot<V>], params: &LoopParams<V>) -> Option<Self> {
        if !params.has_repeats() || params.validate().is_err() {
            return None;
        }
        let proto_first = knots
            .binary_search_by(|k| k.time.total_cmp(&params.proto_start))
            .ok()?;
        let proto_len = knots[proto_first..].partition_point(|k| k.time < params.proto_end);
        let looped = params.looped_interval();
        let pre_count = knots.partition_point(|k| k.time < looped.min);
        let post_first = knots.partition_point(|k| k.time <= looped.max);
        // counts are validated non-negative
        let reps = params.num_pre_loops as usize + params.num_post_loops as usize + 1;
        Some(Self {
            params: *params,
            looped,
            pre_count,
            proto_first,
            proto_len,
            post_first,
            reps,
        })
    }

    #[inline]
    fn looped_len(&self) -> usize {
        self.reps * self.proto_len + 1
    }

    fn echo(&self, knots: &[Knot<V>], proto_index: usize, iteration: i64) -> ViewKnot<V> {
        let source = knots[self.proto_first + proto_index];
        let mut knot = source.shifted(0.0, self.params.value_offset.scale(iteration as f64));
        knot.time = self.params.shift_time(source.time, iteration);
        ViewKnot {
            knot,
            source: (iteration == 0).then_some(self.proto_first + proto_index),
        }
    }
}

/// Index-addressable view of the effective knot sequence.
#[derive(Clone, Debug)]
pub(crate) struct KnotView<'a, V> {
    knots: &'a [Knot<V>],
    layout: Option<LoopLayout<V>>,
}

impl<'a, V: SplineValue> KnotView<'a, V> {
    pub fn new(knots: &'a [Knot<V>], params: Option<&LoopParams<V>>) -> Self {
        let layout = params.and_then(|p| LoopLayout::new(knots, p));
        Self { knots, layout }
    }

    #[inline]
    pub fn has_inner_loops(&self) -> bool {
        self.layout.is_some()
    }

    pub fn len(&self) -> usize {
        match &self.layout {
            None => self.knots.len(),
            Some(l) => l.pre_count + l.looped_len() + (self.knots.len() - l.post_first),
        }
    }

    pub fn get(&self, index: usize) -> ViewKnot<V> {
        let Some(l) = &self.layout else {
            return ViewKnot {
                knot: self.knots[index],
                source: Some(index),
            };
        };
        if index < l.pre_count {
            return ViewKnot {
                knot: self.knots[index],
                source: Some(index),
            };
        }
        let j = index - l.pre_count;
        if j < l.looped_len() {
            let pre = i64::from(l.params.num_pre_loops);
            if j == l.reps * l.proto_len {
                return l.echo(self.knots, 0, i64::from(l.params.num_post_loops) + 1);
            }
            let iteration = (j / l.proto_len) as i64 - pre;
            return l.echo(self.knots, j % l.proto_len, iteration);
        }
        let authored = l.post_first + (j - l.looped_len());
        ViewKnot {
            knot: self.knots[authored],
            source: Some(authored),
        }
    }

    #[inline]
    pub fn time(&self, index: usize) -> f64 {
        self.get(index).knot.time
    }

    /// Index of the first effective knot at or after `time`.
    pub fn lower_bound(&self, time: f64) -> usize {
        let Some(l) = &self.layout else {
            return self.knots.partition_point(|k| k.time < time);
        };
        if time <= l.looped.min {
            return self.knots[..l.pre_count].partition_point(|k| k.time < time);
        }
        if time > l.looped.max {
            return l.pre_count
                + l.looped_len()
                + self.knots[l.post_first..].partition_point(|k| k.time < time);
        }

        let period = l.params.period();
        let rep = (((time - l.looped.min) / period).floor().max(0.0) as usize).min(l.reps);
        let mut index = if rep == l.reps {
            l.pre_count + l.reps * l.proto_len
        } else {
            let iteration = rep as i64 - i64::from(l.params.num_pre_loops);
            let proto = &self.knots[l.proto_first..l.proto_first + l.proto_len];
            let q = proto.partition_point(|k| l.params.shift_time(k.time, iteration) < time);
            l.pre_count + rep * l.proto_len + q
        };

        // the period arithmetic can land one knot off near repetition seams
        let end = self.len();
        while index > 0 && self.time(index - 1) >= time {
            index -= 1;
        }
        while index < end && self.time(index) < time {
            index += 1;
        }
        index
    }
}

impl<V: SplineValue> Spline<V> {
    pub(crate) fn knot_view(&self) -> KnotView<'_, V> {
        KnotView::new(self.knots(), self.inner_loop_params())
    }

    /// True when the inner loop actually repeats: loop parameters with
    /// non-zero counts and a knot exactly at the prototype start.
    pub fn has_inner_loops(&self) -> bool {
        self.knot_view().has_inner_loops()
    }

    /// True when either extrapolation loops and there are knots to loop.
    pub fn has_extrapolating_loops(&self) -> bool {
        self.len() > 1
            && (self.pre_extrapolation().is_looping() || self.post_extrapolation().is_looping())
    }

    pub fn has_loops(&self) -> bool {
        self.has_inner_loops() || self.has_extrapolating_loops()
    }

    /// Prototype interval of the configured loop parameters.
    pub fn prototype_interval(&self) -> Option<TimeInterval> {
        self.inner_loop_params().map(|p| p.prototype_interval())
    }

    /// Interval covered by the prototype and its repetitions.
    pub fn looped_interval(&self) -> Option<TimeInterval> {
        self.inner_loop_params()
            .filter(|p| p.has_repeats())
            .map(|p| p.looped_interval())
    }

    /// Time of the first effective knot, echoes included.
    pub fn pre_extrap_time(&self) -> Option<f64> {
        let view = self.knot_view();
        (view.len() > 0).then(|| view.time(0))
    }

    /// Time of the last effective knot, echoes included.
    pub fn post_extrap_time(&self) -> Option<f64> {
        let view = self.knot_view();
        let len = view.len();
        (len > 0).then(|| view.time(len - 1))
    }

    /// Concrete knots of the effective sequence whose times lie in
    /// `interval`: authored knots, prototype knots, and their echoes.
    ///
    /// Tangents are returned as resolved, with the algorithm reset to
    /// `None`, so the list can be loaded into a loop-free spline that
    /// evaluates identically over the interval.
    pub fn materialize_knots(&self, interval: &TimeInterval) -> Vec<Knot<V>> {
        let view = self.knot_view();
        let len = view.len();
        let mut out = Vec::new();
        let mut index = if interval.min.is_finite() {
            view.lower_bound(interval.min)
        } else {
            0
        };
        while index < len {
            let mut knot = view.get(index).knot;
            if !interval.contains(knot.time) {
                if knot.time > interval.max {
                    break;
                }
                index += 1;
                continue;
            }
            knot.pre_tangent.algorithm = TangentAlgorithm::None;
            knot.post_tangent.algorithm = TangentAlgorithm::None;
            out.push(knot);
            index += 1;
        }
        out
    }

    /// Like [`Spline::materialize_knots`], plus the nearest effective knot
    /// on each side of `interval`, so a consumer drawing the interval sees the
    /// segments entering and leaving it.
    pub fn materialize_knots_bracketed(&self, interval: &TimeInterval) -> Vec<Knot<V>> {
        let view = self.knot_view();
        let len = view.len();
        let before_interval = |t: f64| !interval.contains(t) && t < interval.max;
        let mut first = 0;
        while first < len && before_interval(view.time(first)) {
            first += 1;
        }
        let mut last = first;
        while last < len && interval.contains(view.time(last)) {
            last += 1;
        }
        let from = first.saturating_sub(1);
        let to = (last + 1).min(len);
        (from..to)
            .map(|i| {
                let mut knot = view.get(i).knot;
                knot.pre_tangent.algorithm = TangentAlgorithm::None;
                knot.post_tangent.algorithm = TangentAlgorithm::None;
                knot
            })
            .collect()
    }
}
