//! Anti-regression: keeping Bezier segments from doubling back in time.
//!
//! A Bezier segment whose tangents are too long relative to the segment
//! length makes its time curve non-monotonic, so the curve "regresses"
//! (passes over some times more than once). With normalized widths
//! `a = w0 / len` and `b = w1 / len`, a segment is regressive iff
//! `a + b > 1` and `(1 - a - b)^2 > a * b`; the boundary of that region is
//! the ellipse `a^2 + b^2 + ab - 2a - 2b + 1 = 0`.
//!
//! Mutators consult the mode selected on the current thread. Selection is
//! scoped with [`AntiRegressionSelector`] guards, which must be dropped in
//! reverse order of creation.

use std::cell::RefCell;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::data::InterpMode;
use crate::knot::Knot;
use crate::value::SplineValue;

/// Strategy used to shorten tangents of a regressive segment.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntiRegressionMode {
    /// Leave regressive segments alone.
    None,
    /// Clamp each tangent width to the segment length.
    #[default]
    Contain,
    /// Shrink both tangents by a common factor.
    KeepRatio,
    /// Keep the start tangent where possible (at most 4/3 of the segment)
    /// and shrink the end tangent.
    KeepStart,
}

const MAX_KEEP_START: f64 = 4.0 / 3.0;
const REGRESSION_EPSILON: f64 = 1e-12;

thread_local! {
    static SELECTOR_STACK: RefCell<Vec<AntiRegressionMode>> = const { RefCell::new(Vec::new()) };
}

/// RAII guard selecting the anti-regression mode for the current thread.
///
/// ```
/// use vizij_spline_core::{AntiRegressionMode, AntiRegressionSelector, current_selection};
///
/// {
///     let _raw = AntiRegressionSelector::new(AntiRegressionMode::None);
///     assert_eq!(current_selection(), Some(AntiRegressionMode::None));
/// }
/// assert_eq!(current_selection(), None);
/// ```
#[must_use = "the selection ends when the guard is dropped"]
pub struct AntiRegressionSelector {
    depth: usize,
    // guards are tied to the thread whose stack they pushed onto
    _not_send: PhantomData<*const ()>,
}

impl AntiRegressionSelector {
    pub fn new(mode: AntiRegressionMode) -> Self {
        let depth = SELECTOR_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.push(mode);
            stack.len()
        });
        Self {
            depth,
            _not_send: PhantomData,
        }
    }
}

impl Drop for AntiRegressionSelector {
    fn drop(&mut self) {
        SELECTOR_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            debug_assert_eq!(
                stack.len(),
                self.depth,
                "anti-regression selectors dropped out of order"
            );
            stack.truncate(self.depth.saturating_sub(1));
        });
    }
}

/// Mode selected by the innermost live guard on this thread, if any.
pub fn current_selection() -> Option<AntiRegressionMode> {
    SELECTOR_STACK.with(|stack| stack.borrow().last().copied())
}

/// Mode to apply: the innermost selection, else `fallback`.
pub fn current_mode(fallback: AntiRegressionMode) -> AntiRegressionMode {
    current_selection().unwrap_or(fallback)
}

/// True when normalized widths `(a, b)` describe a regressive segment.
#[inline]
pub fn is_regressive_normalized(a: f64, b: f64) -> bool {
    a + b > 1.0 && (1.0 - a - b).powi(2) - a * b > REGRESSION_EPSILON
}

/// True when the Curve segment from `start` to `end` regresses.
pub fn is_segment_regressive<V: SplineValue>(start: &Knot<V>, end: &Knot<V>) -> bool {
    if start.next_interp != InterpMode::Curve {
        return false;
    }
    let len = end.time - start.time;
    if !(len > 0.0) {
        return false;
    }
    is_regressive_normalized(
        start.post_tangent.width / len,
        end.pre_tangent.width / len,
    )
}

/// Normalized widths `(a, b)` made non-regressive under `mode`.
pub fn resolve_normalized(a: f64, b: f64, mode: AntiRegressionMode) -> (f64, f64) {
    if !is_regressive_normalized(a, b) {
        return (a, b);
    }
    match mode {
        AntiRegressionMode::None => (a, b),
        AntiRegressionMode::Contain => (a.min(1.0), b.min(1.0)),
        AntiRegressionMode::KeepRatio => {
            // largest common scale that lands on the ellipse
            let sum = a + b;
            let quad = a * a + a * b + b * b;
            let scale = (sum + (a * b).sqrt()) / quad;
            (a * scale, b * scale)
        }
        AntiRegressionMode::KeepStart => {
            let a = a.min(MAX_KEEP_START);
            // roots of b^2 + b(a - 2) + (a - 1)^2 = 0
            let disc = (a * (4.0 - 3.0 * a)).max(0.0).sqrt();
            let low = ((2.0 - a) - disc) / 2.0;
            let high = ((2.0 - a) + disc) / 2.0;
            let b = if (b - low).abs() < (b - high).abs() {
                low
            } else {
                high
            };
            (a, b)
        }
    }
}

/// Shorten the tangents facing each other across the segment from `start`
/// to `end`. Only tangent widths change; slopes are kept. Returns whether
/// anything was modified.
pub fn process_segment<V: SplineValue>(
    start: &mut Knot<V>,
    end: &mut Knot<V>,
    mode: AntiRegressionMode,
) -> bool {
    if mode == AntiRegressionMode::None || !is_segment_regressive(start, end) {
        return false;
    }
    let len = end.time - start.time;
    let (a, b) = resolve_normalized(
        start.post_tangent.width / len,
        end.pre_tangent.width / len,
        mode,
    );
    let w0 = a * len;
    let w1 = b * len;
    let changed = w0 != start.post_tangent.width || w1 != end.pre_tangent.width;
    start.post_tangent.width = w0;
    end.pre_tangent.width = w1;
    changed
}
