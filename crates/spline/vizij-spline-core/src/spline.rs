//! The spline store: knots ordered by time plus spline-wide configuration.
//!
//! Mutators re-derive tangents synchronously for the touched knot and its
//! immediate neighbors only. Every mutator validates its input before
//! touching state, so a rejected call leaves the spline unchanged.

use log::debug;

use crate::config::SplineConfig;
use crate::data::{CurveType, Extrapolation, InterpMode, LoopParams};
use crate::error::Result;
use crate::knot::Knot;
use crate::regression::{self, AntiRegressionMode};
use crate::tangents::resolve_tangents;
use crate::value::{SplineValue, ValueKind};

#[derive(Clone, Debug, PartialEq)]
pub struct Spline<V> {
    knots: Vec<Knot<V>>,
    curve_type: CurveType,
    loop_params: Option<LoopParams<V>>,
    pre_extrapolation: Extrapolation<V>,
    post_extrapolation: Extrapolation<V>,
    config: SplineConfig,
}

impl<V: SplineValue> Default for Spline<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: SplineValue> Spline<V> {
    /// An empty Bezier spline with held extrapolation on both sides.
    pub fn new() -> Self {
        Self::with_config(SplineConfig::default())
    }

    pub fn with_config(config: SplineConfig) -> Self {
        Self {
            knots: Vec::new(),
            curve_type: CurveType::Bezier,
            loop_params: None,
            pre_extrapolation: Extrapolation::Held,
            post_extrapolation: Extrapolation::Held,
            config,
        }
    }

    #[inline]
    pub fn value_kind(&self) -> ValueKind {
        V::KIND
    }

    #[inline]
    pub fn config(&self) -> &SplineConfig {
        &self.config
    }

    #[inline]
    pub fn curve_type(&self) -> CurveType {
        self.curve_type
    }

    /// Loop parameters as configured, whether or not they are active.
    #[inline]
    pub fn inner_loop_params(&self) -> Option<&LoopParams<V>> {
        self.loop_params.as_ref()
    }

    #[inline]
    pub fn pre_extrapolation(&self) -> Extrapolation<V> {
        self.pre_extrapolation
    }

    #[inline]
    pub fn post_extrapolation(&self) -> Extrapolation<V> {
        self.post_extrapolation
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.knots.len()
    }

    /// Authored knots in time order. Knots shadowed by an inner loop are
    /// included; use [`Spline::materialize_knots`] for the effective ones.
    #[inline]
    pub fn knots(&self) -> &[Knot<V>] {
        &self.knots
    }

    pub fn knot_times(&self) -> Vec<f64> {
        self.knots.iter().map(|k| k.time).collect()
    }

    /// Authored knot at exactly `time`.
    pub fn knot(&self, time: f64) -> Option<&Knot<V>> {
        self.find(time).ok().map(|i| &self.knots[i])
    }

    pub fn has_value_blocks(&self) -> bool {
        if self.knots.is_empty() {
            return false;
        }
        self.pre_extrapolation == Extrapolation::ValueBlock
            || self.post_extrapolation == Extrapolation::ValueBlock
            || self.knots[..self.knots.len() - 1]
                .iter()
                .any(|k| k.next_interp == InterpMode::ValueBlock)
    }

    #[inline]
    pub(crate) fn find(&self, time: f64) -> std::result::Result<usize, usize> {
        self.knots.binary_search_by(|k| k.time.total_cmp(&time))
    }

    /// Insert `knot`, replacing any knot at the same time, then resolve
    /// tangents for it and its neighbors.
    pub fn set_knot(&mut self, knot: Knot<V>) -> Result<()> {
        knot.validate()?;
        let idx = match self.find(knot.time) {
            Ok(i) => {
                self.knots[i] = knot;
                i
            }
            Err(i) => {
                self.knots.insert(i, knot);
                i
            }
        };
        debug!("set knot at time {} (index {idx})", knot.time);
        self.update_knot_tangents(idx, true);
        Ok(())
    }

    /// Remove the knot at `time`, returning it. The former neighbors are
    /// re-resolved against each other.
    pub fn remove_knot(&mut self, time: f64) -> Option<Knot<V>> {
        let idx = self.find(time).ok()?;
        let removed = self.knots.remove(idx);
        debug!("removed knot at time {time}");
        if !self.knots.is_empty() {
            let first = idx.saturating_sub(1);
            let last = idx.min(self.knots.len() - 1);
            self.update_range(first, last, true);
        }
        Some(removed)
    }

    /// Switch the cubic basis. Moving to Hermite re-normalizes every width;
    /// moving back to Bezier keeps the normalized widths.
    pub fn set_curve_type(&mut self, curve_type: CurveType) {
        if self.curve_type == curve_type {
            return;
        }
        debug!("curve type {:?} -> {:?}", self.curve_type, curve_type);
        self.curve_type = curve_type;
        if curve_type == CurveType::Hermite {
            self.update_all_tangents();
        }
    }

    /// Configure inner looping, or clear it with `None`.
    pub fn set_inner_loop_params(&mut self, params: Option<LoopParams<V>>) -> Result<()> {
        if let Some(p) = &params {
            p.validate()?;
        }
        debug!("inner loop params {params:?}");
        self.loop_params = params;
        Ok(())
    }

    pub fn set_pre_extrapolation(&mut self, extrapolation: Extrapolation<V>) {
        self.pre_extrapolation = extrapolation;
    }

    pub fn set_post_extrapolation(&mut self, extrapolation: Extrapolation<V>) {
        self.post_extrapolation = extrapolation;
    }

    /// True if any Bezier Curve segment regresses.
    pub fn has_regressive_tangents(&self) -> bool {
        self.curve_type == CurveType::Bezier
            && self
                .knots
                .windows(2)
                .any(|w| regression::is_segment_regressive(&w[0], &w[1]))
    }

    /// Apply the current anti-regression mode to every segment. Returns
    /// whether any tangent changed.
    pub fn adjust_regressive_tangents(&mut self) -> bool {
        if self.curve_type != CurveType::Bezier || self.knots.len() < 2 {
            return false;
        }
        let mode = self.authoring_mode();
        let mut changed = false;
        for i in 0..self.knots.len() - 1 {
            changed |= self.process_segment(i, mode);
        }
        changed
    }

    pub(crate) fn authoring_mode(&self) -> AntiRegressionMode {
        regression::current_mode(self.config.anti_regression)
    }

    fn process_segment(&mut self, i: usize, mode: AntiRegressionMode) -> bool {
        let (head, tail) = self.knots.split_at_mut(i + 1);
        regression::process_segment(&mut head[i], &mut tail[0], mode)
    }

    fn update_all_tangents(&mut self) -> bool {
        let mut changed = false;
        for i in 0..self.knots.len() {
            changed |= self.resolve_at(i);
        }
        changed | self.adjust_regressive_tangents()
    }

    fn resolve_at(&mut self, i: usize) -> bool {
        let prev = i.checked_sub(1).map(|p| self.knots[p]);
        let next = self.knots.get(i + 1).copied();
        resolve_tangents(
            &mut self.knots[i],
            prev.as_ref(),
            next.as_ref(),
            self.curve_type,
        )
    }

    /// Re-resolve knot `idx` and its neighbors.
    pub(crate) fn update_knot_tangents(&mut self, idx: usize, anti_regression: bool) -> bool {
        let first = idx.saturating_sub(1);
        let last = (idx + 1).min(self.knots.len() - 1);
        self.update_range(first, last, anti_regression)
    }

    fn update_range(&mut self, first: usize, last: usize, anti_regression: bool) -> bool {
        let mut changed = false;
        for i in first..=last {
            changed |= self.resolve_at(i);
        }
        if anti_regression && self.curve_type == CurveType::Bezier {
            let mode = self.authoring_mode();
            for i in first..last {
                changed |= self.process_segment(i, mode);
            }
        }
        changed
    }

    /// Raw access for edit engines that maintain ordering themselves.
    pub(crate) fn knots_mut(&mut self) -> &mut Vec<Knot<V>> {
        &mut self.knots
    }

    /// Copy into a spline of a castable value type.
    pub fn cast<T: SplineValue>(&self) -> Result<Spline<T>> {
        Ok(Spline {
            knots: self
                .knots
                .iter()
                .map(|k| k.cast())
                .collect::<Result<Vec<_>>>()?,
            curve_type: self.curve_type,
            loop_params: self.loop_params.map(|p| p.cast()).transpose()?,
            pre_extrapolation: self.pre_extrapolation.cast()?,
            post_extrapolation: self.post_extrapolation.cast()?,
            config: self.config.clone(),
        })
    }
}
