//! Baking API: sample a spline at a fixed frame rate over a time window.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::spline::Spline;
use crate::value::SplineValue;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakingConfig {
    /// Target frame rate (Hz) for baked samples.
    pub frame_rate: f64,
    /// First sample time.
    pub start_time: f64,
    /// Last sample time; if None, uses the time of the last effective knot.
    pub end_time: Option<f64>,
}

impl Default for BakingConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            start_time: 0.0,
            end_time: None,
        }
    }
}

/// Samples at `start_time + i / frame_rate`. `None` where the spline has no
/// value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "V: SplineValue"))]
pub struct BakedSpline<V> {
    pub frame_rate: f64,
    pub start_time: f64,
    pub end_time: f64,
    pub values: Vec<Option<V>>,
}

impl<V: SplineValue> BakedSpline<V> {
    /// Export as `serde_json::Value` (stable schema for tooling).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Time of sample `frame`.
    pub fn time_of(&self, frame: usize) -> f64 {
        self.start_time + frame as f64 / self.frame_rate
    }
}

/// Upper bound on samples in one bake; longer windows are cut short.
pub const MAX_BAKED_FRAMES: usize = 1_000_000;

struct Window {
    frame_rate: f64,
    start: f64,
    end: f64,
    frames: usize,
}

fn window<V: SplineValue>(spline: &Spline<V>, cfg: &BakingConfig) -> Window {
    let frame_rate = if cfg.frame_rate.is_finite() && cfg.frame_rate > 0.0 {
        cfg.frame_rate
    } else {
        60.0
    };
    let start = if cfg.start_time.is_finite() {
        cfg.start_time
    } else {
        0.0
    };
    let end = cfg
        .end_time
        .filter(|t| t.is_finite())
        .or_else(|| spline.post_extrap_time())
        .unwrap_or(start)
        .max(start);
    // inclusive of end
    let span_frames = ((end - start) * frame_rate).ceil();
    let (frames, end) = if span_frames < (MAX_BAKED_FRAMES - 1) as f64 {
        (span_frames as usize + 1, end)
    } else {
        let capped = start + (MAX_BAKED_FRAMES - 1) as f64 / frame_rate;
        warn!(
            "bake window [{start}, {end}] exceeds {MAX_BAKED_FRAMES} frames, ending at {capped}"
        );
        (MAX_BAKED_FRAMES, capped.min(end))
    };
    Window {
        frame_rate,
        start,
        end,
        frames,
    }
}

fn bake_with<V: SplineValue>(
    spline: &Spline<V>,
    cfg: &BakingConfig,
    sample: impl Fn(&Spline<V>, f64) -> Option<V>,
) -> BakedSpline<V> {
    let w = window(spline, cfg);
    let values = (0..w.frames)
        .map(|f| {
            let t = (w.start + f as f64 / w.frame_rate).min(w.end);
            sample(spline, t)
        })
        .collect();
    BakedSpline {
        frame_rate: w.frame_rate,
        start_time: w.start,
        end_time: w.end,
        values,
    }
}

/// Bake values using the provided config.
pub fn bake<V: SplineValue>(spline: &Spline<V>, cfg: &BakingConfig) -> BakedSpline<V> {
    bake_with(spline, cfg, |s, t| s.eval(t))
}

/// Bake first derivatives on the same frame grid as [`bake`].
pub fn bake_derivatives<V: SplineValue>(
    spline: &Spline<V>,
    cfg: &BakingConfig,
) -> BakedSpline<V> {
    bake_with(spline, cfg, |s, t| s.eval_derivative(t))
}

/// Export baked values and derivatives together.
pub fn export_baked_with_derivatives_json<V: SplineValue>(
    values: &BakedSpline<V>,
    derivatives: &BakedSpline<V>,
) -> serde_json::Value {
    serde_json::json!({
        "values": values,
        "derivatives": derivatives,
    })
}
