//! Core configuration for vizij-spline-core.

use serde::{Deserialize, Serialize};

use crate::regression::AntiRegressionMode;

/// Per-spline tuning knobs. The defaults suit authoring in seconds or frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplineConfig {
    /// Anti-regression mode applied by mutators when no
    /// [`AntiRegressionSelector`](crate::regression::AntiRegressionSelector)
    /// is active on the current thread.
    pub anti_regression: AntiRegressionMode,

    /// Slope given to vertical tangents produced by Bezier breakdown.
    pub near_vertical_slope: f64,

    /// Tolerance for the Bezier parameter solve before a warning is logged.
    pub parameter_epsilon: f64,
}

impl Default for SplineConfig {
    fn default() -> Self {
        Self {
            anti_regression: AntiRegressionMode::Contain,
            near_vertical_slope: 200_000.0,
            parameter_epsilon: 1e-10,
        }
    }
}
