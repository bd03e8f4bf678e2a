//! Vizij Spline Core (engine-agnostic)
//!
//! An editable, evaluable spline of time-stamped knots. A [`Spline`] stores
//! authored knots plus spline-wide settings (curve type, inner loop,
//! extrapolation) and answers value and derivative queries at any time.
//!
//! - Mutators keep tangents resolved ([`TangentAlgorithm::AutoEase`]) and
//!   segments non-regressive under the thread's [`AntiRegressionMode`].
//! - Inner loops repeat a prototype interval; extrapolating loops repeat the
//!   whole knot range beyond its ends.
//! - [`Spline::breakdown`] inserts a knot without changing the curve's shape
//!   and reports the interval it may have touched.
//! - [`baking`] samples a spline on a fixed frame grid.

pub mod baking;
pub mod breakdown;
pub mod config;
pub mod data;
pub mod description;
pub mod error;
pub mod eval;
pub mod interp;
pub mod interval;
pub mod knot;
pub mod loops;
pub mod regression;
pub mod spline;
pub mod tangents;
pub mod value;

// Re-exports for consumers
pub use baking::{bake, bake_derivatives, BakedSpline, BakingConfig, MAX_BAKED_FRAMES};
pub use config::SplineConfig;
pub use data::{CurveType, Extrapolation, InterpMode, LoopParams, TangentAlgorithm};
pub use description::SplineDescription;
pub use error::{Result, SplineError};
pub use interval::TimeInterval;
pub use knot::{Knot, Tangent};
pub use regression::{current_mode, current_selection, AntiRegressionMode, AntiRegressionSelector};
pub use spline::Spline;
pub use tangents::auto_ease_slope;
pub use value::{cast_value, SplineValue, ValueKind, Vec2, Vec3, Vec4};
