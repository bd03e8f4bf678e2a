pub mod functions;

pub use functions::{
    bezier_curve, bezier_curve_derivative, bezier_parameter, find_monotonic_zero,
    hermite_derivative, hermite_value, lerp, Cubic, Quadratic,
};
