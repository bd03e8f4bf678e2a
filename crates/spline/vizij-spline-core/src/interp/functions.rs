//! Cubic segment math shared by the evaluator and the breakdown engine.
//!
//! Bezier segments are a pair of parametric cubics: time `x(u)` and value
//! `y(u)` for `u` in `[0, 1]`. Evaluating at a time means solving `x(u) = t`
//! for `u`, which is well defined once the segment is non-regressive (`x` is
//! monotonic on `[0, 1]`).

use std::f64::consts::PI;

use log::warn;

use crate::value::SplineValue;

/// Power-form quadratic `a*u^2 + b*u + c`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Quadratic {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Quadratic {
    #[inline]
    pub fn eval(&self, u: f64) -> f64 {
        u * (u * self.a + self.b) + self.c
    }
}

/// Power-form cubic `a*u^3 + b*u^2 + c*u + d`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Cubic {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Cubic {
    /// Coefficients from Bezier control points: start, start handle, end
    /// handle, end.
    pub fn from_points(p0: f64, p1: f64, p2: f64, p3: f64) -> Self {
        Self {
            a: -p0 + 3.0 * p1 - 3.0 * p2 + p3,
            b: 3.0 * p0 - 6.0 * p1 + 3.0 * p2,
            c: -3.0 * p0 + 3.0 * p1,
            d: p0,
        }
    }

    #[inline]
    pub fn eval(&self, u: f64) -> f64 {
        u * (u * (u * self.a + self.b) + self.c) + self.d
    }

    #[inline]
    pub fn derivative(&self) -> Quadratic {
        Quadratic {
            a: 3.0 * self.a,
            b: 2.0 * self.b,
            c: self.c,
        }
    }
}

#[inline]
fn is_close(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

/// Pick the root nearest the middle of `[0, 1]`.
fn filter_zeros(zeros: &[f64], eps: f64) -> f64 {
    let mut result = zeros[0];
    let mut min_error = (result - 0.5).abs();
    for &z in &zeros[1..] {
        let error = (z - 0.5).abs();
        if error < min_error {
            if min_error < 0.5 {
                warn!("possibly regressive spline segment, zeros at {zeros:?}");
            }
            result = z;
            min_error = error;
        }
    }
    if min_error > 0.5 + eps {
        warn!("no zero found in [0..1], zeros at {zeros:?}, using {result}");
    }
    result
}

fn monotonic_zero_quadratic(q: &Quadratic, eps: f64) -> f64 {
    let discrim = (q.b * q.b - 4.0 * q.a * q.c).sqrt();
    let root0 = (-q.b - discrim) / (2.0 * q.a);
    let root1 = (-q.b + discrim) / (2.0 * q.a);
    filter_zeros(&[root0, root1], eps)
}

/// Cardano's method for `u^3 + b*u^2 + c*u + d = 0`.
fn monotonic_zero_normalized(b: f64, c: f64, d: f64, eps: f64) -> f64 {
    let p = (3.0 * c - b * b) / 3.0;
    let p3 = p / 3.0;
    let p33 = p3 * p3 * p3;
    let q = (2.0 * b * b * b - 9.0 * b * c + 27.0 * d) / 27.0;
    let q2 = q / 2.0;
    let discrim = q2 * q2 + p33;
    let b3 = b / 3.0;

    if discrim < 0.0 {
        // three real roots
        let r = (-p33).sqrt();
        let t = -q / (2.0 * r);
        let phi = t.clamp(-1.0, 1.0).acos();
        let t1 = 2.0 * r.cbrt();
        let root1 = t1 * (phi / 3.0).cos() - b3;
        let root2 = t1 * ((phi + 2.0 * PI) / 3.0).cos() - b3;
        let root3 = t1 * ((phi + 4.0 * PI) / 3.0).cos() - b3;
        filter_zeros(&[root1, root2, root3], eps)
    } else if discrim == 0.0 {
        let u1 = -q2.cbrt();
        filter_zeros(&[2.0 * u1 - b3, -u1 - b3], eps)
    } else {
        let sd = discrim.sqrt();
        let u1 = (sd - q2).cbrt();
        let v1 = (sd + q2).cbrt();
        u1 - v1 - b3
    }
}

/// Find the `u` in `[0, 1]` where a cubic that is monotonically increasing on
/// that range crosses zero.
pub fn find_monotonic_zero(cubic: &Cubic, eps: f64) -> f64 {
    const COEFF_EPSILON: f64 = 1e-10;

    let a_zero = is_close(cubic.a, 0.0, COEFF_EPSILON);
    let b_zero = is_close(cubic.b, 0.0, COEFF_EPSILON);
    let c_zero = is_close(cubic.c, 0.0, COEFF_EPSILON);

    if a_zero && b_zero && c_zero {
        warn!("constant time cubic, no parameter to solve for");
        return 0.0;
    }
    if a_zero && b_zero {
        return -cubic.d / cubic.c;
    }
    if a_zero {
        return monotonic_zero_quadratic(
            &Quadratic {
                a: cubic.b,
                b: cubic.c,
                c: cubic.d,
            },
            eps,
        );
    }
    monotonic_zero_normalized(
        cubic.b / cubic.a,
        cubic.c / cubic.a,
        cubic.d / cubic.a,
        eps,
    )
}

/// Parameter at which a Bezier time curve reaches `time`, clamped to `[0, 1]`.
pub fn bezier_parameter(times: [f64; 4], time: f64, eps: f64) -> f64 {
    let cubic = Cubic::from_points(
        times[0] - time,
        times[1] - time,
        times[2] - time,
        times[3] - time,
    );
    let u = find_monotonic_zero(&cubic, eps);
    if u < 0.0 {
        if u < -eps {
            warn!("bezier parameter below range, u={u}");
        }
        0.0
    } else if u > 1.0 {
        if u > 1.0 + eps {
            warn!("bezier parameter above range, u={u}");
        }
        1.0
    } else {
        u
    }
}

/// Point on a cubic Bezier at parameter `u`.
///
/// B(u) = (1 - u)^3 P0 + 3 (1 - u)^2 u P1 + 3 (1 - u) u^2 P2 + u^3 P3
pub fn bezier_curve<V: SplineValue>(p0: V, p1: V, p2: V, p3: V, u: f64) -> V {
    let one_minus_u = 1.0 - u;
    p0.scale(one_minus_u.powi(3))
        + p1.scale(3.0 * one_minus_u.powi(2) * u)
        + p2.scale(3.0 * one_minus_u * u.powi(2))
        + p3.scale(u.powi(3))
}

/// Derivative of [`bezier_curve`] with respect to `u`.
pub fn bezier_curve_derivative<V: SplineValue>(p0: V, p1: V, p2: V, p3: V, u: f64) -> V {
    let one_minus_u = 1.0 - u;
    (p1 - p0).scale(3.0 * one_minus_u.powi(2))
        + (p2 - p1).scale(6.0 * one_minus_u * u)
        + (p3 - p2).scale(3.0 * u.powi(2))
}

//------------------------------------------------------------------------------
// Hermite basis functions and their derivatives
fn hermite_basis_h00(u: f64) -> f64 {
    2.0 * u.powi(3) - 3.0 * u.powi(2) + 1.0
}
fn hermite_basis_h10(u: f64) -> f64 {
    u.powi(3) - 2.0 * u.powi(2) + u
}
fn hermite_basis_h01(u: f64) -> f64 {
    -2.0 * u.powi(3) + 3.0 * u.powi(2)
}
fn hermite_basis_h11(u: f64) -> f64 {
    u.powi(3) - u.powi(2)
}
fn hermite_basis_d00(u: f64) -> f64 {
    6.0 * u.powi(2) - 6.0 * u
}
fn hermite_basis_d10(u: f64) -> f64 {
    3.0 * u.powi(2) - 4.0 * u + 1.0
}
fn hermite_basis_d01(u: f64) -> f64 {
    -6.0 * u.powi(2) + 6.0 * u
}
fn hermite_basis_d11(u: f64) -> f64 {
    3.0 * u.powi(2) - 2.0 * u
}

/// Hermite segment from `(t0, v0)` with slope `m0` to `(t1, v1)` with slope
/// `m1`, evaluated at `time`. Slopes are per unit time.
pub fn hermite_value<V: SplineValue>(t0: f64, v0: V, m0: V, t1: f64, v1: V, m1: V, time: f64) -> V {
    let dt = t1 - t0;
    let u = (time - t0) / dt;
    v0.scale(hermite_basis_h00(u))
        + m0.scale(dt * hermite_basis_h10(u))
        + v1.scale(hermite_basis_h01(u))
        + m1.scale(dt * hermite_basis_h11(u))
}

/// Time derivative of [`hermite_value`].
pub fn hermite_derivative<V: SplineValue>(
    t0: f64,
    v0: V,
    m0: V,
    t1: f64,
    v1: V,
    m1: V,
    time: f64,
) -> V {
    let dt = t1 - t0;
    let u = (time - t0) / dt;
    (v0.scale(hermite_basis_d00(u))
        + m0.scale(dt * hermite_basis_d10(u))
        + v1.scale(hermite_basis_d01(u))
        + m1.scale(dt * hermite_basis_d11(u)))
    .scale(1.0 / dt)
}

/// Linear interpolation.
#[inline]
pub fn lerp<V: SplineValue>(a: V, b: V, u: f64) -> V {
    a + (b - a).scale(u)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn linear_time_curve_inverts_exactly() {
        // handles at thirds make x(u) linear
        let u = bezier_parameter([0.0, 1.0, 2.0, 3.0], 1.5, 1e-10);
        approx(u, 0.5, 1e-12);
    }

    #[test]
    fn cubic_time_curve_round_trips() {
        let times = [0.0, 0.2, 2.9, 3.0];
        let cubic = Cubic::from_points(times[0], times[1], times[2], times[3]);
        for i in 0..=10 {
            let u = i as f64 / 10.0;
            let t = cubic.eval(u);
            approx(bezier_parameter(times, t, 1e-10), u, 1e-8);
        }
    }

    #[test]
    fn quadratic_fallback_when_cubic_term_vanishes() {
        // a = -p0 + 3p1 - 3p2 + p3 = 0 with these points
        let times = [0.0, 0.0, 1.0, 3.0];
        let cubic = Cubic::from_points(times[0], times[1], times[2], times[3]);
        approx(cubic.a, 0.0, 1e-12);
        let t = cubic.eval(0.3);
        approx(bezier_parameter(times, t, 1e-10), 0.3, 1e-9);
    }

    #[test]
    fn hermite_hits_endpoints_and_slopes() {
        let v0 = hermite_value(1.0, 2.0_f64, 0.5, 3.0, 4.0, -1.0, 1.0);
        let v1 = hermite_value(1.0, 2.0_f64, 0.5, 3.0, 4.0, -1.0, 3.0);
        approx(v0, 2.0, 1e-12);
        approx(v1, 4.0, 1e-12);
        approx(hermite_derivative(1.0, 2.0_f64, 0.5, 3.0, 4.0, -1.0, 1.0), 0.5, 1e-12);
        approx(hermite_derivative(1.0, 2.0_f64, 0.5, 3.0, 4.0, -1.0, 3.0), -1.0, 1e-12);
    }

    #[test]
    fn bezier_curve_endpoints() {
        approx(bezier_curve(1.0_f64, 5.0, -3.0, 2.0, 0.0), 1.0, 1e-12);
        approx(bezier_curve(1.0_f64, 5.0, -3.0, 2.0, 1.0), 2.0, 1e-12);
        approx(bezier_curve_derivative(1.0_f64, 5.0, -3.0, 2.0, 0.0), 12.0, 1e-12);
    }
}
