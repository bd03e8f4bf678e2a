use vizij_spline_core::{
    AntiRegressionMode, AntiRegressionSelector, CurveType, Extrapolation, InterpMode, Knot,
    Spline, SplineError, Tangent, TangentAlgorithm, Vec2,
};

fn approx(a: f64, b: f64, eps: f64) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn curve(time: f64, value: f64) -> Knot<f64> {
    Knot::new(time, value).with_interp(InterpMode::Curve)
}

fn samples(spline: &Spline<f64>, from: f64, to: f64, n: usize) -> Vec<Option<f64>> {
    (0..=n)
        .map(|i| spline.eval(from + (to - from) * i as f64 / n as f64))
        .collect()
}

#[test]
fn linear_segment_midpoint() {
    let mut spline = Spline::new();
    spline
        .set_knot(Knot::new(0.0, 0.0).with_interp(InterpMode::Linear))
        .unwrap();
    spline.set_knot(Knot::new(1.0, 1.0)).unwrap();
    assert_eq!(spline.eval(0.5), Some(0.5));
    assert_eq!(spline.eval_derivative(0.5), Some(1.0));
}

#[test]
fn auto_ease_middle_knot() {
    let mut spline = Spline::new();
    spline.set_knot(curve(0.0, 0.0)).unwrap();
    spline
        .set_knot(curve(3.0, 2.0).with_algorithm(TangentAlgorithm::AutoEase))
        .unwrap();
    spline.set_knot(curve(6.0, 3.0)).unwrap();

    let mid = spline.knot(3.0).unwrap();
    approx(mid.pre_tangent.slope, 0.5, 1e-12);
    approx(mid.post_tangent.slope, 0.5, 1e-12);
    assert_eq!(mid.pre_tangent.width, 1.0);
    assert_eq!(mid.post_tangent.width, 1.0);
    // neighbors keep their authored tangents
    assert_eq!(spline.knot(0.0).unwrap().post_tangent, Tangent::default());
}

#[test]
fn hermite_widths_follow_neighbors() {
    let mut spline = Spline::new();
    spline.set_curve_type(CurveType::Hermite);
    spline
        .set_knot(curve(0.0, 0.0).with_pre_tangent(Tangent::new(0.7, 0.0)))
        .unwrap();
    spline.set_knot(curve(6.0, 1.0)).unwrap();
    assert_eq!(spline.knot(0.0).unwrap().post_tangent.width, 2.0);
    assert_eq!(spline.knot(6.0).unwrap().pre_tangent.width, 2.0);

    spline.set_knot(curve(3.0, 0.5)).unwrap();
    assert_eq!(spline.knot(0.0).unwrap().post_tangent.width, 1.0);
    assert_eq!(spline.knot(6.0).unwrap().pre_tangent.width, 1.0);
    let mid = spline.knot(3.0).unwrap();
    assert_eq!((mid.pre_tangent.width, mid.post_tangent.width), (1.0, 1.0));

    // boundary side never normalized
    assert_eq!(spline.knot(0.0).unwrap().pre_tangent.width, 0.7);
}

#[test]
fn curve_type_switches_are_stable() {
    let mut spline = Spline::new();
    spline
        .set_knot(
            curve(0.0, 0.0)
                .with_pre_tangent(Tangent::new(0.7, 1.0))
                .with_post_tangent(Tangent::custom(0.25, 1.0)),
        )
        .unwrap();
    spline.set_knot(curve(4.0, 2.0)).unwrap();

    spline.set_curve_type(CurveType::Hermite);
    let once = spline.clone();
    spline.set_curve_type(CurveType::Hermite);
    assert_eq!(spline, once);
    approx(spline.knot(0.0).unwrap().post_tangent.width, 4.0 / 3.0, 1e-12);

    // normalized widths survive the switch back
    spline.set_curve_type(CurveType::Bezier);
    approx(spline.knot(0.0).unwrap().post_tangent.width, 4.0 / 3.0, 1e-12);
    assert_eq!(spline.knot(0.0).unwrap().pre_tangent.width, 0.7);
    assert_eq!(
        spline.knot(0.0).unwrap().post_tangent.algorithm,
        TangentAlgorithm::Custom
    );
}

#[test]
fn repeated_set_knot_is_idempotent() {
    let mut spline = Spline::new();
    spline.set_knot(curve(0.0, 0.0)).unwrap();
    let eased = curve(2.0, 3.0).with_algorithm(TangentAlgorithm::AutoEase);
    // long post tangent gets contained on the first insertion
    let long = curve(5.0, -1.0)
        .with_pre_tangent(Tangent::new(9.0, 2.0))
        .with_post_tangent(Tangent::new(1.0, 0.0));
    spline.set_knot(eased).unwrap();
    spline.set_knot(long).unwrap();
    spline.set_knot(curve(8.0, 1.0)).unwrap();

    let before = samples(&spline, -1.0, 9.0, 400);
    let stored = *spline.knot(5.0).unwrap();
    spline.set_knot(stored).unwrap();
    spline.set_knot(stored).unwrap();
    let after = samples(&spline, -1.0, 9.0, 400);
    assert_eq!(before, after);
}

#[test]
fn auto_ease_sign_matches_neighbors() {
    let triples = [
        (0.0, 1.0, 3.0),
        (0.0, -1.0, -4.0),
        (2.0, 1.0, 0.5),
        (0.0, 2.0, 1.0),
        (0.0, -2.0, 1.0),
        (1.0, 1.5, 1.6),
    ];
    for (a, b, c) in triples {
        let mut spline = Spline::new();
        spline.set_knot(curve(0.0, a)).unwrap();
        spline
            .set_knot(curve(1.0, b).with_algorithm(TangentAlgorithm::AutoEase))
            .unwrap();
        spline.set_knot(curve(3.0, c)).unwrap();
        let p = b - a;
        let n = (c - b) / 2.0;
        let slope = spline.knot(1.0).unwrap().post_tangent.slope;
        if p * n < 0.0 {
            assert_eq!(slope, 0.0, "extremum {a} {b} {c}");
        } else {
            assert_eq!(slope.signum(), p.signum(), "triple {a} {b} {c}");
            assert!(slope.abs() <= 3.0 * p.abs().min(n.abs()) + 1e-12);
        }
    }
}

#[test]
fn standalone_update_matches_spline() {
    let lone = Knot::new(0.0, 1.0)
        .with_pre_tangent(Tangent::new(0.5, 0.3).with_algorithm(TangentAlgorithm::AutoEase))
        .with_post_tangent(Tangent::auto_ease())
        .with_interp(InterpMode::Curve);
    let next = Knot::new(6.0, 4.0);

    let mut knot = lone;
    assert!(!knot.update_tangents(None, None, CurveType::Hermite).unwrap());
    assert_eq!(knot, lone);

    assert!(knot.update_tangents(None, Some(&next), CurveType::Bezier).unwrap());
    assert_eq!(knot.pre_tangent, lone.pre_tangent);
    assert_eq!(knot.post_tangent.width, 2.0);
    assert_eq!(knot.post_tangent.slope, 0.0);

    let mut spline = Spline::new();
    spline.set_knot(lone).unwrap();
    spline.set_knot(next).unwrap();
    assert_eq!(spline.knot(0.0), Some(&knot));
}

#[test]
fn dual_valued_knot_sides() {
    let mut spline = Spline::new();
    spline
        .set_knot(Knot::new(0.0, 0.0).with_interp(InterpMode::Linear))
        .unwrap();
    spline
        .set_knot(
            Knot::new(1.0, 5.0)
                .with_pre_value(2.0)
                .with_interp(InterpMode::Held),
        )
        .unwrap();
    spline.set_knot(Knot::new(2.0, 6.0)).unwrap();

    assert_eq!(spline.eval_pre_value(1.0), Some(2.0));
    assert_eq!(spline.eval(1.0), Some(5.0));
    assert_eq!(spline.eval(0.5), Some(1.0));
    assert_eq!(spline.eval_pre_value(2.0), Some(5.0));
    assert_eq!(spline.eval_held(0.5), Some(0.0));
}

#[test]
fn value_blocks_have_no_value() {
    let mut spline = Spline::<f64>::new();
    assert_eq!(spline.eval(0.0), None);

    spline
        .set_knot(Knot::new(0.0, 1.0).with_interp(InterpMode::ValueBlock))
        .unwrap();
    spline.set_knot(Knot::new(1.0, 2.0)).unwrap();
    spline.set_pre_extrapolation(Extrapolation::ValueBlock);
    assert!(spline.has_value_blocks());
    assert_eq!(spline.eval(-1.0), None);
    assert_eq!(spline.eval(0.5), None);
    assert_eq!(spline.eval(1.0), Some(2.0));
    assert_eq!(spline.eval(3.0), Some(2.0));
}

#[test]
fn extrapolation_policies() {
    let mut spline = Spline::new();
    spline
        .set_knot(Knot::new(0.0, 0.0).with_interp(InterpMode::Linear))
        .unwrap();
    spline.set_knot(Knot::new(2.0, 1.0).with_interp(InterpMode::Linear)).unwrap();

    assert_eq!(spline.eval(-5.0), Some(0.0));
    spline.set_pre_extrapolation(Extrapolation::Linear);
    assert_eq!(spline.eval(-2.0), Some(-1.0));
    spline.set_post_extrapolation(Extrapolation::sloped(-1.0));
    assert_eq!(spline.eval(4.0), Some(-1.0));
    assert_eq!(spline.eval_derivative(4.0), Some(-1.0));
}

#[test]
fn anti_regression_scopes() {
    let regressive = || {
        (
            curve(0.0, 0.0).with_post_tangent(Tangent::new(6.0, 0.0)),
            curve(3.0, 1.0).with_pre_tangent(Tangent::new(1.0, 0.0)),
        )
    };

    let mut raw = Spline::new();
    {
        let _guard = AntiRegressionSelector::new(AntiRegressionMode::None);
        let (a, b) = regressive();
        raw.set_knot(a).unwrap();
        raw.set_knot(b).unwrap();
    }
    assert!(raw.has_regressive_tangents());
    assert_eq!(raw.knot(0.0).unwrap().post_tangent.width, 6.0);
    // evaluation still produces a function of time
    assert!(raw.eval(1.5).is_some());

    {
        let _guard = AntiRegressionSelector::new(AntiRegressionMode::KeepRatio);
        assert!(raw.adjust_regressive_tangents());
    }
    assert!(!raw.has_regressive_tangents());

    let mut contained = Spline::new();
    let (a, b) = regressive();
    contained.set_knot(a).unwrap();
    contained.set_knot(b).unwrap();
    assert_eq!(contained.knot(0.0).unwrap().post_tangent.width, 3.0);
}

#[test]
fn mismatched_value_types_are_rejected() {
    let mut spline = Spline::new();
    spline.set_knot(Knot::new(0.0, 1.0_f64)).unwrap();
    let err = spline.cast::<Vec2>().unwrap_err();
    assert!(matches!(err, SplineError::TypeMismatch { .. }));
    assert_eq!(err.category(), "type");
    assert!(spline.cast::<f32>().is_ok());
}
