use vizij_spline_core::{
    Extrapolation, InterpMode, Knot, LoopParams, Spline, SplineError, TimeInterval,
};

fn approx(a: f64, b: f64, eps: f64) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

/// Prototype [10, 15) ramps 1 -> 3 then holds; one repeat before, two after,
/// each stepping the value by 2.
fn inner_looped() -> Spline<f64> {
    let mut spline = Spline::new();
    for knot in [
        Knot::new(0.0, 0.0),
        Knot::new(8.0, 100.0),
        Knot::new(10.0, 1.0).with_interp(InterpMode::Linear),
        Knot::new(12.0, 3.0).with_interp(InterpMode::Linear),
        Knot::new(15.0, 100.0),
        Knot::new(30.0, 7.0),
    ] {
        spline.set_knot(knot).unwrap();
    }
    spline
        .set_inner_loop_params(Some(
            LoopParams::new(10.0, 15.0)
                .with_loops(1, 2)
                .with_value_offset(2.0),
        ))
        .unwrap();
    spline
}

fn ramp() -> Spline<f64> {
    let mut spline = Spline::new();
    spline
        .set_knot(Knot::new(0.0, 0.0).with_interp(InterpMode::Linear))
        .unwrap();
    spline.set_knot(Knot::new(1.0, 1.0)).unwrap();
    spline
}

#[test]
fn repetitions_offset_the_prototype() {
    let spline = inner_looped();
    assert!(spline.has_inner_loops());
    assert!(spline.has_loops());
    assert_eq!(spline.eval(11.0), Some(2.0));
    assert_eq!(spline.eval(16.0), Some(4.0));
    assert_eq!(spline.eval(21.0), Some(6.0));
    assert_eq!(spline.eval(6.0), Some(0.0));
    // shadowed authored knot at 8 no longer contributes
    assert_eq!(spline.eval(8.0), Some(1.0));
    assert_eq!(spline.pre_extrap_time(), Some(0.0));
    assert_eq!(spline.post_extrap_time(), Some(30.0));
    assert_eq!(
        spline.looped_interval(),
        Some(TimeInterval::new(5.0, 25.0))
    );
}

#[test]
fn loop_masking() {
    let spline = inner_looped();
    let mut t = 5.0 + 0.125;
    while t < 25.0 {
        let in_prototype = (10.0..15.0).contains(&t);
        let allowed = spline.can_breakdown(t).is_ok();
        let is_knot = [10.0, 12.0].contains(&t);
        assert_eq!(allowed, in_prototype && !is_knot, "time {t}");
        t += 0.125;
    }
    assert!(spline.can_breakdown(4.0).is_ok());
    assert!(spline.can_breakdown(26.0).is_ok());

    let err = spline.can_breakdown(16.0).unwrap_err();
    assert!(err.to_string().contains("masked by inner looping"));
    assert!(err.is_recoverable());

    let mut edited = spline.clone();
    assert!(edited.breakdown(16.0).is_err());
    assert_eq!(edited, spline);
}

#[test]
fn materialized_echoes() {
    let spline = inner_looped();
    let knots = spline.materialize_knots(&TimeInterval::new(14.0, 21.0));
    let times: Vec<f64> = knots.iter().map(|k| k.time).collect();
    let values: Vec<f64> = knots.iter().map(|k| k.value).collect();
    assert_eq!(times, vec![15.0, 17.0, 20.0]);
    assert_eq!(values, vec![3.0, 5.0, 5.0]);

    let bracketed: Vec<f64> = spline
        .materialize_knots_bracketed(&TimeInterval::new(14.0, 21.0))
        .iter()
        .map(|k| k.time)
        .collect();
    assert_eq!(bracketed, vec![12.0, 15.0, 17.0, 20.0, 22.0]);
    let gap: Vec<f64> = spline
        .materialize_knots_bracketed(&TimeInterval::new(26.0, 28.0))
        .iter()
        .map(|k| k.time)
        .collect();
    assert_eq!(gap, vec![25.0, 30.0]);

    // a loop-free copy evaluates the same over the interval
    let mut flat = Spline::new();
    for knot in spline.materialize_knots(&TimeInterval::everything()) {
        flat.set_knot(knot).unwrap();
    }
    assert!(!flat.has_inner_loops());
    for i in 0..=120 {
        let t = i as f64 * 0.25;
        assert_eq!(flat.eval(t), spline.eval(t), "time {t}");
    }
}

#[test]
fn invalid_loop_params_are_rejected() {
    let mut spline = inner_looped();
    let before = spline.clone();
    for params in [
        LoopParams::new(15.0, 10.0),
        LoopParams::new(10.0, 10.0),
        LoopParams::new(10.0, 15.0).with_loops(-1, 0),
        LoopParams::new(f64::NAN, 15.0),
    ] {
        let err = spline.set_inner_loop_params(Some(params)).unwrap_err();
        assert!(matches!(err, SplineError::InvalidLoopParams { .. }));
    }
    assert_eq!(spline, before);

    spline.set_inner_loop_params(None).unwrap();
    assert!(!spline.has_inner_loops());
    assert_eq!(spline.eval(8.0), Some(100.0));
}

#[test]
fn extreme_loop_counts_evaluate() {
    let mut spline = ramp();
    spline
        .set_inner_loop_params(Some(
            LoopParams::new(0.0, 2.0)
                .with_loops(i32::MAX, i32::MAX)
                .with_value_offset(1.0),
        ))
        .unwrap();
    assert!(spline.has_inner_loops());

    let looped = spline.looped_interval().unwrap();
    assert_eq!(looped.min, -2.0 * i32::MAX as f64);
    assert_eq!(looped.max, 2.0 * (i32::MAX as f64 + 1.0));

    // repetition 500000 spans [1e6, 1e6 + 2)
    assert_eq!(spline.eval(1.0e6), Some(500_000.0));
    assert_eq!(spline.eval(1.0e6 + 0.5), Some(500_000.5));
    assert_eq!(spline.eval(1.0e6 + 1.5), Some(500_001.0));
    assert_eq!(spline.eval(-1.0e6 + 0.5), Some(-499_999.5));
    assert!(spline.can_breakdown(1.0e6 + 0.5).is_err());
    assert!(spline.can_breakdown(0.5).is_ok());
}

#[test]
fn loop_params_without_start_knot_do_not_mask() {
    let mut spline = Spline::new();
    spline.set_knot(Knot::new(0.0, 0.0).with_interp(InterpMode::Linear)).unwrap();
    spline.set_knot(Knot::new(30.0, 3.0)).unwrap();
    spline
        .set_inner_loop_params(Some(LoopParams::new(10.0, 15.0).with_loops(1, 2)))
        .unwrap();
    assert!(!spline.has_inner_loops());
    assert!(spline.can_breakdown(16.0).is_ok());

    let before = spline.clone();
    let changed = spline.breakdown(16.0).unwrap();
    assert_eq!((changed.min, changed.max), (0.0, 30.0));
    assert!(!spline.has_inner_loops());
    for i in 0..=60 {
        let t = i as f64 * 0.5;
        approx(before.eval(t).unwrap(), spline.eval(t).unwrap(), 1e-9);
    }
}

#[test]
fn loop_repeat_extrapolation() {
    let mut spline = ramp();
    spline.set_pre_extrapolation(Extrapolation::LoopRepeat);
    spline.set_post_extrapolation(Extrapolation::LoopRepeat);
    assert!(spline.has_extrapolating_loops());
    approx(spline.eval(1.5).unwrap(), 1.5, 1e-12);
    approx(spline.eval(2.0).unwrap(), 2.0, 1e-12);
    approx(spline.eval(3.25).unwrap(), 3.25, 1e-12);
    approx(spline.eval(-0.5).unwrap(), -0.5, 1e-12);
    approx(spline.eval_derivative(5.5).unwrap(), 1.0, 1e-12);
}

#[test]
fn loop_reset_extrapolation() {
    let mut spline = ramp();
    spline.set_post_extrapolation(Extrapolation::LoopReset);
    approx(spline.eval(1.5).unwrap(), 0.5, 1e-12);
    approx(spline.eval(4.25).unwrap(), 0.25, 1e-12);
    // the pre side is still held
    assert_eq!(spline.eval(-3.0), Some(0.0));
}

#[test]
fn loop_oscillate_extrapolation() {
    let mut spline = ramp();
    spline.set_post_extrapolation(Extrapolation::LoopOscillate);
    approx(spline.eval(1.25).unwrap(), 0.75, 1e-12);
    approx(spline.eval_derivative(1.25).unwrap(), -1.0, 1e-12);
    approx(spline.eval(2.25).unwrap(), 0.25, 1e-12);
    approx(spline.eval_derivative(2.25).unwrap(), 1.0, 1e-12);
}

#[test]
fn single_knot_does_not_loop() {
    let mut spline = Spline::new();
    spline.set_knot(Knot::new(1.0, 4.0)).unwrap();
    spline.set_post_extrapolation(Extrapolation::LoopRepeat);
    assert!(!spline.has_extrapolating_loops());
    assert_eq!(spline.eval(10.0), Some(4.0));
    assert!(spline.can_breakdown(10.0).is_ok());
}
