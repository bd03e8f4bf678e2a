use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use vizij_spline_core::{
    bake, BakingConfig, InterpMode, Knot, LoopParams, Spline, TangentAlgorithm,
};

fn eased_spline(knots: usize) -> Spline<f64> {
    let mut spline = Spline::new();
    for i in 0..knots {
        let t = i as f64;
        let v = (t * 0.37).sin() * 4.0;
        spline
            .set_knot(
                Knot::new(t, v)
                    .with_interp(InterpMode::Curve)
                    .with_algorithm(TangentAlgorithm::AutoEase),
            )
            .unwrap();
    }
    spline
}

fn looped_spline(knots: usize) -> Spline<f64> {
    let mut spline = eased_spline(knots);
    let mid = (knots / 2) as f64;
    spline
        .set_inner_loop_params(Some(
            LoopParams::new(mid, mid + 8.0)
                .with_loops(3, 3)
                .with_value_offset(0.5),
        ))
        .unwrap();
    spline
}

fn bench_eval(c: &mut Criterion) {
    let spline = eased_spline(256);
    c.bench_function("eval_bezier_256", |b| {
        let mut t = 0.0;
        b.iter(|| {
            t = (t + 0.173) % 256.0;
            black_box(spline.eval(black_box(t)))
        })
    });

    let looped = looped_spline(256);
    c.bench_function("eval_inner_loop_256", |b| {
        let mut t = 0.0;
        b.iter(|| {
            t = (t + 0.173) % 256.0;
            black_box(looped.eval(black_box(t)))
        })
    });
}

fn bench_bake(c: &mut Criterion) {
    let spline = eased_spline(64);
    let cfg = BakingConfig::default();
    c.bench_function("bake_64_at_60fps", |b| {
        b.iter(|| black_box(bake(black_box(&spline), &cfg)))
    });
}

fn bench_breakdown(c: &mut Criterion) {
    let spline = eased_spline(64);
    c.bench_function("breakdown_64", |b| {
        b.iter_batched(
            || spline.clone(),
            |mut s| black_box(s.breakdown(black_box(31.5))),
            BatchSize::SmallInput,
        )
    });

    let looped = looped_spline(64);
    c.bench_function("breakdown_inner_loop_64", |b| {
        b.iter_batched(
            || looped.clone(),
            |mut s| black_box(s.breakdown(black_box(33.5))),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_eval, bench_bake, bench_breakdown);
criterion_main!(benches);
