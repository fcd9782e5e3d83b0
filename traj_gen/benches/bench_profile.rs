//! # Profile Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use nalgebra::Vector2;
use traj_lib::{
    geom::{FunctionCurve, QuinticHermite, QuinticHermiteEnds, ReparamParams},
    profile::{
        generate, GeneratorParams, MaxTangentAccelConstraint, MaxTotalAccelConstraint,
        MaxVelocityConstraint, MotionConstraintSet, MotionProfile,
    },
};

fn profile_benchmark(c: &mut Criterion) {
    // ---- Build the path and constraints ----

    let spline = QuinticHermite::new(QuinticHermiteEnds {
        start: Vector2::new(0.0, 0.0),
        start_deriv: Vector2::new(3.0, 0.0),
        start_second_deriv: Vector2::zeros(),
        end: Vector2::new(3.0, 1.5),
        end_deriv: Vector2::new(3.0, 0.0),
        end_second_deriv: Vector2::zeros(),
    });

    let reparam_params = ReparamParams::default();

    c.bench_function("FunctionCurve::new", |b| {
        b.iter(|| FunctionCurve::new(spline, &reparam_params).unwrap())
    });

    let path = FunctionCurve::new(spline, &reparam_params)
        .unwrap()
        .with_tangent_heading();

    let constraints = MotionConstraintSet::new(vec![
        MaxVelocityConstraint::new(0.5).unwrap().into(),
        MaxTotalAccelConstraint::new(0.4).unwrap().into(),
        MaxTangentAccelConstraint::new(0.3).unwrap().into(),
    ]);

    let gen_params = GeneratorParams::default();

    // ---- Bench generation ----

    c.bench_function("generate", |b| {
        b.iter(|| generate(&path, &constraints, &gen_params).unwrap())
    });

    // ---- Bench queries ----

    let profile = generate(&path, &constraints, &gen_params).unwrap();
    let times: Vec<f64> = (0..1000)
        .map(|i| i as f64 * profile.duration() / 999.0)
        .collect();

    c.bench_function("SegmentsMotionProfile::at_time", |b| {
        b.iter(|| times.iter().map(|&t| profile.at_time(t).v).sum::<f64>())
    });

    c.bench_function("TimeStepper::step_all", |b| {
        b.iter(|| profile.time_stepper().step_all(&times))
    });
}

criterion_group!(benches, profile_benchmark);
criterion_main!(benches);
