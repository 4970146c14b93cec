//! Benchmark für die Kurven-Hotpaths:
//! - Bogenkurve aus Landmarken aufbauen (Mittellinie und Einzelkiefer)
//! - Punkt-Projektion pro Drag-Frame
//! - render() einer Kurven-Strategie

use arch_overlay::curve::ProjectionSettings;
use arch_overlay::{
    project_point, AnalysisContext, CurveMode, CurveParameterization, EngineOptions,
    GuideCurveBuilder, Jaw, LandmarkStore,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use std::hint::black_box;

fn landmarks() -> LandmarkStore {
    LandmarkStore::from_json_str(include_str!("../tests/fixtures/dentition.json"))
        .expect("Fixture parse failed")
}

fn bench_curve_build(c: &mut Criterion) {
    let store = landmarks();
    let mut group = c.benchmark_group("curve_build");
    for mode in [CurveMode::CrossJawMidline, CurveMode::SingleJaw(Jaw::Upper)] {
        let id = BenchmarkId::from_parameter(format!("{mode:?}"));
        group.bench_with_input(id, &mode, |b, &mode| {
            let builder = GuideCurveBuilder::new(CurveParameterization::Uniform);
            b.iter(|| {
                let curve = builder
                    .build_from_store(black_box(&store), mode)
                    .expect("curve build failed");
                black_box(curve.vertex_count())
            })
        });
    }
    group.finish();
}

fn bench_projection(c: &mut Criterion) {
    let store = landmarks();
    let settings = ProjectionSettings::default();
    let mut group = c.benchmark_group("projection");
    for param in [
        CurveParameterization::Uniform,
        CurveParameterization::Centripetal,
        CurveParameterization::Chordal,
    ] {
        let curve = GuideCurveBuilder::new(param)
            .build_from_store(&store, CurveMode::SingleJaw(Jaw::Lower))
            .expect("curve build failed");
        let queries: Vec<Vec3> = (0..64)
            .map(|i| {
                let a = i as f32 * 0.1;
                Vec3::new(a.cos() * 25.0, 20.0 + a.sin() * 10.0, 0.5)
            })
            .collect();
        let id = BenchmarkId::from_parameter(format!("{param:?}"));
        group.bench_with_input(id, &queries, |b, queries| {
            b.iter(|| {
                for &q in queries {
                    black_box(project_point(&curve, black_box(q), &settings));
                }
            })
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut context =
        AnalysisContext::bootstrap(EngineOptions::default()).expect("bootstrap failed");
    context.set_landmarks(landmarks());
    let payload = serde_json::json!({
        "upper": {"arch_length": 78.0},
        "lower": {"arch_length": 68.0}
    });

    c.bench_function("render_arch_form", |b| {
        b.iter(|| {
            context
                .render("arch_form", black_box(&payload))
                .expect("render failed");
            black_box(context.scene().node_count())
        })
    });
}

criterion_group!(benches, bench_curve_build, bench_projection, bench_render);
criterion_main!(benches);
