//! Integrationstests für Guide-Curve-Builder und Point-Projector.

use approx::assert_relative_eq;
use arch_overlay::app::strategies::{BoltonStrategy, OverbiteStrategy};
use arch_overlay::curve::ProjectionSettings;
use arch_overlay::{
    project_point, CurveBuildError, CurveMode, CurveParameterization, GuideCurve,
    GuideCurveBuilder, Jaw, LandmarkKind, LandmarkStore, StrategyRegistry, ToothId,
};
use glam::Vec3;
use std::collections::BTreeMap;

fn fixture_landmarks() -> LandmarkStore {
    LandmarkStore::from_json_str(include_str!("fixtures/dentition.json"))
        .expect("Fixture muss gültiges JSON sein")
}

/// Alle Punkte des Stores als Builder-Eingabe, optional ohne einen Zahn.
fn raw_points(store: &LandmarkStore, without: Option<u8>) -> BTreeMap<ToothId, Vec<Vec3>> {
    store
        .centroids()
        .into_keys()
        .filter(|tooth| Some(tooth.code()) != without)
        .map(|tooth| {
            let points = store.points(tooth).iter().map(|l| l.position).collect();
            (tooth, points)
        })
        .collect()
}

#[test]
fn test_midline_with_one_missing_pair_has_thirteen_vertices() {
    let store = fixture_landmarks();
    let builder = GuideCurveBuilder::default();

    // 14 vollständige Paare (17–11, 21–27 mit Antagonisten); 18 hat keinen Antagonisten
    let full = builder
        .build(&raw_points(&store, None), CurveMode::CrossJawMidline)
        .unwrap();
    assert_eq!(full.vertex_count(), 14);

    // Oberer Zahn 24 fehlt → Paar 24/34 entfällt
    let curve = builder
        .build(&raw_points(&store, Some(24)), CurveMode::CrossJawMidline)
        .unwrap();
    assert_eq!(curve.vertex_count(), 13);
    assert!(curve.vertices().iter().all(|v| *v != Vec3::ZERO));
}

#[test]
fn test_midline_vertices_are_pair_midpoints_in_arch_order() {
    let store = fixture_landmarks();
    let curve = GuideCurveBuilder::default()
        .build_from_store(&store, CurveMode::CrossJawMidline)
        .unwrap();
    let c17 = store.centroid(ToothId::new(17).unwrap()).unwrap();
    let c47 = store.centroid(ToothId::new(47).unwrap()).unwrap();
    let c27 = store.centroid(ToothId::new(27).unwrap()).unwrap();
    let c37 = store.centroid(ToothId::new(37).unwrap()).unwrap();
    assert_relative_eq!(curve.start().x, ((c17 + c47) * 0.5).x, epsilon = 1e-5);
    assert_relative_eq!(curve.end().y, ((c27 + c37) * 0.5).y, epsilon = 1e-5);
}

#[test]
fn test_evaluate_hits_endpoints_exactly() {
    let store = fixture_landmarks();
    for param in [
        CurveParameterization::Uniform,
        CurveParameterization::Centripetal,
        CurveParameterization::Chordal,
    ] {
        for jaw in Jaw::ALL {
            let curve = GuideCurveBuilder::new(param)
                .build_from_store(&store, CurveMode::SingleJaw(jaw))
                .unwrap();
            let vertices = curve.vertices();
            assert_eq!(curve.evaluate(0.0), vertices[0]);
            assert_eq!(curve.evaluate(1.0), vertices[vertices.len() - 1]);
        }
    }
}

#[test]
fn test_single_jaw_order_runs_right_posterior_to_left_posterior() {
    let store = fixture_landmarks();
    let curve = GuideCurveBuilder::default()
        .build_from_store(&store, CurveMode::SingleJaw(Jaw::Upper))
        .unwrap();
    // 18 ist rechts-posterior und eröffnet den Bogen
    assert_eq!(curve.vertex_count(), 15);
    let first = store.centroid(ToothId::new(18).unwrap()).unwrap();
    assert_eq!(curve.start(), first);
    assert!(curve.end().x > 0.0);
}

#[test]
fn test_too_few_vertices_is_a_build_failure() {
    let mut store = LandmarkStore::new();
    store.insert(ToothId::new(11).unwrap(), LandmarkKind::Incisal, Vec3::ONE);
    store.insert(ToothId::new(41).unwrap(), LandmarkKind::Incisal, Vec3::ZERO);
    let err = GuideCurveBuilder::default()
        .build_from_store(&store, CurveMode::CrossJawMidline)
        .unwrap_err();
    assert_eq!(err, CurveBuildError::TooFewVertices { found: 1 });
}

#[test]
fn test_projector_reference_case() {
    let curve = GuideCurve::new(
        vec![
            Vec3::ZERO,
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(20.0, 0.0, 0.0),
        ],
        CurveParameterization::Uniform,
    )
    .unwrap();
    let settings = ProjectionSettings::default();
    let p = project_point(&curve, Vec3::new(9.0, 1.0, 0.0), &settings).unwrap();
    assert_relative_eq!(p.t, 0.45, epsilon = 0.01);
    assert_relative_eq!(p.position.y, 0.0, epsilon = 1e-4);
    assert!((p.position.x - 9.0).abs() <= 0.5);
}

#[test]
fn test_projecting_point_on_curve_reproduces_it() {
    let store = fixture_landmarks();
    let curve = GuideCurveBuilder::default()
        .build_from_store(&store, CurveMode::SingleJaw(Jaw::Lower))
        .unwrap();
    let settings = ProjectionSettings::default();
    for t in [0.0, 0.13, 0.5, 0.87, 1.0] {
        let on_curve = curve.evaluate(t);
        let p = project_point(&curve, on_curve, &settings).unwrap();
        assert!(p.position.distance(on_curve) < 0.05, "t = {t}");
    }
}

#[test]
fn test_projecting_nan_returns_none() {
    let curve = GuideCurve::new(vec![Vec3::ZERO, Vec3::X], CurveParameterization::Uniform).unwrap();
    let settings = ProjectionSettings::default();
    let query = Vec3::splat(f32::NAN);
    assert!(project_point(&curve, query, &settings).is_none());
}

#[test]
fn test_registry_lookup_scenario() {
    let mut registry = StrategyRegistry::new();
    registry.register(Box::new(BoltonStrategy::new())).unwrap();
    registry
        .register(Box::new(OverbiteStrategy::new()))
        .unwrap();
    let found = registry.get("overbite").map(|s| s.task_id());
    assert_eq!(found, Some("overbite"));
    assert!(registry.get("unknown").is_none());
}
