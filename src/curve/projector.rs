//! Projektion eines beliebigen Punkts auf eine Führungskurve.
//!
//! Deterministische Zwei-Phasen-Abtastung statt geschlossener Lösung:
//! 1. `coarse_samples` gleichmäßige Schritte über [0, 1]
//! 2. `refine_samples` Schritte im Fenster ±`refine_window` um das beste t
//!
//! Genauigkeit unterhalb der Verfeinerungs-Auflösung ist nicht garantiert.

use super::GuideCurve;
use crate::shared::options::{
    PROJECTION_COARSE_SAMPLES, PROJECTION_REFINE_SAMPLES, PROJECTION_REFINE_WINDOW,
};
use glam::Vec3;

/// Abtast-Parameter der Projektion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionSettings {
    /// Schritte der groben Phase über [0, 1]
    pub coarse_samples: usize,
    /// Schritte der Verfeinerungsphase
    pub refine_samples: usize,
    /// Halbe Breite des Verfeinerungsfensters in t
    pub refine_window: f32,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            coarse_samples: PROJECTION_COARSE_SAMPLES,
            refine_samples: PROJECTION_REFINE_SAMPLES,
            refine_window: PROJECTION_REFINE_WINDOW,
        }
    }
}

/// Ergebnis einer Projektion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Kurvenparameter des nächstgelegenen Punkts
    pub t: f32,
    /// `curve.evaluate(t)`
    pub position: Vec3,
    /// Quadrierter Abstand zum Eingabepunkt
    pub distance_squared: f32,
}

/// Sucht das Minimum von `|point − curve(t)|²` über `count + 1` gleichmäßige t in [lo, hi].
fn scan(
    curve: &GuideCurve,
    point: Vec3,
    lo: f32,
    hi: f32,
    count: usize,
    best: &mut Option<Projection>,
) {
    let count = count.max(1);
    for i in 0..=count {
        let t = lo + (hi - lo) * (i as f32 / count as f32);
        let position = curve.evaluate(t);
        let distance_squared = position.distance_squared(point);
        if !distance_squared.is_finite() {
            continue;
        }
        if best.is_none_or(|b| distance_squared < b.distance_squared) {
            *best = Some(Projection {
                t,
                position,
                distance_squared,
            });
        }
    }
}

/// Projiziert `point` auf `curve`.
///
/// Gibt `None` zurück, wenn der Punkt nicht endlich ist; Aufrufer behalten
/// dann ihre letzte gültige Position, damit kein NaN in die Szene gelangt.
pub fn project_point(
    curve: &GuideCurve,
    point: Vec3,
    settings: &ProjectionSettings,
) -> Option<Projection> {
    if !point.is_finite() {
        log::warn!("Projektion mit nicht-endlichem Punkt {:?} ignoriert", point);
        return None;
    }

    let mut best = None;
    scan(curve, point, 0.0, 1.0, settings.coarse_samples, &mut best);
    let coarse = best?;

    let lo = (coarse.t - settings.refine_window).max(0.0);
    let hi = (coarse.t + settings.refine_window).min(1.0);
    scan(curve, point, lo, hi, settings.refine_samples, &mut best);

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::spline_geometry::CurveParameterization;
    use approx::assert_relative_eq;

    fn line3() -> GuideCurve {
        GuideCurve::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::new(20.0, 0.0, 0.0),
            ],
            CurveParameterization::Uniform,
        )
        .unwrap()
    }

    #[test]
    fn test_projects_offset_point_onto_line() {
        let settings = ProjectionSettings::default();
        let query = Vec3::new(9.0, 1.0, 0.0);
        let hit = project_point(&line3(), query, &settings).unwrap();
        assert_relative_eq!(hit.t, 0.45, epsilon = 0.01);
        assert!(hit.position.y.abs() < 1e-4);
        assert!((hit.position.x - 9.0).abs() <= 0.5);
        assert_relative_eq!(hit.distance_squared, 1.0, epsilon = 0.05);
    }

    #[test]
    fn test_point_on_curve_reproduces_itself() {
        let curve = GuideCurve::new(
            vec![
                Vec3::new(-20.0, 0.0, 0.0),
                Vec3::new(-10.0, 14.0, 0.0),
                Vec3::new(0.0, 20.0, 0.0),
                Vec3::new(10.0, 14.0, 0.0),
                Vec3::new(20.0, 0.0, 0.0),
            ],
            CurveParameterization::Uniform,
        )
        .unwrap();
        let on_curve = curve.evaluate(0.37);
        let hit = project_point(&curve, on_curve, &ProjectionSettings::default()).unwrap();
        assert!(hit.position.distance(on_curve) < 0.1);
        assert!((hit.t - 0.37).abs() < 0.01);
    }

    #[test]
    fn test_points_beyond_ends_clamp_to_endpoints() {
        let curve = line3();
        let settings = ProjectionSettings::default();
        let before = project_point(&curve, Vec3::new(-5.0, 2.0, 0.0), &settings).unwrap();
        assert_eq!(before.t, 0.0);
        assert_eq!(before.position, curve.start());
        let after = project_point(&curve, Vec3::new(30.0, -2.0, 0.0), &settings).unwrap();
        assert_eq!(after.t, 1.0);
        assert_eq!(after.position, curve.end());
    }

    #[test]
    fn test_two_vertex_curve() {
        let curve = GuideCurve::new(
            vec![Vec3::ZERO, Vec3::new(0.0, 10.0, 0.0)],
            CurveParameterization::Uniform,
        )
        .unwrap();
        let settings = ProjectionSettings::default();
        let query = Vec3::new(3.0, 2.5, 0.0);
        let hit = project_point(&curve, query, &settings).unwrap();
        assert_relative_eq!(hit.position.y, 2.5, epsilon = 0.06);
        assert!(hit.position.x.abs() < 1e-5);
    }

    #[test]
    fn test_nan_point_yields_none() {
        let hit = project_point(
            &line3(),
            Vec3::new(f32::NAN, 0.0, 0.0),
            &ProjectionSettings::default(),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_projection_is_deterministic() {
        let curve = line3();
        let p = Vec3::new(13.3, -4.0, 2.0);
        let a = project_point(&curve, p, &ProjectionSettings::default());
        let b = project_point(&curve, p, &ProjectionSettings::default());
        assert_eq!(a, b);
    }
}
