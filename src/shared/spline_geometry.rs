//! Reine Geometrie-Funktionen für Catmull-Rom-Splines im Raum.
//!
//! Layer-neutral: kann von `curve`, `core` und `app` importiert werden ohne
//! Zirkel-Abhängigkeiten zu erzeugen.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Untergrenze für Knotenabstände bei nicht-uniformer Parametrisierung,
/// damit zusammenfallende Punkte keine Division durch Null auslösen.
const KNOT_EPSILON: f32 = 1e-4;

/// Knoten-Parametrisierung der Catmull-Rom-Segmente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveParameterization {
    /// Gleichmäßige Knoten (α = 0), kanonische Bogenkurve
    #[default]
    Uniform,
    /// Zentripetal (α = 0.5), vermeidet Schleifen bei ungleichen Abständen
    Centripetal,
    /// Chordal (α = 1), Knoten proportional zur Sehnenlänge
    Chordal,
}

impl CurveParameterization {
    /// Exponent α der Knotenabstände `|p_i+1 − p_i|^α`.
    pub fn alpha(self) -> f32 {
        match self {
            CurveParameterization::Uniform => 0.0,
            CurveParameterization::Centripetal => 0.5,
            CurveParameterization::Chordal => 1.0,
        }
    }
}

/// Berechnet einen Punkt auf einem uniformen Catmull-Rom-Segment (t ∈ [0, 1]).
///
/// p0, p1, p2, p3: vier aufeinanderfolgende Kontrollpunkte.
/// Die Kurve verläuft von p1 nach p2.
pub fn catmull_rom_point(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

/// Catmull-Rom-Segment mit frei wählbarer Parametrisierung (Barry-Goldman-Pyramide).
///
/// Für `Uniform` identisch mit [`catmull_rom_point`].
pub fn catmull_rom_point_with(
    p0: Vec3,
    p1: Vec3,
    p2: Vec3,
    p3: Vec3,
    t: f32,
    parameterization: CurveParameterization,
) -> Vec3 {
    if parameterization == CurveParameterization::Uniform {
        return catmull_rom_point(p0, p1, p2, p3, t);
    }

    let alpha = parameterization.alpha();
    let knot = |a: Vec3, b: Vec3| a.distance(b).powf(alpha).max(KNOT_EPSILON);

    let t0 = 0.0;
    let t1 = t0 + knot(p0, p1);
    let t2 = t1 + knot(p1, p2);
    let t3 = t2 + knot(p2, p3);
    let u = t1 + (t2 - t1) * t;

    let a1 = p0 * ((t1 - u) / (t1 - t0)) + p1 * ((u - t0) / (t1 - t0));
    let a2 = p1 * ((t2 - u) / (t2 - t1)) + p2 * ((u - t1) / (t2 - t1));
    let a3 = p2 * ((t3 - u) / (t3 - t2)) + p3 * ((u - t2) / (t3 - t2));

    let b1 = a1 * ((t2 - u) / (t2 - t0)) + a2 * ((u - t0) / (t2 - t0));
    let b2 = a2 * ((t3 - u) / (t3 - t1)) + a3 * ((u - t1) / (t3 - t1));

    b1 * ((t2 - u) / (t2 - t1)) + b2 * ((u - t1) / (t2 - t1))
}

/// Phantom-Punkte für Segment `seg` einer offenen Kette.
///
/// An den Rändern wird gespiegelt, damit die Kurve natürlich durch den
/// ersten und letzten Punkt läuft.
pub fn segment_controls(points: &[Vec3], seg: usize) -> (Vec3, Vec3, Vec3, Vec3) {
    let n = points.len();
    let p1 = points[seg];
    let p2 = points[seg + 1];
    let p0 = if seg == 0 {
        2.0 * p1 - p2
    } else {
        points[seg - 1]
    };
    let p3 = if seg + 2 < n {
        points[seg + 2]
    } else {
        2.0 * p2 - p1
    };
    (p0, p1, p2, p3)
}

/// Berechnet eine dichte Punktliste entlang einer offenen Catmull-Rom-Spline durch `points`.
///
/// `samples_per_segment`: Anzahl der Zwischenpunkte pro Segment (ohne Endpunkt).
pub fn catmull_rom_chain(
    points: &[Vec3],
    samples_per_segment: usize,
    parameterization: CurveParameterization,
) -> Vec<Vec3> {
    if points.len() < 2 || samples_per_segment == 0 {
        return points.to_vec();
    }

    let n = points.len();
    let mut result = Vec::with_capacity((n - 1) * samples_per_segment + 1);

    for seg in 0..(n - 1) {
        let (p0, p1, p2, p3) = segment_controls(points, seg);
        for i in 0..samples_per_segment {
            let t = i as f32 / samples_per_segment as f32;
            result.push(catmull_rom_point_with(p0, p1, p2, p3, t, parameterization));
        }
    }

    // Endpunkt immer exakt übernehmen
    result.push(points[n - 1]);
    result
}

/// Approximierte Länge einer Polyline.
pub fn polyline_length(points: &[Vec3]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arch() -> Vec<Vec3> {
        vec![
            Vec3::new(-20.0, 0.0, 0.0),
            Vec3::new(-12.0, 15.0, 0.0),
            Vec3::new(-2.0, 22.0, 0.0),
            Vec3::new(12.0, 16.0, 0.0),
            Vec3::new(21.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_catmull_rom_two_points_straight_line() {
        let points = vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)];
        let result = catmull_rom_chain(&points, 10, CurveParameterization::Uniform);
        assert_eq!(result.len(), 11);
        for (i, p) in result.iter().enumerate() {
            assert!((p.x - i as f32).abs() < 1e-4, "Punkt {i}: {p:?}");
            assert!(p.y.abs() < 1e-6);
        }
    }

    #[test]
    fn test_all_variants_pass_through_control_points() {
        let points = arch();
        for variant in [
            CurveParameterization::Uniform,
            CurveParameterization::Centripetal,
            CurveParameterization::Chordal,
        ] {
            let result = catmull_rom_chain(&points, 8, variant);
            assert_eq!(result.len(), 4 * 8 + 1);
            for (k, p) in points.iter().enumerate() {
                assert!(
                    result[k * 8].distance(*p) < 1e-3,
                    "{variant:?}: Kontrollpunkt {k} verfehlt"
                );
            }
        }
    }

    #[test]
    fn test_uniform_variant_matches_closed_form() {
        let (p0, p1, p2, p3) = (
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(3.0, 2.0, 1.0),
            Vec3::new(4.0, 0.0, 1.0),
        );
        let a = catmull_rom_point(p0, p1, p2, p3, 0.3);
        let b = catmull_rom_point_with(p0, p1, p2, p3, 0.3, CurveParameterization::Uniform);
        assert_eq!(a, b);
    }

    #[test]
    fn test_coincident_points_stay_finite() {
        let p = Vec3::new(1.0, 1.0, 1.0);
        let q = catmull_rom_point_with(p, p, p, p, 0.5, CurveParameterization::Chordal);
        assert!(q.is_finite());
    }

    #[test]
    fn test_polyline_length() {
        let pts = vec![
            Vec3::ZERO,
            Vec3::new(3.0, 4.0, 0.0),
            Vec3::new(3.0, 4.0, 12.0),
        ];
        assert!((polyline_length(&pts) - 17.0).abs() < 1e-5);
    }
}
