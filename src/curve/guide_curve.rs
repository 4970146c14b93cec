//! Offene, interpolierende Führungskurve (Bogenkurve) über t ∈ [0, 1].

use super::CurveBuildError;
use crate::shared::spline_geometry::{
    catmull_rom_chain, catmull_rom_point_with, polyline_length, segment_controls,
    CurveParameterization,
};
use glam::Vec3;

/// Schrittweite für die numerische Tangente.
const TANGENT_STEP: f32 = 1e-3;

/// Geordnete Kontrollpunkte (≥ 2) plus die daraus abgeleitete Catmull-Rom-Kurve.
///
/// Der globale Parameter `t` wird gleichmäßig auf die Segmente verteilt
/// (keine echte Bogenlänge). Die Kurve ist nie geschlossen.
#[derive(Debug, Clone, PartialEq)]
pub struct GuideCurve {
    vertices: Vec<Vec3>,
    parameterization: CurveParameterization,
}

impl GuideCurve {
    /// Erstellt eine Kurve aus geordneten Kontrollpunkten.
    pub fn new(
        vertices: Vec<Vec3>,
        parameterization: CurveParameterization,
    ) -> Result<Self, CurveBuildError> {
        if vertices.len() < 2 {
            return Err(CurveBuildError::TooFewVertices {
                found: vertices.len(),
            });
        }
        if let Some(index) = vertices.iter().position(|v| !v.is_finite()) {
            return Err(CurveBuildError::NonFiniteVertex { index });
        }
        Ok(Self {
            vertices,
            parameterization,
        })
    }

    /// Kontrollpunkte in Kurvenreihenfolge.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Anzahl der Kontrollpunkte.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Anzahl der Catmull-Rom-Segmente.
    pub fn segment_count(&self) -> usize {
        self.vertices.len() - 1
    }

    /// Verwendete Knoten-Parametrisierung.
    pub fn parameterization(&self) -> CurveParameterization {
        self.parameterization
    }

    /// Erster Kontrollpunkt.
    pub fn start(&self) -> Vec3 {
        self.vertices[0]
    }

    /// Letzter Kontrollpunkt.
    pub fn end(&self) -> Vec3 {
        self.vertices[self.vertices.len() - 1]
    }

    /// Punkt auf der Kurve bei `t` (wird auf [0, 1] begrenzt, NaN → 0).
    ///
    /// `evaluate(0)` und `evaluate(1)` liefern exakt den ersten bzw. letzten Kontrollpunkt.
    pub fn evaluate(&self, t: f32) -> Vec3 {
        if t.is_nan() || t <= 0.0 {
            return self.start();
        }
        if t >= 1.0 {
            return self.end();
        }

        let segments = self.segment_count();
        let scaled = t * segments as f32;
        let seg = (scaled.floor() as usize).min(segments - 1);
        let local = scaled - seg as f32;

        let (p0, p1, p2, p3) = segment_controls(&self.vertices, seg);
        catmull_rom_point_with(p0, p1, p2, p3, local, self.parameterization)
    }

    /// Normierte Tangente bei `t` (zentrale Differenz, an den Rändern einseitig).
    ///
    /// Wird nicht für die Ausrichtung abhängiger Ebenen verwendet.
    pub fn tangent(&self, t: f32) -> Vec3 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let lo = (t - TANGENT_STEP).max(0.0);
        let hi = (t + TANGENT_STEP).min(1.0);
        let delta = self.evaluate(hi) - self.evaluate(lo);
        delta.try_normalize().unwrap_or(Vec3::X)
    }

    /// Dichte Polyline mit `samples_per_segment` Stützstellen je Segment (für Rendering).
    pub fn sample(&self, samples_per_segment: usize) -> Vec<Vec3> {
        catmull_rom_chain(&self.vertices, samples_per_segment, self.parameterization)
    }

    /// Approximierte Kurvenlänge.
    pub fn approx_length(&self, samples_per_segment: usize) -> f32 {
        polyline_length(&self.sample(samples_per_segment.max(1)))
    }
}
