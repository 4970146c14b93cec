//! Baut anatomisch geordnete Führungskurven aus Zahn-Landmarken.
//!
//! Ablauf: Punkte je Zahn → Schwerpunkt → Reihenfolge je Modus → ≥ 2 Vertices
//! → offene Catmull-Rom-Kurve.

use super::{CurveBuildError, GuideCurve};
use crate::core::tooth::{arch_order, canonical_pairs, Jaw, ToothId};
use crate::core::LandmarkStore;
use crate::shared::spline_geometry::CurveParameterization;
use glam::Vec3;
use std::collections::BTreeMap;

/// Ordnungsmodus der Kurven-Vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveMode {
    /// Mittelpunkte der 16 kanonischen Ober-/Unterkiefer-Paare
    CrossJawMidline,
    /// Schwerpunkte eines Kiefers in Bogenreihenfolge
    SingleJaw(Jaw),
}

/// Reduziert die Punkte je Zahn auf ihren Schwerpunkt. Leere Listen entfallen.
pub fn centroids(points: &BTreeMap<ToothId, Vec<Vec3>>) -> BTreeMap<ToothId, Vec3> {
    points
        .iter()
        .filter(|(_, pts)| !pts.is_empty())
        .map(|(&tooth, pts)| {
            let sum: Vec3 = pts.iter().copied().sum();
            (tooth, sum / pts.len() as f32)
        })
        .collect()
}

/// Ordnet Schwerpunkte gemäß `mode`. Fehlende Zähne bzw. unvollständige Paare
/// werden übersprungen, ohne Platzhalter zu erzeugen.
pub fn ordered_vertices(centroids: &BTreeMap<ToothId, Vec3>, mode: CurveMode) -> Vec<Vec3> {
    match mode {
        CurveMode::CrossJawMidline => canonical_pairs()
            .into_iter()
            .filter_map(|(upper, lower)| match (centroids.get(&upper), centroids.get(&lower)) {
                (Some(a), Some(b)) => Some((*a + *b) * 0.5),
                _ => {
                    log::trace!("Paar {}/{} unvollständig, übersprungen", upper, lower);
                    None
                }
            })
            .collect(),
        CurveMode::SingleJaw(jaw) => arch_order(jaw)
            .into_iter()
            .filter_map(|tooth| centroids.get(&tooth).copied())
            .collect(),
    }
}

/// Konfigurierbarer Builder für Bogenkurven.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuideCurveBuilder {
    parameterization: CurveParameterization,
}

impl GuideCurveBuilder {
    /// Erstellt einen Builder mit der angegebenen Parametrisierung.
    pub fn new(parameterization: CurveParameterization) -> Self {
        Self { parameterization }
    }

    /// Baut eine Kurve aus rohen Punkten je Zahn.
    pub fn build(
        &self,
        points: &BTreeMap<ToothId, Vec<Vec3>>,
        mode: CurveMode,
    ) -> Result<GuideCurve, CurveBuildError> {
        self.build_from_centroids(&centroids(points), mode)
    }

    /// Baut eine Kurve direkt aus dem Landmark-Store.
    pub fn build_from_store(
        &self,
        store: &LandmarkStore,
        mode: CurveMode,
    ) -> Result<GuideCurve, CurveBuildError> {
        self.build_from_centroids(&store.centroids(), mode)
    }

    /// Baut eine Kurve aus bereits berechneten Schwerpunkten.
    pub fn build_from_centroids(
        &self,
        centroids: &BTreeMap<ToothId, Vec3>,
        mode: CurveMode,
    ) -> Result<GuideCurve, CurveBuildError> {
        let vertices = ordered_vertices(centroids, mode);
        log::debug!("Bogenkurve {:?}: {} Vertices", mode, vertices.len());
        GuideCurve::new(vertices, self.parameterization)
    }
}
