//! Gemeinsame Test-Fixtures für Strategie-Tests.

use crate::app::decoration::SceneHandles;
use crate::app::strategy::{AnalysisInput, AnalysisStrategy};
use crate::core::{LandmarkKind, LandmarkStore, NodeKind, SceneGraph, ToothId};
use crate::shared::EngineOptions;
use glam::Vec3;
use serde_json::Value;

/// Zahnbogen 11–17, 21–27, 31–37, 41–47 mit Mesial-, Distal-, Höcker- und Inzisalpunkten.
pub(crate) fn dentition() -> LandmarkStore {
    let mut store = LandmarkStore::new();
    for quadrant in 1..=4u8 {
        let side = if quadrant == 1 || quadrant == 4 { -1.0 } else { 1.0 };
        let upper = quadrant <= 2;
        let z = if upper { 2.0 } else { -2.0 };
        let y_shift = if upper { 0.0 } else { -2.0 };
        for pos in 1..=7u8 {
            let tooth = ToothId::new(quadrant * 10 + pos).unwrap();
            let x = side * (pos as f32 * 4.0 - 2.0);
            let y = 30.0 - 0.03 * x * x + y_shift;
            store.insert(tooth, LandmarkKind::Mesial, Vec3::new(x - side * 1.5, y, z));
            store.insert(tooth, LandmarkKind::Distal, Vec3::new(x + side * 1.5, y, z));
            let tip = if upper { z - 1.0 } else { z + 1.0 };
            let kind = if pos <= 2 {
                LandmarkKind::Incisal
            } else {
                LandmarkKind::Cusp
            };
            store.insert(tooth, kind, Vec3::new(x, y, tip));
        }
    }
    store
}

/// Initialisiert eine Strategie gegen eine frische Szene.
pub(crate) fn init_scene(strategy: &mut dyn AnalysisStrategy) -> SceneGraph {
    let scene = SceneGraph::new();
    strategy.init(SceneHandles::from_scene(&scene));
    scene
}

/// Führt `render()` mit Standard-Optionen aus.
pub(crate) fn render(
    strategy: &mut dyn AnalysisStrategy,
    scene: &mut SceneGraph,
    landmarks: &LandmarkStore,
    payload: &Value,
) {
    let options = EngineOptions::default();
    let input = AnalysisInput {
        landmarks,
        payload,
        options: &options,
    };
    strategy.render(scene, &input);
}

pub(crate) fn is_marker(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Marker { .. })
}

pub(crate) fn is_line(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Line { .. })
}

pub(crate) fn is_label(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Label { .. })
}
