//! Overbite/Overjet: vertikale und sagittale Stufe der zentralen Schneidezähne.
//!
//! Payload: `{ "overbite": {"value": 2.1, "result": "normal"}, "overjet": 3.4 }`

use super::{field, required_value};
use crate::app::decoration::{Anchor, DecorationBuilder, Placement};
use crate::app::strategy::{
    AnalysisInput, AnalysisStrategy, RenderCategory, StrategyLifecycle, StrategyRecord,
};
use crate::core::{LandmarkKind, LandmarkStore, ToothId};
use crate::shared::summary::GroupBuilder;
use crate::shared::MeasurementSummary;
use glam::Vec3;
use serde_json::Value;

/// Bevorzugter Zahn und Ersatz bei fehlenden Landmarken.
const UPPER_INCISORS: [u8; 2] = [11, 21];
const LOWER_INCISORS: [u8; 2] = [41, 31];

/// Vertikaler Abstand zwischen OB- und OJ-Label.
const LABEL_SPACING: f32 = 2.5;

/// Overbite-Strategie.
pub struct OverbiteStrategy {
    record: StrategyRecord,
    lifecycle: StrategyLifecycle,
    /// Schneidekanten (Overlay-Koordinaten) der aktuellen Generation
    incisor_edges: Option<(Vec3, Vec3)>,
}

impl OverbiteStrategy {
    /// Erstellt die Strategie mit ihren festen Metadaten.
    pub fn new() -> Self {
        Self {
            record: StrategyRecord {
                id: "overbite-overjet",
                display_name: "Overbite / Overjet",
                task_id: "overbite",
                render_category: RenderCategory::Lines,
            },
            lifecycle: StrategyLifecycle::new(),
            incisor_edges: None,
        }
    }

    fn incisal_anchor(store: &LandmarkStore, candidates: [u8; 2]) -> Option<Anchor> {
        candidates
            .into_iter()
            .filter_map(ToothId::new)
            .find_map(|t| Anchor::from_store(store, t, LandmarkKind::Incisal))
    }
}

impl Default for OverbiteStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisStrategy for OverbiteStrategy {
    crate::impl_strategy_accessors!();

    fn build_geometry(&mut self, builder: &mut DecorationBuilder<'_>, input: &AnalysisInput<'_>) {
        let upper = Self::incisal_anchor(input.landmarks, UPPER_INCISORS);
        let lower = Self::incisal_anchor(input.landmarks, LOWER_INCISORS);
        let (Some(upper), Some(lower)) = (upper, lower) else {
            log::warn!("overbite: Schneidezähne fehlen, keine Linie");
            return;
        };
        let (_, placement) = builder.line(upper, lower, "incisor-relation");
        self.incisor_edges = Some((
            builder.resolve(upper, placement),
            builder.resolve(lower, placement),
        ));
    }

    fn build_annotations(
        &mut self,
        builder: &mut DecorationBuilder<'_>,
        input: &AnalysisInput<'_>,
    ) {
        let Some((upper, lower)) = self.incisor_edges else {
            return;
        };
        let task = self.task_id();
        let mid = (upper + lower) * 0.5;
        if let Some(overbite) = required_value(task, input.payload, &["overbite"]) {
            let text = format!("OB {overbite:.1} mm");
            builder.label(Placement::Overlay, mid, text, "label:overbite");
        }
        if let Some(overjet) = required_value(task, input.payload, &["overjet"]) {
            let position = mid - Vec3::Z * LABEL_SPACING;
            let text = format!("OJ {overjet:.1} mm");
            builder.label(Placement::Overlay, position, text, "label:overjet");
        }
    }

    fn forget_generation(&mut self) {
        self.incisor_edges = None;
    }

    fn summarize(&self, payload: &Value) -> MeasurementSummary {
        let mut summary = MeasurementSummary::default();
        GroupBuilder::new("Incisor relation")
            .measurement("Overbite", field(payload, &["overbite"]), "mm")
            .measurement("Overjet", field(payload, &["overjet"]), "mm")
            .push_into(&mut summary);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{dentition, init_scene, render};
    use super::*;
    use crate::core::NodeKind;
    use serde_json::json;

    #[test]
    fn test_cross_jaw_line_is_placed_in_overlay() {
        let mut strategy = OverbiteStrategy::new();
        let mut scene = init_scene(&mut strategy);
        let payload = json!({"overbite": 2.0, "overjet": 3.0});
        render(&mut strategy, &mut scene, &dentition(), &payload);

        let owned = strategy.lifecycle().owned().to_vec();
        assert_eq!(owned.len(), 3, "Linie + zwei Labels erwartet");
        let overlay = scene.overlay_root();
        for key in &owned {
            assert_eq!(scene.get(*key).unwrap().parent(), Some(overlay));
        }
        let line = scene.get(owned[0]).unwrap();
        match line.kind {
            NodeKind::Line { start, end } => {
                assert!(start.z > end.z, "Oberkiefer-Schneidekante liegt oben");
            }
            _ => panic!("Linie erwartet"),
        }
    }

    #[test]
    fn test_falls_back_to_contralateral_incisor() {
        let mut store = LandmarkStore::new();
        let upper = ToothId::new(21).unwrap();
        let lower = ToothId::new(41).unwrap();
        store.insert(upper, LandmarkKind::Incisal, Vec3::new(1.0, 30.0, 1.0));
        store.insert(lower, LandmarkKind::Incisal, Vec3::new(-1.0, 28.0, -1.0));
        let mut strategy = OverbiteStrategy::new();
        let mut scene = init_scene(&mut strategy);
        render(&mut strategy, &mut scene, &store, &json!({}));
        assert_eq!(strategy.lifecycle().owned().len(), 1);
    }

    #[test]
    fn test_rerender_forgets_old_edges() {
        let mut strategy = OverbiteStrategy::new();
        let mut scene = init_scene(&mut strategy);
        let payload = json!({"overbite": 2.0});
        render(&mut strategy, &mut scene, &dentition(), &payload);
        render(&mut strategy, &mut scene, &LandmarkStore::new(), &payload);
        assert!(strategy.incisor_edges.is_none());
        assert!(strategy.lifecycle().owned().is_empty());
    }

    #[test]
    fn test_summary_contains_both_rows() {
        let strategy = OverbiteStrategy::new();
        let summary = strategy.summarize(&json!({
            "overbite": {"value": 4.5, "result": "deep bite"},
            "overjet": 2.0
        }));
        assert_eq!(summary.groups.len(), 1);
        assert_eq!(summary.find_row("Overbite").unwrap().result, "deep bite");
        assert_eq!(summary.find_row("Overjet").unwrap().value, "2.00 mm");
    }
}
