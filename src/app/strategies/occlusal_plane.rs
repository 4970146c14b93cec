//! Okklusionsebene: kieferübergreifende Mittellinienkurve mit einer Referenzebene.
//!
//! Die Ebene hängt als abhängiges Objekt am Control-Point und wird beim Drag
//! nur verschoben; ihre Ausrichtung stammt aus dem Look-at beim Rendern.
//!
//! Payload: `{ "cant": {"value": 1.8, "result": "tilted"}, "curve_of_spee": 2.3 }`

use super::{field, required_value};
use crate::app::decoration::{Anchor, DecorationBuilder, Placement};
use crate::app::strategy::{
    AnalysisInput, AnalysisStrategy, ControlBinding, ControlMoved, DraggableProvider,
    RenderCategory, StrategyLifecycle, StrategyRecord,
};
use crate::core::{Jaw, LandmarkStore, NodeKey, SceneGraph};
use crate::curve::{CurveMode, GuideCurveBuilder};
use crate::shared::summary::GroupBuilder;
use crate::shared::MeasurementSummary;
use glam::Vec3;
use serde_json::Value;

/// Startparameter des Control-Points (Mitte des Bogens).
const CONTROL_T: f32 = 0.5;

/// Nodes der Mittellinie der aktuellen Generation.
#[derive(Debug, Clone)]
struct MidlineHandles {
    curve_node: NodeKey,
    control: NodeKey,
    t: f32,
    plane: NodeKey,
    label: Option<NodeKey>,
    label_offset: Vec3,
}

/// Okklusionsebenen-Strategie.
pub struct OcclusalPlaneStrategy {
    record: StrategyRecord,
    lifecycle: StrategyLifecycle,
    midline: Option<MidlineHandles>,
    /// Kurvenparameter für den nächsten Neuaufbau
    retained_t: Option<f32>,
}

impl OcclusalPlaneStrategy {
    /// Erstellt die Strategie mit ihren festen Metadaten.
    pub fn new() -> Self {
        Self {
            record: StrategyRecord {
                id: "occlusal-plane",
                display_name: "Occlusal Plane",
                task_id: "occlusal_plane",
                render_category: RenderCategory::CurvesAndControls,
            },
            lifecycle: StrategyLifecycle::new(),
            midline: None,
            retained_t: None,
        }
    }

    /// Referenzebene der aktuellen Generation.
    pub fn plane_node(&self) -> Option<NodeKey> {
        self.midline.as_ref().map(|m| m.plane)
    }

    /// Mittelwert aller Oberkiefer-Landmarken (Modellkoordinaten).
    fn upper_centroid(store: &LandmarkStore) -> Option<Vec3> {
        let (sum, count) = store
            .jaw_landmarks(Jaw::Upper)
            .fold((Vec3::ZERO, 0), |(sum, n), l| (sum + l.position, n + 1));
        (count > 0).then(|| sum / count as f32)
    }
}

impl Default for OcclusalPlaneStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisStrategy for OcclusalPlaneStrategy {
    crate::impl_strategy_accessors!();

    fn build_geometry(&mut self, builder: &mut DecorationBuilder<'_>, input: &AnalysisInput<'_>) {
        let curve_builder = GuideCurveBuilder::new(input.options.midline_curve_parameterization);
        let t = self.retained_t.take().unwrap_or(CONTROL_T).clamp(0.0, 1.0);
        let built = curve_builder.build_from_store(input.landmarks, CurveMode::CrossJawMidline);
        let curve = match built {
            Ok(curve) => curve,
            Err(e) => {
                log::warn!("occlusal_plane: keine Mittellinienkurve ({})", e);
                return;
            }
        };
        // Beide Kiefer teilen eine Transformation; die Kurve liegt in Oberkiefer-Modellkoordinaten.
        let curve_node = builder.curve(curve, Jaw::Upper, Placement::Overlay, "curve:midline");
        let Some(control) = builder.control_point(curve_node, t, "control:midline") else {
            return;
        };
        let Some(position) = builder.scene().get(control).map(|n| n.translation) else {
            return;
        };
        let look_at = match Self::upper_centroid(input.landmarks) {
            Some(centroid) => {
                let anchor = Anchor {
                    jaw: Jaw::Upper,
                    position: centroid,
                };
                builder.resolve(anchor, Placement::Overlay)
            }
            None => position + Vec3::Z,
        };
        let plane = builder.plane(Placement::Overlay, position, look_at, "plane:occlusal");
        self.midline = Some(MidlineHandles {
            curve_node,
            control,
            t,
            plane,
            label: None,
            label_offset: builder.options().label_offset,
        });
    }

    fn build_annotations(
        &mut self,
        builder: &mut DecorationBuilder<'_>,
        input: &AnalysisInput<'_>,
    ) {
        let task = self.task_id();
        let Some(midline) = self.midline.as_mut() else {
            return;
        };
        let Some(cant) = required_value(task, input.payload, &["cant"]) else {
            return;
        };
        let Some(position) = builder.scene().get(midline.control).map(|n| n.translation) else {
            return;
        };
        midline.label = Some(builder.label(
            Placement::Overlay,
            position,
            format!("Cant {cant:.1}°"),
            "label:cant",
        ));
    }

    fn forget_generation(&mut self) {
        self.midline = None;
    }

    fn summarize(&self, payload: &Value) -> MeasurementSummary {
        let mut summary = MeasurementSummary::default();
        GroupBuilder::new("Occlusal plane")
            .measurement("Cant", field(payload, &["cant"]), "°")
            .measurement(
                "Curve of Spee depth",
                field(payload, &["curve_of_spee"]),
                "mm",
            )
            .push_into(&mut summary);
        summary
    }

    fn draggable_provider(&self) -> Option<&dyn DraggableProvider> {
        Some(self)
    }

    fn draggable_provider_mut(&mut self) -> Option<&mut dyn DraggableProvider> {
        Some(self)
    }
}

impl DraggableProvider for OcclusalPlaneStrategy {
    fn draggable_objects(&self) -> Vec<ControlBinding> {
        self.midline
            .iter()
            .map(|m| ControlBinding {
                node: m.control,
                curve: m.curve_node,
                t: m.t,
                dependents: vec![m.plane],
            })
            .collect()
    }

    fn on_control_moved(&mut self, scene: &mut SceneGraph, moved: &ControlMoved) {
        let Some(midline) = self.midline.as_mut().filter(|m| m.control == moved.node) else {
            return;
        };
        midline.t = moved.t;
        if let Some(label) = midline.label {
            scene.set_translation(label, moved.position + midline.label_offset);
        }
    }

    fn retain_control_params(&mut self) {
        self.retained_t = self.midline.as_ref().map(|m| m.t);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{dentition, init_scene, render};
    use super::*;
    use crate::core::NodeKind;
    use serde_json::json;

    #[test]
    fn test_render_builds_midline_control_and_plane_in_overlay() {
        let mut strategy = OcclusalPlaneStrategy::new();
        let mut scene = init_scene(&mut strategy);
        let payload = json!({"cant": 1.5});
        render(&mut strategy, &mut scene, &dentition(), &payload);

        let owned = strategy.lifecycle().owned().to_vec();
        assert_eq!(owned.len(), 4, "Kurve, Control-Point, Ebene, Label");
        let overlay = scene.overlay_root();
        for key in &owned {
            assert_eq!(scene.get(*key).unwrap().parent(), Some(overlay));
        }

        let binding = &strategy.draggable_objects()[0];
        assert_eq!(binding.dependents, vec![strategy.plane_node().unwrap()]);
        let curve = scene.curve(binding.curve).unwrap();
        assert_eq!(curve.vertex_count(), 14);
        let control = scene.get(binding.node).unwrap().translation;
        assert!((control - curve.evaluate(0.5)).length() < 1e-5);
        let plane = scene.get(binding.dependents[0]).unwrap();
        assert_eq!(plane.translation, control);
        assert!(matches!(plane.kind, NodeKind::Plane { .. }));
    }

    #[test]
    fn test_plane_faces_upper_centroid() {
        let mut strategy = OcclusalPlaneStrategy::new();
        let mut scene = init_scene(&mut strategy);
        let landmarks = dentition();
        render(&mut strategy, &mut scene, &landmarks, &json!({}));

        let plane = scene.get(strategy.plane_node().unwrap()).unwrap();
        let target = OcclusalPlaneStrategy::upper_centroid(&landmarks).unwrap();
        let expected = (target - plane.translation).normalize();
        assert!((plane.rotation * Vec3::Z - expected).length() < 1e-4);
    }

    #[test]
    fn test_control_move_keeps_plane_orientation_and_moves_label() {
        let mut strategy = OcclusalPlaneStrategy::new();
        let mut scene = init_scene(&mut strategy);
        let payload = json!({"cant": 0.4});
        render(&mut strategy, &mut scene, &dentition(), &payload);

        let binding = strategy.draggable_objects()[0].clone();
        let rotation = scene.get(binding.dependents[0]).unwrap().rotation;
        let position = scene.curve(binding.curve).unwrap().evaluate(0.3);
        strategy.on_control_moved(
            &mut scene,
            &ControlMoved {
                strategy: "occlusal_plane".into(),
                node: binding.node,
                t: 0.3,
                position,
            },
        );
        assert_eq!(strategy.draggable_objects()[0].t, 0.3);
        assert_eq!(scene.get(binding.dependents[0]).unwrap().rotation, rotation);
        let label = strategy.midline.as_ref().unwrap().label.unwrap();
        let offset = crate::shared::EngineOptions::default().label_offset;
        assert_eq!(scene.get(label).unwrap().translation, position + offset);
    }

    #[test]
    fn test_rebuild_places_control_at_retained_param() {
        let mut strategy = OcclusalPlaneStrategy::new();
        let mut scene = init_scene(&mut strategy);
        let landmarks = dentition();
        render(&mut strategy, &mut scene, &landmarks, &json!({}));

        let first = strategy.draggable_objects()[0].clone();
        let position = scene.curve(first.curve).unwrap().evaluate(0.3);
        strategy.on_control_moved(
            &mut scene,
            &ControlMoved {
                strategy: "occlusal_plane".into(),
                node: first.node,
                t: 0.3,
                position,
            },
        );
        strategy.retain_control_params();
        render(&mut strategy, &mut scene, &landmarks, &json!({}));

        let binding = strategy.draggable_objects()[0].clone();
        assert_eq!(binding.t, 0.3);
        let curve = scene.curve(binding.curve).unwrap();
        let position = scene.get(binding.node).unwrap().translation;
        assert!((position - curve.evaluate(0.3)).length() < 1e-5);
        let plane = scene.get(binding.dependents[0]).unwrap();
        assert_eq!(plane.translation, position);
    }

    #[test]
    fn test_too_few_pairs_renders_nothing_but_completes() {
        let mut strategy = OcclusalPlaneStrategy::new();
        let mut scene = init_scene(&mut strategy);
        let payload = json!({"cant": 1.0});
        render(&mut strategy, &mut scene, &LandmarkStore::new(), &payload);
        assert!(strategy.lifecycle().owned().is_empty());
        assert!(strategy.draggable_objects().is_empty());
        assert_eq!(strategy.measurement_summary().row_count(), 1);
    }
}
