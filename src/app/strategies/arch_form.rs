//! Bogenform: Einzelkiefer-Führungskurven mit verschiebbaren Control-Points.
//!
//! Pro Kiefer wird eine Kurve durch die Zahn-Schwerpunkte gelegt. Die
//! Control-Points sitzen auf der Kurve; die Strecke zwischen erstem und letztem
//! Control-Point samt Abstands-Label folgt jedem Drag-Schritt.
//!
//! Payload pro Kiefer: `{"arch_length": 78.1, "available_space": 74.0, "crowding": {…}}`
//! unter den Schlüsseln `upper` und `lower`.

use super::{field, jaw_key, jaw_title, required_value};
use crate::app::decoration::{DecorationBuilder, Placement};
use crate::app::strategy::{
    AnalysisInput, AnalysisStrategy, ControlBinding, ControlMoved, DraggableProvider,
    RenderCategory, StrategyLifecycle, StrategyRecord,
};
use crate::core::{Jaw, NodeKey, SceneGraph};
use crate::curve::{CurveMode, GuideCurve, GuideCurveBuilder};
use crate::shared::summary::GroupBuilder;
use crate::shared::MeasurementSummary;
use glam::Vec3;
use indexmap::IndexMap;
use serde_json::Value;

/// Ein Control-Point auf einer Bogenkurve.
#[derive(Debug, Clone, Copy)]
struct Control {
    node: NodeKey,
    /// Index in `control_point_params`
    slot: usize,
    t: f32,
}

/// Nodes einer Bogenkurve der aktuellen Generation.
#[derive(Debug, Clone)]
struct ArchHandles {
    jaw: Jaw,
    curve_node: NodeKey,
    curve: GuideCurve,
    controls: Vec<Control>,
    span_line: Option<NodeKey>,
    span_label: Option<NodeKey>,
    label_offset: Vec3,
}

impl ArchHandles {
    /// Endpunkte der Strecke zwischen erstem und letztem Control-Point.
    fn span(&self) -> Option<(Vec3, Vec3)> {
        match self.controls.as_slice() {
            [first, .., last] => Some((self.curve.evaluate(first.t), self.curve.evaluate(last.t))),
            _ => None,
        }
    }
}

fn span_text(a: Vec3, b: Vec3) -> String {
    format!("{:.1} mm", a.distance(b))
}

/// Bogenform-Strategie.
pub struct ArchFormStrategy {
    record: StrategyRecord,
    lifecycle: StrategyLifecycle,
    arches: Vec<ArchHandles>,
    /// Kurvenparameter für den nächsten Neuaufbau, je `(Kiefer, Slot)`
    retained: IndexMap<(Jaw, usize), f32>,
}

impl ArchFormStrategy {
    /// Erstellt die Strategie mit ihren festen Metadaten.
    pub fn new() -> Self {
        Self {
            record: StrategyRecord {
                id: "arch-form",
                display_name: "Arch Form",
                task_id: "arch_form",
                render_category: RenderCategory::CurvesAndControls,
            },
            lifecycle: StrategyLifecycle::new(),
            arches: Vec::new(),
            retained: IndexMap::new(),
        }
    }

    /// Kurve eines Kiefers der aktuellen Generation.
    pub fn arch_curve(&self, jaw: Jaw) -> Option<&GuideCurve> {
        self.arches.iter().find(|a| a.jaw == jaw).map(|a| &a.curve)
    }
}

impl Default for ArchFormStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisStrategy for ArchFormStrategy {
    crate::impl_strategy_accessors!();

    fn build_geometry(&mut self, builder: &mut DecorationBuilder<'_>, input: &AnalysisInput<'_>) {
        let curve_builder = GuideCurveBuilder::new(input.options.arch_curve_parameterization);
        let retained = std::mem::take(&mut self.retained);
        for jaw in Jaw::ALL {
            let built = curve_builder.build_from_store(input.landmarks, CurveMode::SingleJaw(jaw));
            let curve = match built {
                Ok(curve) => curve,
                Err(e) => {
                    log::warn!("arch_form: keine Bogenkurve für {} ({})", jaw_key(jaw), e);
                    continue;
                }
            };
            let curve_node = builder.curve(
                curve.clone(),
                jaw,
                Placement::Jaw(jaw),
                &format!("curve:{}", jaw_key(jaw)),
            );
            let mut controls = Vec::new();
            for (i, &t) in input.options.control_point_params.iter().enumerate() {
                if !t.is_finite() {
                    log::warn!("arch_form: ungültiger Control-Point-Parameter {}", t);
                    continue;
                }
                let t = retained.get(&(jaw, i)).copied().unwrap_or(t);
                let t = t.clamp(0.0, 1.0);
                let name = format!("control:{}:{}", jaw_key(jaw), i);
                if let Some(node) = builder.control_point(curve_node, t, &name) {
                    controls.push(Control { node, slot: i, t });
                }
            }
            self.arches.push(ArchHandles {
                jaw,
                curve_node,
                curve,
                controls,
                span_line: None,
                span_label: None,
                label_offset: builder.options().label_offset,
            });
        }
    }

    fn build_annotations(
        &mut self,
        builder: &mut DecorationBuilder<'_>,
        input: &AnalysisInput<'_>,
    ) {
        let task = self.task_id();
        for arch in &mut self.arches {
            let placement = Placement::Jaw(arch.jaw);
            let key = jaw_key(arch.jaw);
            if let Some((a, b)) = arch.span() {
                arch.span_line = Some(builder.line_in(placement, a, b, &format!("span:{key}")));
                arch.span_label = Some(builder.label(
                    placement,
                    (a + b) * 0.5,
                    span_text(a, b),
                    &format!("label:span:{key}"),
                ));
            }
            if let Some(length) = required_value(task, input.payload, &[key, "arch_length"]) {
                builder.label(
                    placement,
                    arch.curve.evaluate(0.5),
                    format!("{length:.1} mm"),
                    &format!("label:arch_length:{key}"),
                );
            }
        }
    }

    fn forget_generation(&mut self) {
        self.arches.clear();
    }

    fn summarize(&self, payload: &Value) -> MeasurementSummary {
        let mut summary = MeasurementSummary::default();
        for jaw in Jaw::ALL {
            let key = jaw_key(jaw);
            GroupBuilder::new(jaw_title(jaw, "arch form"))
                .measurement("Arch length", field(payload, &[key, "arch_length"]), "mm")
                .measurement(
                    "Available space",
                    field(payload, &[key, "available_space"]),
                    "mm",
                )
                .measurement("Crowding", field(payload, &[key, "crowding"]), "mm")
                .push_into(&mut summary);
        }
        summary
    }

    fn draggable_provider(&self) -> Option<&dyn DraggableProvider> {
        Some(self)
    }

    fn draggable_provider_mut(&mut self) -> Option<&mut dyn DraggableProvider> {
        Some(self)
    }
}

impl DraggableProvider for ArchFormStrategy {
    fn draggable_objects(&self) -> Vec<ControlBinding> {
        self.arches
            .iter()
            .flat_map(|arch| {
                arch.controls.iter().map(|c| ControlBinding {
                    node: c.node,
                    curve: arch.curve_node,
                    t: c.t,
                    dependents: Vec::new(),
                })
            })
            .collect()
    }

    fn on_control_moved(&mut self, scene: &mut SceneGraph, moved: &ControlMoved) {
        let Some(arch) = self
            .arches
            .iter_mut()
            .find(|a| a.controls.iter().any(|c| c.node == moved.node))
        else {
            log::debug!(
                "arch_form: Control-Point {:?} gehört zu keiner Kurve",
                moved.node
            );
            return;
        };
        if let Some(control) = arch.controls.iter_mut().find(|c| c.node == moved.node) {
            control.t = moved.t;
        }
        let Some((a, b)) = arch.span() else {
            return;
        };
        if let Some(line) = arch.span_line {
            scene.set_line_endpoints(line, a, b);
        }
        if let Some(label) = arch.span_label {
            scene.set_translation(label, (a + b) * 0.5 + arch.label_offset);
            scene.set_label_text(label, span_text(a, b));
        }
    }

    fn retain_control_params(&mut self) {
        self.retained.clear();
        for arch in &self.arches {
            for control in &arch.controls {
                self.retained.insert((arch.jaw, control.slot), control.t);
            }
        }
    }
}
