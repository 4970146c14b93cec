//! Transversale Bogenbreiten: intercanin (3–3) und intermolar (6–6) je Kiefer.
//!
//! Payload: `{ "upper": {"intercanine": 34.2, "intermolar": {"value": 48.9}}, "lower": {…} }`

use super::{field, jaw_key, jaw_title, required_value};
use crate::app::decoration::{Anchor, DecorationBuilder, Placement};
use crate::app::strategy::{
    AnalysisInput, AnalysisStrategy, RenderCategory, StrategyLifecycle, StrategyRecord,
};
use crate::core::{Jaw, LandmarkKind, ToothId};
use crate::shared::summary::GroupBuilder;
use crate::shared::MeasurementSummary;
use serde_json::Value;

/// Gemessene Breite: Payload-Schlüssel, Anzeigename und Zahnpaar je Kiefer.
struct WidthMeasure {
    key: &'static str,
    title: &'static str,
    upper: (u8, u8),
    lower: (u8, u8),
}

impl WidthMeasure {
    fn teeth(&self, jaw: Jaw) -> Option<(ToothId, ToothId)> {
        let (a, b) = match jaw {
            Jaw::Upper => self.upper,
            Jaw::Lower => self.lower,
        };
        Some((ToothId::new(a)?, ToothId::new(b)?))
    }
}

const WIDTHS: [WidthMeasure; 2] = [
    WidthMeasure {
        key: "intercanine",
        title: "Intercanine width",
        upper: (13, 23),
        lower: (43, 33),
    },
    WidthMeasure {
        key: "intermolar",
        title: "Intermolar width",
        upper: (16, 26),
        lower: (46, 36),
    },
];

/// Bogenbreiten-Strategie.
pub struct ArchWidthStrategy {
    record: StrategyRecord,
    lifecycle: StrategyLifecycle,
}

impl ArchWidthStrategy {
    /// Erstellt die Strategie mit ihren festen Metadaten.
    pub fn new() -> Self {
        Self {
            record: StrategyRecord {
                id: "arch-width",
                display_name: "Arch Width",
                task_id: "arch_width",
                render_category: RenderCategory::PointsAndLines,
            },
            lifecycle: StrategyLifecycle::new(),
        }
    }

    fn is_measured(tooth: ToothId) -> bool {
        matches!(tooth.position(), 3 | 6)
    }

    fn endpoints(
        input: &AnalysisInput<'_>,
        measure: &WidthMeasure,
        jaw: Jaw,
    ) -> Option<(Anchor, Anchor)> {
        let (a, b) = measure.teeth(jaw)?;
        let a = Anchor::from_store(input.landmarks, a, LandmarkKind::Cusp)?;
        let b = Anchor::from_store(input.landmarks, b, LandmarkKind::Cusp)?;
        Some((a, b))
    }
}

impl Default for ArchWidthStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisStrategy for ArchWidthStrategy {
    crate::impl_strategy_accessors!();

    fn marker_filter(&self, tooth: ToothId, kind: LandmarkKind) -> bool {
        kind == LandmarkKind::Cusp && Self::is_measured(tooth)
    }

    fn build_geometry(&mut self, builder: &mut DecorationBuilder<'_>, input: &AnalysisInput<'_>) {
        for jaw in Jaw::ALL {
            for measure in &WIDTHS {
                match Self::endpoints(input, measure, jaw) {
                    Some((a, b)) => {
                        builder.line(a, b, &format!("{}:{}", measure.key, jaw_key(jaw)));
                    }
                    None => log::warn!(
                        "arch_width: {} ({}) nicht darstellbar, Zahn fehlt",
                        measure.key,
                        jaw_key(jaw)
                    ),
                }
            }
        }
    }

    fn build_annotations(
        &mut self,
        builder: &mut DecorationBuilder<'_>,
        input: &AnalysisInput<'_>,
    ) {
        let task = self.task_id();
        for jaw in Jaw::ALL {
            for measure in &WIDTHS {
                let path = [jaw_key(jaw), measure.key];
                let Some(value) = required_value(task, input.payload, &path) else {
                    continue;
                };
                let Some((a, b)) = Self::endpoints(input, measure, jaw) else {
                    continue;
                };
                let mid = (a.position + b.position) * 0.5;
                builder.label(
                    Placement::Jaw(jaw),
                    mid,
                    format!("{value:.1} mm"),
                    &format!("label:{}:{}", measure.key, jaw_key(jaw)),
                );
            }
        }
    }

    fn summarize(&self, payload: &Value) -> MeasurementSummary {
        let mut summary = MeasurementSummary::default();
        for jaw in Jaw::ALL {
            WIDTHS
                .iter()
                .fold(GroupBuilder::new(jaw_title(jaw, "arch")), |group, measure| {
                    let value = field(payload, &[jaw_key(jaw), measure.key]);
                    group.measurement(measure.title, value, "mm")
                })
                .push_into(&mut summary);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{dentition, init_scene, is_label, is_line, is_marker, render};
    use super::*;
    use crate::core::NodeKind;
    use serde_json::json;

    fn count(
        strategy: &ArchWidthStrategy,
        scene: &crate::core::SceneGraph,
        f: fn(&NodeKind) -> bool,
    ) -> usize {
        strategy
            .lifecycle()
            .owned()
            .iter()
            .filter(|k| f(&scene.get(**k).unwrap().kind))
            .count()
    }

    #[test]
    fn test_render_builds_cusp_markers_and_four_lines() {
        let mut strategy = ArchWidthStrategy::new();
        let mut scene = init_scene(&mut strategy);
        let payload = json!({
            "upper": {"intercanine": 34.0, "intermolar": 48.0},
            "lower": {"intercanine": 26.0}
        });
        render(&mut strategy, &mut scene, &dentition(), &payload);

        assert_eq!(count(&strategy, &scene, is_marker), 8);
        assert_eq!(count(&strategy, &scene, is_line), 4);
        assert_eq!(count(&strategy, &scene, is_label), 3);
    }

    #[test]
    fn test_lines_stay_in_jaw_subtrees() {
        let mut strategy = ArchWidthStrategy::new();
        let mut scene = init_scene(&mut strategy);
        render(&mut strategy, &mut scene, &dentition(), &json!({}));
        let overlay = scene.overlay_root();
        assert!(strategy
            .lifecycle()
            .owned()
            .iter()
            .all(|k| scene.get(*k).unwrap().parent() != Some(overlay)));
    }

    #[test]
    fn test_missing_molar_skips_only_that_line() {
        let store = dentition();
        let mut reduced = crate::core::LandmarkStore::new();
        for (tooth, _) in store.centroids() {
            if tooth.code() == 26 {
                continue;
            }
            for landmark in store.points(tooth) {
                reduced.insert(tooth, landmark.kind, landmark.position);
            }
        }
        let mut strategy = ArchWidthStrategy::new();
        let mut scene = init_scene(&mut strategy);
        render(&mut strategy, &mut scene, &reduced, &json!({}));
        assert_eq!(count(&strategy, &scene, is_line), 3);
    }

    #[test]
    fn test_summary_has_group_per_jaw() {
        let strategy = ArchWidthStrategy::new();
        let summary = strategy.summarize(&json!({
            "upper": {"intercanine": 34.0, "intermolar": {"value": 48.0, "result": "narrow"}},
            "lower": {"intermolar": 44.0}
        }));
        assert_eq!(summary.groups.len(), 2);
        assert_eq!(summary.groups[0].title, "Upper arch");
        assert_eq!(summary.groups[0].rows.len(), 2);
        assert_eq!(summary.groups[1].rows[0].name, "Intermolar width");
    }
}
