//! Bolton-Analyse: mesiodistale Zahnbreiten und Breitenverhältnis.
//!
//! Payload:
//! ```json
//! { "anterior": { "ratio": {"value": 77.2, "result": "normal"},
//!                 "upper_sum": 47.1, "lower_sum": 36.4, "discrepancy": {"value": 0.3} },
//!   "overall":  { … gleiche Felder … } }
//! ```

use super::{field, required_value};
use crate::app::decoration::{Anchor, DecorationBuilder, Placement};
use crate::app::strategy::{
    AnalysisInput, AnalysisStrategy, RenderCategory, StrategyLifecycle, StrategyRecord,
};
use crate::core::{Jaw, LandmarkKind, ToothId};
use crate::shared::summary::GroupBuilder;
use crate::shared::MeasurementSummary;
use serde_json::Value;

/// Höchste Zahnposition der Gesamtanalyse (bis einschließlich 1. Molar).
const OVERALL_MAX_POSITION: u8 = 6;

/// Bolton-Strategie.
pub struct BoltonStrategy {
    record: StrategyRecord,
    lifecycle: StrategyLifecycle,
}

impl BoltonStrategy {
    /// Erstellt die Strategie mit ihren festen Metadaten.
    pub fn new() -> Self {
        Self {
            record: StrategyRecord {
                id: "bolton-analysis",
                display_name: "Bolton Analysis",
                task_id: "bolton",
                render_category: RenderCategory::Points,
            },
            lifecycle: StrategyLifecycle::new(),
        }
    }

    fn is_measured(tooth: ToothId) -> bool {
        tooth.position() <= OVERALL_MAX_POSITION
    }

    /// Mittelpunkt der zentralen Schneidezähne eines Kiefers (Modellkoordinaten).
    fn incisor_anchor(input: &AnalysisInput<'_>, jaw: Jaw) -> Option<Anchor> {
        let (right, left) = match jaw {
            Jaw::Upper => (11, 21),
            Jaw::Lower => (41, 31),
        };
        let points: Vec<_> = [right, left]
            .into_iter()
            .filter_map(ToothId::new)
            .filter_map(|t| input.landmarks.centroid(t))
            .collect();
        if points.is_empty() {
            return None;
        }
        let sum: glam::Vec3 = points.iter().copied().sum();
        Some(Anchor {
            jaw,
            position: sum / points.len() as f32,
        })
    }
}

impl Default for BoltonStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisStrategy for BoltonStrategy {
    crate::impl_strategy_accessors!();

    fn marker_filter(&self, tooth: ToothId, kind: LandmarkKind) -> bool {
        Self::is_measured(tooth) && matches!(kind, LandmarkKind::Mesial | LandmarkKind::Distal)
    }

    fn build_geometry(&mut self, builder: &mut DecorationBuilder<'_>, input: &AnalysisInput<'_>) {
        let mut lines = 0;
        for (tooth, _) in input.landmarks.centroids() {
            if !Self::is_measured(tooth) {
                continue;
            }
            let mesial = input.landmarks.find(tooth, LandmarkKind::Mesial);
            let distal = input.landmarks.find(tooth, LandmarkKind::Distal);
            let (Some(mesial), Some(distal)) = (mesial, distal) else {
                log::debug!("bolton: Zahn {} ohne Mesial/Distal-Paar", tooth);
                continue;
            };
            let jaw = tooth.jaw();
            builder.line(
                Anchor {
                    jaw,
                    position: mesial,
                },
                Anchor {
                    jaw,
                    position: distal,
                },
                &format!("width:{tooth}"),
            );
            lines += 1;
        }
        if lines == 0 {
            log::warn!("bolton: keine Zahnbreiten darstellbar");
        }
    }

    fn build_annotations(
        &mut self,
        builder: &mut DecorationBuilder<'_>,
        input: &AnalysisInput<'_>,
    ) {
        let task = self.task_id();
        for (section, jaw, title) in [
            ("anterior", Jaw::Upper, "Anterior"),
            ("overall", Jaw::Lower, "Overall"),
        ] {
            let Some(ratio) = required_value(task, input.payload, &[section, "ratio"]) else {
                continue;
            };
            let Some(anchor) = Self::incisor_anchor(input, jaw) else {
                log::warn!("bolton: keine Schneidezähne für Label '{}'", section);
                continue;
            };
            builder.label(
                Placement::Jaw(jaw),
                anchor.position,
                format!("{title} {ratio:.1}%"),
                &format!("label:{section}"),
            );
        }
    }

    fn summarize(&self, payload: &Value) -> MeasurementSummary {
        let mut summary = MeasurementSummary::default();
        for (section, title) in [("anterior", "Anterior"), ("overall", "Overall")] {
            GroupBuilder::new(title)
                .measurement("Ratio", field(payload, &[section, "ratio"]), "%")
                .measurement("Upper sum", field(payload, &[section, "upper_sum"]), "mm")
                .measurement("Lower sum", field(payload, &[section, "lower_sum"]), "mm")
                .measurement(
                    "Discrepancy",
                    field(payload, &[section, "discrepancy"]),
                    "mm",
                )
                .push_into(&mut summary);
        }
        summary
    }
}
