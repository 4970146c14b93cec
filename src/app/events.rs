//! OverlayCommand-Enum für den Command-Datenfluss des Hosts.
//!
//! Der Host (UI-Panel, Hit-Testing, Skript) erzeugt Commands; der
//! [`AnalysisContext`](super::AnalysisContext) führt sie aus.

use crate::core::{Jaw, NodeKey};
use glam::Vec3;
use serde_json::Value;

/// Mutierende Commands auf dem Analyse-Kontext.
#[derive(Debug, Clone)]
pub enum OverlayCommand {
    /// Analyse aktivieren: vorherige ausblenden, neue rendern und einblenden
    ActivateAnalysis { task_id: String, payload: Value },
    /// Analyse rendern, ohne sie einzublenden
    RenderAnalysis { task_id: String, payload: Value },
    /// Sichtbarkeit einer gerenderten Analyse schalten
    ToggleAnalysis { task_id: String, visible: bool },
    /// Alle Dekorationen einer Analyse freigeben
    CleanupAnalysis { task_id: String },
    /// Kiefer-Teilbaum ein-/ausblenden
    SetJawVisible { jaw: Jaw, visible: bool },
    /// Gemeinsame Modellskalierung setzen
    SetModelScale { scale: f32 },
    /// Drag eines Control-Points beginnen
    BeginControlDrag { node: NodeKey },
    /// Freie Drag-Position (Weltkoordinaten) melden
    UpdateControlDrag { node: NodeKey, world: Vec3 },
    /// Drag beenden
    EndControlDrag,
}

impl OverlayCommand {
    /// Kurzer Name für Log-Ausgaben.
    pub fn name(&self) -> &'static str {
        match self {
            OverlayCommand::ActivateAnalysis { .. } => "ActivateAnalysis",
            OverlayCommand::RenderAnalysis { .. } => "RenderAnalysis",
            OverlayCommand::ToggleAnalysis { .. } => "ToggleAnalysis",
            OverlayCommand::CleanupAnalysis { .. } => "CleanupAnalysis",
            OverlayCommand::SetJawVisible { .. } => "SetJawVisible",
            OverlayCommand::SetModelScale { .. } => "SetModelScale",
            OverlayCommand::BeginControlDrag { .. } => "BeginControlDrag",
            OverlayCommand::UpdateControlDrag { .. } => "UpdateControlDrag",
            OverlayCommand::EndControlDrag => "EndControlDrag",
        }
    }

    /// Drag-Updates kommen pro Frame und werden nicht geloggt.
    pub fn is_high_frequency(&self) -> bool {
        matches!(self, OverlayCommand::UpdateControlDrag { .. })
    }
}
