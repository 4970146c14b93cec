//! AnalysisStrategy-Trait: Schnittstelle für alle Mess-Analysen.
//!
//! Template-Method-Lifecycle:
//! `Uninitialized → Ready → Rendered(Hidden|Visible) → Disposed`.
//! Konkrete Strategien liefern nur die Hooks (`build_geometry`,
//! `build_annotations`, `summarize`); `render()`, `toggle()` und `cleanup()`
//! sind als Provided-Methods gemeinsam implementiert.

use super::decoration::{DecorationBuilder, SceneHandles};
use crate::core::{LandmarkKind, LandmarkStore, NodeKey, SceneGraph, ToothId};
use crate::shared::{EngineOptions, MeasurementSummary};
use glam::Vec3;
use serde_json::Value;

/// Welche Dekorationsarten eine Strategie erzeugt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderCategory {
    /// Nur Landmark-Marker
    Points,
    /// Nur Linien
    Lines,
    /// Marker und Linien
    PointsAndLines,
    /// Kurven mit verschiebbaren Control-Points
    CurvesAndControls,
}

impl RenderCategory {
    /// Erzeugt `render()` Landmark-Marker für diese Kategorie?
    pub fn includes_points(self) -> bool {
        matches!(
            self,
            RenderCategory::Points | RenderCategory::PointsAndLines
        )
    }
}

/// Unveränderliche Metadaten einer Strategie, beim Bootstrap erzeugt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyRecord {
    /// Interne ID
    pub id: &'static str,
    /// Anzeigename für das UI
    pub display_name: &'static str,
    /// Task-ID, unter der die Strategie registriert und geschaltet wird
    pub task_id: &'static str,
    /// Dekorationsarten
    pub render_category: RenderCategory,
}

/// Sichtbarkeit einer gerenderten Generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Alle eigenen Nodes sichtbar
    Visible,
    /// Alle eigenen Nodes ausgeblendet
    Hidden,
}

/// Lifecycle-Zustand einer Strategie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyState {
    /// Noch nicht an eine Szene gebunden
    Uninitialized,
    /// `init()` erfolgt, noch nichts gerendert
    Ready,
    /// Eine Generation existiert
    Rendered(Visibility),
    /// Endzustand nach `cleanup()`
    Disposed,
}

/// Eingaben eines `render()`-Aufrufs.
#[derive(Clone, Copy)]
pub struct AnalysisInput<'a> {
    /// Landmarken beider Kiefer
    pub landmarks: &'a LandmarkStore,
    /// Opaker Mess-Payload des Upstream-Producers
    pub payload: &'a Value,
    /// Engine-Optionen
    pub options: &'a EngineOptions,
}

/// Gemeinsamer Lifecycle-Zustand aller Strategien.
///
/// Hält die Liste der eigenen Nodes (aktuelle Generation) als explizite
/// Eigentumsbeziehung statt Namens-Präfix-Suche im Graph.
#[derive(Debug, Clone)]
pub struct StrategyLifecycle {
    state: StrategyState,
    handles: Option<SceneHandles>,
    owned: Vec<NodeKey>,
    generation: u64,
    last_payload: Option<Value>,
}

impl Default for StrategyLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyLifecycle {
    /// Erstellt einen Lifecycle im Zustand `Uninitialized`.
    pub fn new() -> Self {
        Self {
            state: StrategyState::Uninitialized,
            handles: None,
            owned: Vec::new(),
            generation: 0,
            last_payload: None,
        }
    }

    /// Aktueller Zustand.
    pub fn state(&self) -> StrategyState {
        self.state
    }

    /// Gebundene Szenen-Handles (nach `init()`).
    pub fn handles(&self) -> Option<SceneHandles> {
        self.handles
    }

    /// Nodes der aktuellen Generation.
    pub fn owned(&self) -> &[NodeKey] {
        &self.owned
    }

    /// Anzahl bisheriger `render()`-Generationen.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Payload des letzten `render()`.
    pub fn last_payload(&self) -> Option<&Value> {
        self.last_payload.as_ref()
    }

    /// Gibt die aktuelle Generation vollständig frei. Leere Generation → No-op.
    fn dispose_generation(&mut self, scene: &mut SceneGraph) -> usize {
        let removed: usize = self.owned.drain(..).map(|key| scene.dispose(key)).sum();
        if removed > 0 {
            log::debug!("{} Nodes der vorherigen Generation freigegeben", removed);
        }
        removed
    }

    fn apply_visibility(&self, scene: &mut SceneGraph, visible: bool) {
        for &key in &self.owned {
            scene.set_visible(key, visible);
        }
    }
}

/// Ein verschiebbarer Control-Point, wie ihn eine Strategie anbietet.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlBinding {
    /// Control-Point-Node
    pub node: NodeKey,
    /// Kurven-Node, an den der Punkt gebunden ist
    pub curve: NodeKey,
    /// Aktueller Kurvenparameter
    pub t: f32,
    /// Abhängige Nodes (z.B. Ebenen), die nur mitverschoben werden
    pub dependents: Vec<NodeKey>,
}

/// Meldung des Controllers nach einem eingeschränkten Drag-Schritt.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlMoved {
    /// Task-ID der besitzenden Strategie
    pub strategy: String,
    /// Verschobener Control-Point
    pub node: NodeKey,
    /// Neuer Kurvenparameter
    pub t: f32,
    /// Neue lokale Position des Control-Points
    pub position: Vec3,
}

/// Optionale Fähigkeit: Strategie bietet verschiebbare Control-Points an.
pub trait DraggableProvider {
    /// Aktuelle Control-Points der Generation.
    fn draggable_objects(&self) -> Vec<ControlBinding>;

    /// Re-Projektion abhängiger Dekorationen nach einem Drag-Schritt.
    fn on_control_moved(&mut self, scene: &mut SceneGraph, moved: &ControlMoved);

    /// Merkt sich die aktuellen Kurvenparameter der Generation. Der nächste
    /// `render()` setzt die Control-Points wieder an diese Stellen statt an
    /// die konfigurierten Startwerte.
    fn retain_control_params(&mut self);
}

/// Schnittstelle für alle Analyse-Strategien (Bolton, Overbite, Bogenform, …).
pub trait AnalysisStrategy {
    /// Unveränderliche Metadaten.
    fn record(&self) -> &StrategyRecord;

    /// Gemeinsamer Lifecycle-Zustand.
    fn lifecycle(&self) -> &StrategyLifecycle;

    /// Mutabler Lifecycle-Zustand.
    fn lifecycle_mut(&mut self) -> &mut StrategyLifecycle;

    /// Welche Landmarken in Schritt 2 als Marker dargestellt werden.
    fn marker_filter(&self, _tooth: ToothId, _kind: LandmarkKind) -> bool {
        true
    }

    /// Hook: Kurven, Linien und Ebenen aufbauen.
    fn build_geometry(&mut self, builder: &mut DecorationBuilder<'_>, input: &AnalysisInput<'_>);

    /// Hook: Zahlen-/Text-Annotationen aufbauen.
    fn build_annotations(
        &mut self,
        _builder: &mut DecorationBuilder<'_>,
        _input: &AnalysisInput<'_>,
    ) {
    }

    /// Hook: Strategie-eigene Handles der alten Generation verwerfen.
    fn forget_generation(&mut self) {}

    /// Hook: Payload in gruppierte Anzeigezeilen übersetzen (rein).
    fn summarize(&self, payload: &Value) -> MeasurementSummary;

    /// Fähigkeits-Abfrage für verschiebbare Objekte.
    fn draggable_provider(&self) -> Option<&dyn DraggableProvider> {
        None
    }

    /// Mutable Fähigkeits-Abfrage für Re-Projektion während eines Drags.
    fn draggable_provider_mut(&mut self) -> Option<&mut dyn DraggableProvider> {
        None
    }

    /// Task-ID (Kurzform für `record().task_id`).
    fn task_id(&self) -> &'static str {
        self.record().task_id
    }

    /// Bindet die Szenen-Handles. Darf genau einmal aufgerufen werden.
    fn init(&mut self, handles: SceneHandles) {
        let task = self.task_id();
        let lifecycle = self.lifecycle_mut();
        if lifecycle.state != StrategyState::Uninitialized {
            log::error!("Strategie '{}' wurde bereits initialisiert", task);
            return;
        }
        lifecycle.handles = Some(handles);
        lifecycle.state = StrategyState::Ready;
        log::debug!("Strategie '{}' initialisiert", task);
    }

    /// Verwirft die vorige Generation und baut eine neue auf (danach ausgeblendet).
    ///
    /// Fehlende oder fehlerhafte Payload-Felder lassen nur den betroffenen
    /// Schritt entfallen; `render()` läuft immer bis zum Ende durch.
    fn render(&mut self, scene: &mut SceneGraph, input: &AnalysisInput<'_>) {
        let task = self.task_id();
        let (state, handles) = {
            let lc = self.lifecycle();
            (lc.state, lc.handles)
        };
        let Some(handles) = handles else {
            log::warn!("render() für '{}' vor init() ignoriert", task);
            return;
        };
        if state == StrategyState::Disposed {
            log::warn!(
                "render() für bereits freigegebene Strategie '{}' ignoriert",
                task
            );
            return;
        }

        // (1) vorherige Generation vollständig freigeben
        self.lifecycle_mut().dispose_generation(scene);
        self.forget_generation();

        let mut builder = DecorationBuilder::new(scene, handles, task, input.options);

        // (2) Landmark-Marker
        if self.record().render_category.includes_points() {
            let filter = |tooth, kind| self.marker_filter(tooth, kind);
            let count = builder.landmark_markers(input.landmarks, filter);
            if count == 0 {
                log::warn!("'{}': keine Landmarken für Marker vorhanden", task);
            }
        }

        // (3) Kurven, Linien, Ebenen
        self.build_geometry(&mut builder, input);

        // (4) Annotationen
        self.build_annotations(&mut builder, input);

        let created = builder.finish();
        let lifecycle = self.lifecycle_mut();
        lifecycle.owned = created;
        lifecycle.generation += 1;
        lifecycle.last_payload = Some(input.payload.clone());
        lifecycle.state = StrategyState::Rendered(Visibility::Hidden);
        lifecycle.apply_visibility(scene, false);

        log::debug!(
            "'{}' gerendert: Generation {}, {} Nodes",
            task,
            lifecycle.generation,
            lifecycle.owned.len()
        );
    }

    /// Schaltet die Sichtbarkeit aller eigenen Nodes. Vor `render()` ein No-op.
    fn toggle(&mut self, scene: &mut SceneGraph, visible: bool) {
        let lifecycle = self.lifecycle_mut();
        if !matches!(lifecycle.state, StrategyState::Rendered(_)) {
            return;
        }
        lifecycle.apply_visibility(scene, visible);
        lifecycle.state = StrategyState::Rendered(if visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        });
    }

    /// Gibt alle eigenen Nodes frei. Idempotent; Endzustand `Disposed`.
    fn cleanup(&mut self, scene: &mut SceneGraph) {
        let lifecycle = self.lifecycle_mut();
        lifecycle.dispose_generation(scene);
        lifecycle.last_payload = None;
        lifecycle.state = StrategyState::Disposed;
        self.forget_generation();
    }

    /// Gruppierte Zusammenfassung des letzten Payloads (leer ohne `render()`).
    fn measurement_summary(&self) -> MeasurementSummary {
        self.lifecycle()
            .last_payload()
            .map(|payload| self.summarize(payload))
            .unwrap_or_default()
    }

    /// Ist die aktuelle Generation eingeblendet?
    fn is_visible(&self) -> bool {
        self.lifecycle().state == StrategyState::Rendered(Visibility::Visible)
    }
}

/// Macro für die drei identischen Accessor-Methoden aller Strategien.
///
/// Erwartet, dass der Typ `self.record` (StrategyRecord) und
/// `self.lifecycle` (StrategyLifecycle) hat.
///
/// Wird innerhalb eines `impl AnalysisStrategy for X { ... }`-Blocks aufgerufen.
#[macro_export]
macro_rules! impl_strategy_accessors {
    () => {
        fn record(&self) -> &$crate::app::strategy::StrategyRecord {
            &self.record
        }

        fn lifecycle(&self) -> &$crate::app::strategy::StrategyLifecycle {
            &self.lifecycle
        }

        fn lifecycle_mut(&mut self) -> &mut $crate::app::strategy::StrategyLifecycle {
            &mut self.lifecycle
        }
    };
}
