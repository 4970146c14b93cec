//! Analyse-Kontext: ersetzt globale Singletons durch ein explizites Objekt.
//!
//! Hält Szene, Strategy-Registry, Scene-Coupling-Controller, Landmarken und
//! Optionen. Wird einmal beim Start erstellt und an alle Aufrufer
//! weitergereicht; `reset()` räumt für Test-Teardowns vollständig ab.

use super::command_log::CommandLog;
use super::controller::SceneCouplingController;
use super::decoration::SceneHandles;
use super::events::OverlayCommand;
use super::registry::{RegistryError, StrategyRegistry};
use super::strategy::{AnalysisInput, AnalysisStrategy, ControlMoved, StrategyState};
use crate::core::{Jaw, LandmarkStore, NodeKey, SceneGraph};
use crate::shared::{EngineOptions, MeasurementSummary};
use glam::Vec3;
use serde_json::Value;

/// Extern erzeugte Kiefer-Meshes (Knochen und Kronen je Kiefer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JawMeshes {
    /// Oberkiefer-Knochen
    pub upper_bone: NodeKey,
    /// Oberkiefer-Kronen
    pub upper_crowns: NodeKey,
    /// Unterkiefer-Knochen
    pub lower_bone: NodeKey,
    /// Unterkiefer-Kronen
    pub lower_crowns: NodeKey,
}

impl JawMeshes {
    fn attach(scene: &mut SceneGraph) -> Self {
        Self {
            upper_bone: scene.attach_mesh(Jaw::Upper, "upper:bone"),
            upper_crowns: scene.attach_mesh(Jaw::Upper, "upper:crowns"),
            lower_bone: scene.attach_mesh(Jaw::Lower, "lower:bone"),
            lower_crowns: scene.attach_mesh(Jaw::Lower, "lower:crowns"),
        }
    }
}

/// Zentraler Kontext aller Analyse-Overlays.
pub struct AnalysisContext {
    scene: SceneGraph,
    registry: StrategyRegistry,
    controller: SceneCouplingController,
    landmarks: LandmarkStore,
    options: EngineOptions,
    meshes: JawMeshes,
    active_task: Option<&'static str>,
    command_log: CommandLog,
    /// Neuaufbau nach Skalierungs-/Landmarkenwechsel wartet auf das Drag-Ende
    refresh_pending: bool,
}

impl AnalysisContext {
    /// Erstellt den Kontext mit allen Standard-Strategien.
    pub fn bootstrap(options: EngineOptions) -> anyhow::Result<Self> {
        let registry = StrategyRegistry::with_default_strategies()?;
        Ok(Self::with_registry(options, registry))
    }

    /// Erstellt den Kontext mit einer vorbereiteten Registry und initialisiert jede Strategie.
    pub fn with_registry(options: EngineOptions, mut registry: StrategyRegistry) -> Self {
        let mut scene = SceneGraph::new();
        scene.set_model_scale(options.model_scale);
        let meshes = JawMeshes::attach(&mut scene);
        let handles = SceneHandles::from_scene(&scene);
        for strategy in registry.iter_mut() {
            strategy.init(handles);
        }
        log::info!("Analyse-Kontext mit {} Strategien erstellt", registry.len());
        Self {
            scene,
            registry,
            controller: SceneCouplingController::new(options.projection_settings()),
            landmarks: LandmarkStore::new(),
            options,
            meshes,
            active_task: None,
            command_log: CommandLog::new(),
            refresh_pending: false,
        }
    }

    /// Räumt alle Strategien ab und leert Registry und Controller.
    pub fn reset(&mut self) {
        for strategy in self.registry.iter_mut() {
            strategy.cleanup(&mut self.scene);
        }
        self.registry.clear();
        self.controller.reset();
        self.active_task = None;
        self.command_log.clear();
        self.refresh_pending = false;
    }

    /// Führt einen Command aus.
    pub fn handle_command(&mut self, command: OverlayCommand) -> anyhow::Result<()> {
        self.command_log.record(&command);
        if !command.is_high_frequency() {
            log::debug!("Command {}", command.name());
        }
        match command {
            OverlayCommand::ActivateAnalysis { task_id, payload } => {
                self.activate(&task_id, &payload)?
            }
            OverlayCommand::RenderAnalysis { task_id, payload } => self.render(&task_id, &payload)?,
            OverlayCommand::ToggleAnalysis { task_id, visible } => self.toggle(&task_id, visible)?,
            OverlayCommand::CleanupAnalysis { task_id } => self.cleanup(&task_id)?,
            OverlayCommand::SetJawVisible { jaw, visible } => self.set_jaw_visible(jaw, visible),
            OverlayCommand::SetModelScale { scale } => self.set_model_scale(scale),
            OverlayCommand::BeginControlDrag { node } => {
                self.drag_start(node);
            }
            OverlayCommand::UpdateControlDrag { node, world } => {
                self.drag_move(node, world);
            }
            OverlayCommand::EndControlDrag => self.drag_end(),
        }
        Ok(())
    }

    /// Ersetzt die Landmarken und rendert alle bereits gerenderten Strategien neu.
    pub fn set_landmarks(&mut self, landmarks: LandmarkStore) {
        log::info!(
            "{} Landmarken für {} Zähne geladen",
            landmarks.point_count(),
            landmarks.tooth_count()
        );
        self.landmarks = landmarks;
        self.request_refresh();
    }

    /// Schaltet die aktive Analyse um: vorherige ausblenden, neue rendern und einblenden.
    pub fn activate(&mut self, task_id: &str, payload: &Value) -> Result<(), RegistryError> {
        let task = self.registry.require_mut(task_id)?.task_id();
        if let Some(previous) = self.active_task.filter(|&p| p != task) {
            if let Some(strategy) = self.registry.get_mut(previous) {
                strategy.toggle(&mut self.scene, false);
            }
            self.controller.remove_strategy(previous);
        }
        self.render(task, payload)?;
        self.toggle(task, true)?;
        self.active_task = Some(task);
        log::info!("Analyse '{}' aktiviert", task);
        Ok(())
    }

    /// Rendert eine Strategie neu (ausgeblendet) und aktualisiert ihre Drag-Bindungen.
    pub fn render(&mut self, task_id: &str, payload: &Value) -> Result<(), RegistryError> {
        let strategy = self.registry.require_mut(task_id)?;
        let input = AnalysisInput {
            landmarks: &self.landmarks,
            payload,
            options: &self.options,
        };
        strategy.render(&mut self.scene, &input);
        Self::sync_bindings(&mut self.controller, strategy);
        Ok(())
    }

    /// Schaltet die Sichtbarkeit einer Strategie.
    pub fn toggle(&mut self, task_id: &str, visible: bool) -> Result<(), RegistryError> {
        self.registry
            .require_mut(task_id)?
            .toggle(&mut self.scene, visible);
        Ok(())
    }

    /// Gibt alle Dekorationen einer Strategie frei.
    pub fn cleanup(&mut self, task_id: &str) -> Result<(), RegistryError> {
        let strategy = self.registry.require_mut(task_id)?;
        strategy.cleanup(&mut self.scene);
        let task = strategy.task_id();
        self.controller.remove_strategy(task);
        if self.active_task == Some(task) {
            self.active_task = None;
        }
        Ok(())
    }

    /// Blendet einen Kiefer samt allen darin hängenden Dekorationen ein/aus.
    pub fn set_jaw_visible(&mut self, jaw: Jaw, visible: bool) {
        self.scene.set_jaw_visible(jaw, visible);
    }

    /// Setzt die Modellskalierung; Overlay-Dekorationen werden neu aufgebaut.
    pub fn set_model_scale(&mut self, scale: f32) {
        if !scale.is_finite() || scale <= 0.0 {
            log::warn!("Ungültige Modellskalierung {} ignoriert", scale);
            return;
        }
        self.scene.set_model_scale(scale);
        self.options.model_scale = scale;
        self.request_refresh();
    }

    /// Mess-Zusammenfassung des letzten Payloads einer Strategie.
    pub fn summary(&self, task_id: &str) -> Result<MeasurementSummary, RegistryError> {
        self.registry
            .get(task_id)
            .map(|s| s.measurement_summary())
            .ok_or_else(|| RegistryError::UnknownTask(task_id.to_string()))
    }

    /// Beginnt den Drag eines registrierten Control-Points.
    pub fn drag_start(&mut self, node: NodeKey) -> bool {
        self.controller.drag_start(node)
    }

    /// Beschränkt den Drag auf die Kurve und lässt die Strategie re-projizieren.
    pub fn drag_move(&mut self, node: NodeKey, world: Vec3) -> Option<ControlMoved> {
        let moved = self.controller.drag_move(&mut self.scene, node, world)?;
        if let Some(provider) = self
            .registry
            .get_mut(&moved.strategy)
            .and_then(|s| s.draggable_provider_mut())
        {
            provider.on_control_moved(&mut self.scene, &moved);
        }
        Some(moved)
    }

    /// Beendet den Drag; zurückgestellte Registry-Änderungen und ein
    /// zurückgestellter Neuaufbau greifen jetzt.
    pub fn drag_end(&mut self) {
        self.controller.drag_end();
        if std::mem::take(&mut self.refresh_pending) {
            log::debug!("Zurückgestellter Neuaufbau nach Drag-Ende");
            self.refresh_rendered();
        }
    }

    /// Gibt `true` zurück, solange ein Neuaufbau auf das Drag-Ende wartet.
    pub fn refresh_pending(&self) -> bool {
        self.refresh_pending
    }

    /// Control-Points, die aktuell angefasst werden können.
    pub fn draggable_targets(&self) -> Vec<NodeKey> {
        self.controller.draggable_targets(&self.scene)
    }

    /// Read-only Zugriff auf die Szene.
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Strategy-Registry.
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Scene-Coupling-Controller.
    pub fn controller(&self) -> &SceneCouplingController {
        &self.controller
    }

    /// Aktuelle Landmarken.
    pub fn landmarks(&self) -> &LandmarkStore {
        &self.landmarks
    }

    /// Aktive Engine-Optionen.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Handles der Kiefer-Meshes.
    pub fn meshes(&self) -> JawMeshes {
        self.meshes
    }

    /// Task-ID der aktiven Analyse.
    pub fn active_task(&self) -> Option<&'static str> {
        self.active_task
    }

    /// Bisher ausgeführte Commands.
    pub fn command_log(&self) -> &CommandLog {
        &self.command_log
    }

    fn sync_bindings(controller: &mut SceneCouplingController, strategy: &dyn AnalysisStrategy) {
        match strategy.draggable_provider() {
            Some(provider) => {
                let bindings = provider.draggable_objects();
                controller.replace_strategy_bindings(strategy.task_id(), bindings);
            }
            None => controller.remove_strategy(strategy.task_id()),
        }
    }

    /// Neuaufbau sofort, oder nach dem Drag-Ende, solange der gezogene
    /// Control-Point noch gebraucht wird.
    fn request_refresh(&mut self) {
        if self.controller.is_dragging() {
            self.refresh_pending = true;
        } else {
            self.refresh_rendered();
        }
    }

    /// Rendert alle gerenderten Strategien mit ihrem letzten Payload neu.
    /// Sichtbarkeit und gezogene Kurvenparameter bleiben erhalten.
    fn refresh_rendered(&mut self) {
        for strategy in self.registry.iter_mut() {
            if !matches!(strategy.lifecycle().state(), StrategyState::Rendered(_)) {
                continue;
            }
            let Some(payload) = strategy.lifecycle().last_payload().cloned() else {
                continue;
            };
            let visible = strategy.is_visible();
            if let Some(provider) = strategy.draggable_provider_mut() {
                provider.retain_control_params();
            }
            let input = AnalysisInput {
                landmarks: &self.landmarks,
                payload: &payload,
                options: &self.options,
            };
            strategy.render(&mut self.scene, &input);
            strategy.toggle(&mut self.scene, visible);
            Self::sync_bindings(&mut self.controller, &**strategy);
        }
    }
}
