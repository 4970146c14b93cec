//! Scene-Coupling-Controller: Registry aller verschiebbaren Nodes und Drag-Loop.
//!
//! Die Bindungen liegen in einer Seitentabelle `NodeKey → {Strategie, Kurve, t,
//! abhängige Nodes}`. Strukturelle Änderungen (Strategie wechselt, Generation
//! verworfen) werden während eines aktiven Drags zurückgestellt und beim
//! Drag-Ende nachgeholt.

use super::strategy::{ControlBinding, ControlMoved};
use crate::core::{NodeKey, SceneGraph};
use crate::curve::{project_point, ProjectionSettings};
use glam::Vec3;
use indexmap::IndexMap;

/// Drag-Metadaten eines Control-Points.
#[derive(Debug, Clone, PartialEq)]
pub struct DragBinding {
    /// Task-ID der besitzenden Strategie
    pub strategy: String,
    /// Kurven-Node, auf den der Punkt beschränkt ist
    pub curve: NodeKey,
    /// Aktueller Kurvenparameter
    pub t: f32,
    /// Nur verschobene (nie neu ausgerichtete) abhängige Nodes
    pub dependents: Vec<NodeKey>,
}

/// Zurückgestellte Strukturänderung.
#[derive(Debug, Clone)]
enum PendingEdit {
    Replace {
        strategy: String,
        bindings: Vec<ControlBinding>,
    },
    Remove(String),
}

/// Hält die Draggable-Registry und den Orbit-Zustand der Kamera.
#[derive(Debug, Clone)]
pub struct SceneCouplingController {
    bindings: IndexMap<NodeKey, DragBinding>,
    pending: Vec<PendingEdit>,
    active_drag: Option<NodeKey>,
    orbit_enabled: bool,
    settings: ProjectionSettings,
}

impl Default for SceneCouplingController {
    fn default() -> Self {
        Self::new(ProjectionSettings::default())
    }
}

impl SceneCouplingController {
    /// Erstellt einen leeren Controller.
    pub fn new(settings: ProjectionSettings) -> Self {
        Self {
            bindings: IndexMap::new(),
            pending: Vec::new(),
            active_drag: None,
            orbit_enabled: true,
            settings,
        }
    }

    /// Ersetzt alle Bindungen einer Strategie (während eines Drags zurückgestellt).
    pub fn replace_strategy_bindings(&mut self, strategy: &str, bindings: Vec<ControlBinding>) {
        let edit = PendingEdit::Replace {
            strategy: strategy.to_string(),
            bindings,
        };
        self.submit(edit);
    }

    /// Entfernt alle Bindungen einer Strategie (während eines Drags zurückgestellt).
    pub fn remove_strategy(&mut self, strategy: &str) {
        self.submit(PendingEdit::Remove(strategy.to_string()));
    }

    fn submit(&mut self, edit: PendingEdit) {
        if self.active_drag.is_some() {
            log::debug!("Draggable-Registry-Änderung bis Drag-Ende zurückgestellt");
            self.pending.push(edit);
        } else {
            self.apply(edit);
        }
    }

    fn apply(&mut self, edit: PendingEdit) {
        match edit {
            PendingEdit::Replace { strategy, bindings } => {
                self.bindings.retain(|_, b| b.strategy != strategy);
                for binding in bindings {
                    self.bindings.insert(
                        binding.node,
                        DragBinding {
                            strategy: strategy.clone(),
                            curve: binding.curve,
                            t: binding.t,
                            dependents: binding.dependents,
                        },
                    );
                }
            }
            PendingEdit::Remove(strategy) => {
                self.bindings.retain(|_, b| b.strategy != strategy);
            }
        }
    }

    /// Anzahl noch nicht angewendeter Strukturänderungen.
    pub fn pending_edits(&self) -> usize {
        self.pending.len()
    }

    /// Bindung eines Control-Points.
    pub fn binding(&self, node: NodeKey) -> Option<&DragBinding> {
        self.bindings.get(&node)
    }

    /// Alle registrierten Control-Points in Registrierungsreihenfolge.
    pub fn draggable_nodes(&self) -> Vec<NodeKey> {
        self.bindings.keys().copied().collect()
    }

    /// Control-Points, die aktuell für Hit-Testing angeboten werden (effektiv sichtbar).
    pub fn draggable_targets(&self, scene: &SceneGraph) -> Vec<NodeKey> {
        self.bindings
            .keys()
            .copied()
            .filter(|&key| scene.is_effectively_visible(key))
            .collect()
    }

    /// Beginnt einen Drag; deaktiviert die Kamera-Orbit-Interaktion.
    pub fn drag_start(&mut self, node: NodeKey) -> bool {
        if self.active_drag.is_some() {
            log::warn!("drag_start während laufendem Drag ignoriert");
            return false;
        }
        if !self.bindings.contains_key(&node) {
            return false;
        }
        self.active_drag = Some(node);
        self.orbit_enabled = false;
        true
    }

    /// Beschränkt eine freie Drag-Position auf die gebundene Kurve.
    ///
    /// Setzt den Control-Point auf den projizierten Punkt, speichert das neue
    /// `t` und verschiebt alle abhängigen Nodes auf dieselbe Weltposition.
    pub fn drag_move(
        &mut self,
        scene: &mut SceneGraph,
        node: NodeKey,
        world: Vec3,
    ) -> Option<ControlMoved> {
        if self.active_drag != Some(node) {
            return None;
        }
        let binding = self.bindings.get_mut(&node)?;
        let Some(curve) = scene.curve(binding.curve) else {
            log::warn!("Kurve des Control-Points existiert nicht mehr");
            return None;
        };
        let local = scene.world_to_local(binding.curve, world);
        let projection = project_point(curve, local, &self.settings)?;

        let snapped_world = scene.local_to_world(binding.curve, projection.position);
        let parent = scene.get(node)?.parent()?;
        let position = scene.world_to_local(parent, snapped_world);
        scene.set_translation(node, position);
        binding.t = projection.t;

        for &dependent in &binding.dependents {
            let Some(dep_parent) = scene.get(dependent).and_then(|n| n.parent()) else {
                continue;
            };
            let translation = scene.world_to_local(dep_parent, snapped_world);
            scene.set_translation(dependent, translation);
        }

        Some(ControlMoved {
            strategy: binding.strategy.clone(),
            node,
            t: projection.t,
            position,
        })
    }

    /// Beendet den Drag, aktiviert den Orbit wieder und wendet zurückgestellte Änderungen an.
    pub fn drag_end(&mut self) {
        if self.active_drag.take().is_none() {
            return;
        }
        self.orbit_enabled = true;
        let pending = std::mem::take(&mut self.pending);
        if !pending.is_empty() {
            log::debug!(
                "{} zurückgestellte Registry-Änderungen angewendet",
                pending.len()
            );
        }
        for edit in pending {
            self.apply(edit);
        }
    }

    /// Gibt `true` zurück, solange ein Drag aktiv ist.
    pub fn is_dragging(&self) -> bool {
        self.active_drag.is_some()
    }

    /// Aktuell gezogener Control-Point.
    pub fn active_drag(&self) -> Option<NodeKey> {
        self.active_drag
    }

    /// Darf die Kamera orbitieren?
    pub fn orbit_enabled(&self) -> bool {
        self.orbit_enabled
    }

    /// Projektions-Parameter.
    pub fn settings(&self) -> ProjectionSettings {
        self.settings
    }

    /// Setzt den Controller zurück (Test-Teardown, Szenenwechsel).
    pub fn reset(&mut self) {
        self.bindings.clear();
        self.pending.clear();
        self.active_drag = None;
        self.orbit_enabled = true;
    }
}
