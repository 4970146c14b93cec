//! Decoration-Builder: erzeugt Szenen-Nodes für eine Strategie-Generation.
//!
//! Erzwingt die Eigentumsregel des Szenengraphs: Dekorationen innerhalb eines
//! Kiefers hängen unter dessen Teilbaum, kieferübergreifende unter dem
//! Overlay-Root. Jeder erzeugte Node wird gesammelt und nach `render()` der
//! Strategie als neue Generation übergeben.

use crate::core::{Jaw, LandmarkKind, LandmarkStore, NodeKey, NodeKind, SceneGraph, ToothId};
use crate::curve::GuideCurve;
use crate::shared::EngineOptions;
use glam::{Quat, Vec3};

/// Handles der festen Szenen-Teilbäume, beim `init()` einer Strategie gebunden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneHandles {
    /// Oberkiefer-Teilbaum
    pub upper: NodeKey,
    /// Unterkiefer-Teilbaum
    pub lower: NodeKey,
    /// Overlay-Root
    pub overlay: NodeKey,
}

impl SceneHandles {
    /// Liest die Handles aus einer Szene.
    pub fn from_scene(scene: &SceneGraph) -> Self {
        Self {
            upper: scene.jaw_root(Jaw::Upper),
            lower: scene.jaw_root(Jaw::Lower),
            overlay: scene.overlay_root(),
        }
    }

    /// Teilbaum eines Kiefers.
    pub fn jaw(&self, jaw: Jaw) -> NodeKey {
        match jaw {
            Jaw::Upper => self.upper,
            Jaw::Lower => self.lower,
        }
    }
}

/// Ein Punkt im Modellkoordinatensystem eines Kiefers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    /// Kiefer, in dessen Koordinaten `position` liegt
    pub jaw: Jaw,
    /// Modellposition
    pub position: Vec3,
}

impl Anchor {
    /// Landmarke eines Typs (Fallback: Zahn-Schwerpunkt) als Anker.
    pub fn from_store(store: &LandmarkStore, tooth: ToothId, kind: LandmarkKind) -> Option<Self> {
        store.find_or_centroid(tooth, kind).map(|position| Self {
            jaw: tooth.jaw(),
            position,
        })
    }
}

/// Ziel-Teilbaum einer Dekoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Unter dem Teilbaum eines Kiefers (erbt Sichtbarkeit und Skalierung)
    Jaw(Jaw),
    /// Unter dem Overlay-Root (Weltkoordinaten)
    Overlay,
}

impl Placement {
    /// Placement für ein Ankerpaar: gleicher Kiefer → dessen Teilbaum, sonst Overlay.
    pub fn for_pair(a: Jaw, b: Jaw) -> Self {
        if a == b {
            Placement::Jaw(a)
        } else {
            Placement::Overlay
        }
    }
}

/// Sammelt alle Nodes einer Render-Generation.
pub struct DecorationBuilder<'a> {
    scene: &'a mut SceneGraph,
    handles: SceneHandles,
    owner: &'a str,
    options: &'a EngineOptions,
    created: Vec<NodeKey>,
}

impl<'a> DecorationBuilder<'a> {
    /// Erstellt einen Builder für die Strategie mit Task-ID `owner`.
    pub fn new(
        scene: &'a mut SceneGraph,
        handles: SceneHandles,
        owner: &'a str,
        options: &'a EngineOptions,
    ) -> Self {
        Self {
            scene,
            handles,
            owner,
            options,
            created: Vec::new(),
        }
    }

    /// Read-only Zugriff auf die Szene (z.B. für Kurven-Lookups).
    pub fn scene(&self) -> &SceneGraph {
        self.scene
    }

    /// Aktive Engine-Optionen.
    pub fn options(&self) -> &EngineOptions {
        self.options
    }

    /// Bisher in dieser Generation erzeugte Nodes.
    pub fn created(&self) -> &[NodeKey] {
        &self.created
    }

    /// Beendet die Generation und gibt alle erzeugten Nodes zurück.
    pub fn finish(self) -> Vec<NodeKey> {
        self.created
    }

    fn parent_of(&self, placement: Placement) -> NodeKey {
        match placement {
            Placement::Jaw(jaw) => self.handles.jaw(jaw),
            Placement::Overlay => self.handles.overlay,
        }
    }

    /// Rechnet einen Anker in das Koordinatensystem des Placements um.
    pub fn resolve(&self, anchor: Anchor, placement: Placement) -> Vec3 {
        match placement {
            Placement::Jaw(jaw) if jaw == anchor.jaw => anchor.position,
            Placement::Jaw(jaw) => {
                let source = self.handles.jaw(anchor.jaw);
                let world = self.scene.local_to_world(source, anchor.position);
                self.scene.world_to_local(self.handles.jaw(jaw), world)
            }
            Placement::Overlay => {
                let source = self.handles.jaw(anchor.jaw);
                self.scene.local_to_world(source, anchor.position)
            }
        }
    }

    fn insert(
        &mut self,
        parent: NodeKey,
        name: &str,
        kind: NodeKind,
        translation: Vec3,
    ) -> NodeKey {
        let name = format!("{}:{}", self.owner, name);
        let key = self.scene.add_node(parent, name, kind, translation);
        self.created.push(key);
        key
    }

    /// Kugel-Marker an einer Landmarke (immer im Kiefer-Teilbaum).
    pub fn marker(&mut self, anchor: Anchor, name: &str) -> NodeKey {
        let parent = self.handles.jaw(anchor.jaw);
        let radius = self.options.marker_radius;
        self.insert(parent, name, NodeKind::Marker { radius }, anchor.position)
    }

    /// Marker für alle Landmarken, die `filter` erfüllen.
    pub fn landmark_markers(
        &mut self,
        store: &LandmarkStore,
        filter: impl Fn(ToothId, LandmarkKind) -> bool,
    ) -> usize {
        let mut count = 0;
        for jaw in Jaw::ALL {
            let points: Vec<_> = store
                .jaw_landmarks(jaw)
                .filter(|l| filter(l.tooth, l.kind))
                .map(|l| (l.tooth, l.position))
                .collect();
            for (tooth, position) in points {
                self.marker(Anchor { jaw, position }, &format!("marker:{tooth}"));
                count += 1;
            }
        }
        count
    }

    /// Strecke zwischen zwei Ankern; Placement nach Eigentumsregel.
    pub fn line(&mut self, a: Anchor, b: Anchor, name: &str) -> (NodeKey, Placement) {
        let placement = Placement::for_pair(a.jaw, b.jaw);
        let start = self.resolve(a, placement);
        let end = self.resolve(b, placement);
        let parent = self.parent_of(placement);
        let key = self.insert(parent, name, NodeKind::Line { start, end }, Vec3::ZERO);
        (key, placement)
    }

    /// Strecke zwischen zwei Punkten, die bereits in Placement-Koordinaten vorliegen.
    pub fn line_in(&mut self, placement: Placement, start: Vec3, end: Vec3, name: &str) -> NodeKey {
        let parent = self.parent_of(placement);
        self.insert(parent, name, NodeKind::Line { start, end }, Vec3::ZERO)
    }

    /// Führungskurve, deren Vertices in Modellkoordinaten eines Kiefers vorliegen.
    ///
    /// Beim Overlay-Placement werden die Vertices in Weltkoordinaten übertragen
    /// (beide Kiefer teilen dieselbe Transformation).
    pub fn curve(
        &mut self,
        curve: GuideCurve,
        model_jaw: Jaw,
        placement: Placement,
        name: &str,
    ) -> NodeKey {
        let curve = if placement == Placement::Jaw(model_jaw) {
            curve
        } else {
            let vertices = curve
                .vertices()
                .iter()
                .map(|&position| {
                    self.resolve(
                        Anchor {
                            jaw: model_jaw,
                            position,
                        },
                        placement,
                    )
                })
                .collect();
            match GuideCurve::new(vertices, curve.parameterization()) {
                Ok(transformed) => transformed,
                Err(e) => {
                    log::warn!(
                        "Kurven-Transformation fehlgeschlagen ({}), verwende Modellkoordinaten",
                        e
                    );
                    curve
                }
            }
        };
        let polyline = curve.sample(self.options.curve_samples_per_segment);
        let parent = self.parent_of(placement);
        let kind = NodeKind::Curve { curve, polyline };
        self.insert(parent, name, kind, Vec3::ZERO)
    }

    /// Control-Point auf einer zuvor erzeugten Kurve bei Parameter `t`.
    ///
    /// Liegt im selben Teilbaum wie die Kurve; Position = `curve.evaluate(t)`.
    pub fn control_point(&mut self, curve_node: NodeKey, t: f32, name: &str) -> Option<NodeKey> {
        let position = self.scene.curve(curve_node)?.evaluate(t);
        let parent = self.scene.get(curve_node)?.parent()?;
        let radius = self.options.control_point_radius;
        let kind = NodeKind::ControlPoint { radius };
        Some(self.insert(parent, name, kind, position))
    }

    /// Referenzebene an `position`, Normale per Look-at auf `look_at` ausgerichtet.
    ///
    /// Die Ausrichtung wird nur hier bestimmt; spätere Drags verschieben die Ebene nur.
    pub fn plane(
        &mut self,
        placement: Placement,
        position: Vec3,
        look_at: Vec3,
        name: &str,
    ) -> NodeKey {
        let rotation = (look_at - position)
            .try_normalize()
            .map_or(Quat::IDENTITY, |dir| Quat::from_rotation_arc(Vec3::Z, dir));
        let parent = self.parent_of(placement);
        let size = self.options.plane_size;
        let key = self.insert(parent, name, NodeKind::Plane { size }, position);
        self.scene.set_rotation(key, rotation);
        key
    }

    /// Text-Label mit konfiguriertem Versatz über `position`.
    pub fn label(
        &mut self,
        placement: Placement,
        position: Vec3,
        text: impl Into<String>,
        name: &str,
    ) -> NodeKey {
        let parent = self.parent_of(placement);
        let translation = position + self.options.label_offset;
        let kind = NodeKind::Label { text: text.into() };
        self.insert(parent, name, kind, translation)
    }
}
