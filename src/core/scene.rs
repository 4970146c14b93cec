//! Szenengraph als Arena von Nodes (SlotMap-Handles).
//!
//! Feste Struktur:
//! ```text
//! root
//! ├── upper   (JawSubtree, eigene Sichtbarkeit, gemeinsame Modellskalierung)
//! ├── lower   (JawSubtree)
//! └── overlay (OverlayRoot, immer sichtbar, Identitätsskalierung)
//! ```
//! Dekorationen, die Sichtbarkeit/Skalierung eines Kiefers erben sollen, hängen
//! unter genau einem JawSubtree; kieferübergreifende Dekorationen unter `overlay`.

use super::tooth::Jaw;
use crate::curve::GuideCurve;
use glam::{Mat4, Quat, Vec3};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Stabiler Handle auf einen Szenen-Node.
    pub struct NodeKey;
}

/// Art eines Szenen-Nodes inklusive art-spezifischer Geometriedaten.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Reine Gruppierung (Root, Kiefer, Overlay)
    Group,
    /// Extern erzeugtes Kiefer-Mesh (Knochen oder Kronen); Ressourcen gehören dem Host
    Mesh,
    /// Kugel-Marker an einer Landmarke
    Marker {
        /// Radius in Modelleinheiten
        radius: f32,
    },
    /// Strecke zwischen zwei lokalen Punkten
    Line {
        /// Startpunkt (lokal zum Parent)
        start: Vec3,
        /// Endpunkt (lokal zum Parent)
        end: Vec3,
    },
    /// Gerenderte Führungskurve
    Curve {
        /// Die Kurve selbst (Projektionsziel für Control-Points)
        curve: GuideCurve,
        /// Dichte Polyline für die Darstellung
        polyline: Vec<Vec3>,
    },
    /// Verschiebbarer Handle auf einer Kurve
    ControlPoint {
        /// Radius in Modelleinheiten
        radius: f32,
    },
    /// Quadratische Referenzebene
    Plane {
        /// Kantenlänge
        size: f32,
    },
    /// Text-Annotation (Canvas-Textur)
    Label {
        /// Angezeigter Text
        text: String,
    },
}

impl NodeKind {
    /// GPU-Ressourcen, die für diese Node-Art angelegt werden.
    fn allocated_resources(&self) -> GpuResources {
        match self {
            NodeKind::Group | NodeKind::Mesh => GpuResources::NONE,
            NodeKind::Label { .. } => GpuResources {
                geometry: true,
                material: true,
                texture: true,
            },
            _ => GpuResources {
                geometry: true,
                material: true,
                texture: false,
            },
        }
    }
}

/// Von einem Node gehaltene GPU-Ressourcen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GpuResources {
    /// Vertex-/Index-Buffer
    pub geometry: bool,
    /// Material/Shader-Parameter
    pub material: bool,
    /// Textur (nur Labels)
    pub texture: bool,
}

impl GpuResources {
    /// Keine Ressourcen.
    pub const NONE: Self = Self {
        geometry: false,
        material: false,
        texture: false,
    };
}

/// Zähler aller aktuell lebenden GPU-Ressourcen in der Szene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceLedger {
    /// Lebende Geometrien
    pub geometries: usize,
    /// Lebende Materialien
    pub materials: usize,
    /// Lebende Texturen
    pub textures: usize,
}

impl ResourceLedger {
    fn acquire(&mut self, res: GpuResources) {
        self.geometries += usize::from(res.geometry);
        self.materials += usize::from(res.material);
        self.textures += usize::from(res.texture);
    }

    fn release(&mut self, res: GpuResources) {
        self.geometries -= usize::from(res.geometry);
        self.materials -= usize::from(res.material);
        self.textures -= usize::from(res.texture);
    }

    /// Gesamtzahl lebender Ressourcen.
    pub fn total(&self) -> usize {
        self.geometries + self.materials + self.textures
    }
}

/// Ein Node im Szenengraph.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Debug-Name (z.B. `"overbite:line:11-41"`), keine Eigentums-Semantik
    pub name: String,
    /// Art und Geometrie
    pub kind: NodeKind,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    /// Eigene Sichtbarkeit (ohne Vorfahren)
    pub visible: bool,
    /// Lokale Translation
    pub translation: Vec3,
    /// Lokale Rotation
    pub rotation: Quat,
    /// Lokale uniforme Skalierung
    pub scale: f32,
    resources: GpuResources,
}

impl SceneNode {
    /// Parent-Node (nur Root hat keinen).
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Kinder in Einfügereihenfolge.
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Gehaltene GPU-Ressourcen.
    pub fn resources(&self) -> GpuResources {
        self.resources
    }

    /// Lokale Transformationsmatrix.
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            self.rotation,
            self.translation,
        )
    }
}

/// Szenengraph mit festen Kiefer-Teilbäumen und Overlay-Root.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, SceneNode>,
    root: NodeKey,
    upper: NodeKey,
    lower: NodeKey,
    overlay: NodeKey,
    ledger: ResourceLedger,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Erstellt eine Szene mit Root, beiden Kiefer-Teilbäumen und Overlay-Root.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Self::group_node("root", None));
        let mut scene = Self {
            nodes,
            root,
            upper: root,
            lower: root,
            overlay: root,
            ledger: ResourceLedger::default(),
        };
        scene.upper = scene.add_node(root, "upper", NodeKind::Group, Vec3::ZERO);
        scene.lower = scene.add_node(root, "lower", NodeKind::Group, Vec3::ZERO);
        scene.overlay = scene.add_node(root, "overlay", NodeKind::Group, Vec3::ZERO);
        scene
    }

    fn group_node(name: &str, parent: Option<NodeKey>) -> SceneNode {
        SceneNode {
            name: name.to_string(),
            kind: NodeKind::Group,
            parent,
            children: Vec::new(),
            visible: true,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
            resources: GpuResources::NONE,
        }
    }

    /// Root-Node.
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Teilbaum eines Kiefers.
    pub fn jaw_root(&self, jaw: Jaw) -> NodeKey {
        match jaw {
            Jaw::Upper => self.upper,
            Jaw::Lower => self.lower,
        }
    }

    /// Overlay-Root für kieferübergreifende Dekorationen.
    pub fn overlay_root(&self) -> NodeKey {
        self.overlay
    }

    /// Fügt einen Node unter `parent` ein und legt seine GPU-Ressourcen an.
    ///
    /// Ein ungültiger Parent fällt auf den Overlay-Root zurück (geloggt).
    pub fn add_node(
        &mut self,
        parent: NodeKey,
        name: impl Into<String>,
        kind: NodeKind,
        translation: Vec3,
    ) -> NodeKey {
        let parent = if self.nodes.contains_key(parent) {
            parent
        } else {
            log::warn!("Parent-Node existiert nicht mehr, hänge unter Overlay-Root");
            self.overlay
        };
        let resources = kind.allocated_resources();
        self.ledger.acquire(resources);
        let key = self.nodes.insert(SceneNode {
            name: name.into(),
            kind,
            parent: Some(parent),
            children: Vec::new(),
            visible: true,
            translation,
            rotation: Quat::IDENTITY,
            scale: 1.0,
            resources,
        });
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(key);
        }
        key
    }

    /// Hängt ein extern erzeugtes Kiefer-Mesh in den Teilbaum des Kiefers.
    pub fn attach_mesh(&mut self, jaw: Jaw, name: impl Into<String>) -> NodeKey {
        let parent = self.jaw_root(jaw);
        self.add_node(parent, name, NodeKind::Mesh, Vec3::ZERO)
    }

    /// Read-only Zugriff auf einen Node.
    pub fn get(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    /// Mutabler Zugriff auf einen Node.
    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    /// Prüft, ob der Node noch existiert.
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Anzahl aller Nodes inklusive Root/Kiefer/Overlay.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Aktuell lebende GPU-Ressourcen.
    pub fn live_resources(&self) -> ResourceLedger {
        self.ledger
    }

    /// Setzt die eigene Sichtbarkeit eines Nodes.
    pub fn set_visible(&mut self, key: NodeKey, visible: bool) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.visible = visible;
        }
    }

    /// Sichtbarkeit unter Berücksichtigung aller Vorfahren.
    pub fn is_effectively_visible(&self, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            let Some(node) = self.nodes.get(k) else {
                return false;
            };
            if !node.visible {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Setzt die Sichtbarkeit eines Kiefer-Teilbaums.
    pub fn set_jaw_visible(&mut self, jaw: Jaw, visible: bool) {
        let key = self.jaw_root(jaw);
        self.set_visible(key, visible);
    }

    /// Setzt die gemeinsame uniforme Modellskalierung beider Kiefer.
    ///
    /// Der Overlay-Root behält die Identitätsskalierung.
    pub fn set_model_scale(&mut self, scale: f32) {
        if !scale.is_finite() || scale <= 0.0 {
            log::warn!("Ungültige Modellskalierung {} ignoriert", scale);
            return;
        }
        for jaw in Jaw::ALL {
            let key = self.jaw_root(jaw);
            if let Some(node) = self.nodes.get_mut(key) {
                node.scale = scale;
            }
        }
    }

    /// Aktuelle Modellskalierung (aus dem Oberkiefer-Teilbaum).
    pub fn model_scale(&self) -> f32 {
        self.nodes.get(self.upper).map_or(1.0, |n| n.scale)
    }

    /// Setzt die lokale Translation eines Nodes.
    pub fn set_translation(&mut self, key: NodeKey, translation: Vec3) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.translation = translation;
        }
    }

    /// Setzt die lokale Rotation eines Nodes.
    pub fn set_rotation(&mut self, key: NodeKey, rotation: Quat) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.rotation = rotation;
        }
    }

    /// Setzt die Endpunkte eines Linien-Nodes.
    pub fn set_line_endpoints(&mut self, key: NodeKey, new_start: Vec3, new_end: Vec3) {
        if let Some(SceneNode {
            kind: NodeKind::Line { start, end },
            ..
        }) = self.nodes.get_mut(key)
        {
            *start = new_start;
            *end = new_end;
        }
    }

    /// Ersetzt den Text eines Label-Nodes.
    pub fn set_label_text(&mut self, key: NodeKey, new_text: impl Into<String>) {
        if let Some(SceneNode {
            kind: NodeKind::Label { text },
            ..
        }) = self.nodes.get_mut(key)
        {
            *text = new_text.into();
        }
    }

    /// Führungskurve eines Kurven-Nodes.
    pub fn curve(&self, key: NodeKey) -> Option<&GuideCurve> {
        match self.nodes.get(key).map(|n| &n.kind) {
            Some(NodeKind::Curve { curve, .. }) => Some(curve),
            _ => None,
        }
    }

    /// Weltmatrix eines Nodes (Produkt aller lokalen Matrizen bis zur Root).
    pub fn world_matrix(&self, key: NodeKey) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(key);
        while let Some(k) = current {
            let Some(node) = self.nodes.get(k) else {
                break;
            };
            matrix = node.local_matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    /// Weltposition des Node-Ursprungs.
    pub fn world_position(&self, key: NodeKey) -> Vec3 {
        self.world_matrix(key).transform_point3(Vec3::ZERO)
    }

    /// Transformiert einen Weltpunkt in das lokale Koordinatensystem von `key`.
    pub fn world_to_local(&self, key: NodeKey, world: Vec3) -> Vec3 {
        self.world_matrix(key).inverse().transform_point3(world)
    }

    /// Transformiert einen lokalen Punkt von `key` in Weltkoordinaten.
    pub fn local_to_world(&self, key: NodeKey, local: Vec3) -> Vec3 {
        self.world_matrix(key).transform_point3(local)
    }

    /// Gibt einen Node samt Teilbaum frei (GPU-Ressourcen bottom-up).
    ///
    /// Gibt die Anzahl entfernter Nodes zurück; fehlende Handles sind ein No-op.
    /// Root, Kiefer-Teilbäume und Overlay-Root sind geschützt.
    pub fn dispose(&mut self, key: NodeKey) -> usize {
        if key == self.root || key == self.upper || key == self.lower || key == self.overlay {
            log::warn!("Struktur-Node kann nicht freigegeben werden");
            return 0;
        }
        let Some(node) = self.nodes.get(key) else {
            return 0;
        };
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|&c| c != key);
        }
        self.dispose_subtree(key)
    }

    fn dispose_subtree(&mut self, key: NodeKey) -> usize {
        let Some(node) = self.nodes.remove(key) else {
            return 0;
        };
        let mut removed = 1;
        for child in node.children {
            removed += self.dispose_subtree(child);
        }
        self.ledger.release(node.resources);
        removed
    }

    /// Alle Nodes eines Teilbaums (inklusive `key`) in Tiefensuche.
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut result = Vec::new();
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            let Some(node) = self.nodes.get(k) else {
                continue;
            };
            result.push(k);
            stack.extend(node.children.iter().rev().copied());
        }
        result
    }
}
