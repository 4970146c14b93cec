//! Core-Domänentypen: Zahnnummern, Landmarken, Szenengraph.

pub mod landmark;
/// Szenengraph mit Kiefer-Teilbäumen, Overlay-Root und GPU-Ressourcen-Buchhaltung
pub mod scene;
pub mod tooth;

pub use landmark::{LandmarkKind, LandmarkStore, ToothLandmark};
pub use scene::{GpuResources, NodeKey, NodeKind, ResourceLedger, SceneGraph, SceneNode};
pub use tooth::{Jaw, ToothId};
