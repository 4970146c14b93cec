//! Application-Layer: Strategien, Registry, Drag-Controller und Kontext.

pub mod command_log;
pub mod context;
pub mod controller;
pub mod decoration;
pub mod events;
pub mod registry;
/// Konkrete Analyse-Strategien (Bolton, Overbite, Bogenbreite, Bogenform, Okklusionsebene)
pub mod strategies;
pub mod strategy;

pub use command_log::CommandLog;
pub use context::{AnalysisContext, JawMeshes};
pub use controller::{DragBinding, SceneCouplingController};
pub use decoration::{Anchor, DecorationBuilder, Placement, SceneHandles};
pub use events::OverlayCommand;
pub use registry::{RegistryError, StrategyRegistry};
pub use strategy::{
    AnalysisInput, AnalysisStrategy, ControlBinding, ControlMoved, DraggableProvider,
    RenderCategory, StrategyLifecycle, StrategyRecord, StrategyState, Visibility,
};
