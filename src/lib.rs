//! Arch Overlay Engine Library.
//! Analyse-Overlays auf einem Ober-/Unterkiefer-Modell mit kurvengebundenen Control-Points.

pub mod app;
pub mod core;
pub mod curve;
pub mod shared;

pub use app::{
    AnalysisContext, AnalysisStrategy, OverlayCommand, RegistryError, RenderCategory,
    SceneCouplingController, StrategyRegistry,
};
pub use core::{Jaw, LandmarkKind, LandmarkStore, NodeKey, NodeKind, SceneGraph, ToothId};
pub use curve::{project_point, CurveBuildError, CurveMode, GuideCurve, GuideCurveBuilder};
pub use shared::{CurveParameterization, EngineOptions, MeasurementSummary};
