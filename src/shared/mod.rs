//! Geteilte, layer-neutrale Typen: Optionen, Spline-Geometrie, Mess-Zusammenfassung.

pub mod options;
pub mod spline_geometry;
pub mod summary;

pub use options::EngineOptions;
pub use spline_geometry::CurveParameterization;
pub use summary::{MeasurementSummary, SummaryGroup, SummaryRow};
