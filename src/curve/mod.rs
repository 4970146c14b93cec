//! Führungskurven: Aufbau aus Landmarken, Auswertung und Punkt-Projektion.

pub mod builder;
mod guide_curve;
pub mod projector;

pub use builder::{CurveMode, GuideCurveBuilder};
pub use guide_curve::GuideCurve;
pub use projector::{project_point, Projection, ProjectionSettings};

/// Fehler beim Aufbau einer Führungskurve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CurveBuildError {
    /// Weniger als zwei Vertices nach Reihenfolge/Paarbildung
    #[error("Führungskurve benötigt mindestens 2 Vertices, gefunden: {found}")]
    TooFewVertices {
        /// Anzahl tatsächlich vorhandener Vertices
        found: usize,
    },
    /// Ein Vertex enthält NaN oder ±∞
    #[error("Vertex {index} der Führungskurve ist nicht endlich")]
    NonFiniteVertex {
        /// Index des ungültigen Vertex
        index: usize,
    },
}
