//! Zentrale Konfiguration der Overlay-Engine.
//!
//! `EngineOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use super::spline_geometry::CurveParameterization;
use glam::Vec3;
use serde::{Deserialize, Serialize};

// ── Projektion ──────────────────────────────────────────────────────

/// Schritte der groben Projektionsphase über t ∈ [0, 1].
pub const PROJECTION_COARSE_SAMPLES: usize = 100;
/// Schritte der Verfeinerungsphase.
pub const PROJECTION_REFINE_SAMPLES: usize = 20;
/// Halbe Breite des Verfeinerungsfensters (= 1 / grobe Schritte).
pub const PROJECTION_REFINE_WINDOW: f32 = 0.01;

// ── Kurven ──────────────────────────────────────────────────────────

/// Stützstellen pro Catmull-Rom-Segment für die gerenderte Polyline.
///
/// 16 reicht für eine flüssige Darstellung; mehr bringt keinen sichtbaren Unterschied.
pub const CURVE_SAMPLES_PER_SEGMENT: usize = 16;
/// Standard-Parameter der Control-Points auf der Bogenkurve.
pub const CONTROL_POINT_PARAMS: [f32; 2] = [0.25, 0.75];

// ── Dekorationen ────────────────────────────────────────────────────

/// Radius der Landmark-Marker in Modelleinheiten (mm).
pub const MARKER_RADIUS: f32 = 0.35;
/// Radius der Control-Point-Handles.
pub const CONTROL_POINT_RADIUS: f32 = 0.6;
/// Kantenlänge abhängiger Referenzebenen.
pub const PLANE_SIZE: f32 = 12.0;
/// Versatz von Text-Labels gegenüber ihrem Ankerpunkt.
pub const LABEL_OFFSET: Vec3 = Vec3::new(0.0, 0.0, 2.0);

// ── Laufzeit-Optionen (serialisierbar) ─────────────────────────────

/// Alle zur Laufzeit änderbaren Engine-Optionen.
/// Wird als `arch_overlay.toml` neben der Binary gespeichert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineOptions {
    // ── Projektion ──────────────────────────────────────────────
    /// Schritte der groben Projektionsphase
    pub projection_coarse_samples: usize,
    /// Schritte der Verfeinerungsphase
    pub projection_refine_samples: usize,
    /// Halbe Breite des Verfeinerungsfensters
    pub projection_refine_window: f32,

    // ── Kurven ──────────────────────────────────────────────────
    /// Stützstellen pro Segment für die gerenderte Polyline
    pub curve_samples_per_segment: usize,
    /// Parametrisierung der Einzelkiefer-Bogenkurven (`arch_form`)
    #[serde(default)]
    pub arch_curve_parameterization: CurveParameterization,
    /// Parametrisierung der kieferübergreifenden Mittellinienkurve (`occlusal_plane`)
    #[serde(default)]
    pub midline_curve_parameterization: CurveParameterization,
    /// Start-Parameter der Control-Points auf Bogenkurven
    #[serde(default = "default_control_point_params")]
    pub control_point_params: Vec<f32>,

    // ── Dekorationen ────────────────────────────────────────────
    /// Radius der Landmark-Marker
    pub marker_radius: f32,
    /// Radius der Control-Point-Handles
    pub control_point_radius: f32,
    /// Kantenlänge abhängiger Referenzebenen
    pub plane_size: f32,
    /// Versatz von Text-Labels
    pub label_offset: Vec3,

    // ── Modell ──────────────────────────────────────────────────
    /// Gemeinsame uniforme Skalierung beider Kiefer
    #[serde(default = "default_model_scale")]
    pub model_scale: f32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            projection_coarse_samples: PROJECTION_COARSE_SAMPLES,
            projection_refine_samples: PROJECTION_REFINE_SAMPLES,
            projection_refine_window: PROJECTION_REFINE_WINDOW,

            curve_samples_per_segment: CURVE_SAMPLES_PER_SEGMENT,
            arch_curve_parameterization: CurveParameterization::Uniform,
            midline_curve_parameterization: CurveParameterization::Uniform,
            control_point_params: default_control_point_params(),

            marker_radius: MARKER_RADIUS,
            control_point_radius: CONTROL_POINT_RADIUS,
            plane_size: PLANE_SIZE,
            label_offset: LABEL_OFFSET,

            model_scale: default_model_scale(),
        }
    }
}

/// Serde-Default für `control_point_params` (Abwärtskompatibilität).
fn default_control_point_params() -> Vec<f32> {
    CONTROL_POINT_PARAMS.to_vec()
}

/// Serde-Default für `model_scale`.
fn default_model_scale() -> f32 {
    1.0
}

impl EngineOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Ermittelt den Pfad zur Optionen-Datei neben der Binary.
    pub fn config_path() -> std::path::PathBuf {
        std::env::current_exe()
            .unwrap_or_else(|_| std::path::PathBuf::from("arch-overlay"))
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join("arch_overlay.toml")
    }

    /// Projektions-Parameter für den Point-Projector.
    pub fn projection_settings(&self) -> crate::curve::ProjectionSettings {
        crate::curve::ProjectionSettings {
            coarse_samples: self.projection_coarse_samples,
            refine_samples: self.projection_refine_samples,
            refine_window: self.projection_refine_window,
        }
    }
}
