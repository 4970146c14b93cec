//! Konkrete Analyse-Strategien.
//!
//! Jede Strategie liest nur ihre benannten Payload-Felder; fehlende Felder
//! lassen den abhängigen Schritt entfallen (geloggt).

/// Bogenform mit verschiebbaren Control-Points (Einzelkiefer-Kurven)
pub mod arch_form;
/// Intercanine/Intermolare Breiten
pub mod arch_width;
/// Bolton-Zahnbreitenverhältnis
pub mod bolton;
/// Okklusionsebene über der Mittellinienkurve
pub mod occlusal_plane;
/// Overbite/Overjet der Schneidezähne
pub mod overbite;

pub use arch_form::ArchFormStrategy;
pub use arch_width::ArchWidthStrategy;
pub use bolton::BoltonStrategy;
pub use occlusal_plane::OcclusalPlaneStrategy;
pub use overbite::OverbiteStrategy;

use crate::core::Jaw;
use serde_json::Value;

/// Folgt einem Pfad verschachtelter Objekt-Schlüssel im Payload.
pub(crate) fn field<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(payload, |value, key| value.get(*key))
}

/// Zahlenwert unter `path` (direkt oder als `{value}`), sonst Warnung + `None`.
pub(crate) fn required_value(task: &str, payload: &Value, path: &[&str]) -> Option<f64> {
    let value = field(payload, path).and_then(crate::shared::summary::measurement_value);
    if value.is_none() {
        log::warn!(
            "'{}': Payload-Feld '{}' fehlt oder ist ungültig",
            task,
            path.join(".")
        );
    }
    value
}

/// Payload-Schlüssel eines Kiefers (`"upper"` / `"lower"`).
pub(crate) fn jaw_key(jaw: Jaw) -> &'static str {
    jaw.label()
}

/// Titel einer Kiefer-Gruppe in der Zusammenfassung.
pub(crate) fn jaw_title(jaw: Jaw, suffix: &str) -> String {
    match jaw {
        Jaw::Upper => format!("Upper {suffix}"),
        Jaw::Lower => format!("Lower {suffix}"),
    }
}

#[cfg(test)]
pub(crate) mod test_support;
