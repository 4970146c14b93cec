//! Zahn-Landmarken und der Landmark-Store.
//!
//! Der Store wird extern befüllt (typischerweise aus JSON) und von den
//! Strategien nur gelesen. Pro Zahn können mehrere Punkte mit Typ-Tag existieren.

use super::tooth::{Jaw, ToothId};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Typ-Tag einer Landmarke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkKind {
    /// Höckerspitze
    Cusp,
    /// Inzisalkante / Schneidekantenmitte
    Incisal,
    /// Mesialer Kontaktpunkt
    Mesial,
    /// Distaler Kontaktpunkt
    Distal,
    /// Fazialer Achsenpunkt (FA-Punkt)
    Facial,
    /// Vorberechneter Kronenschwerpunkt
    Centroid,
    /// Unbekannter oder nicht ausgewerteter Typ
    #[default]
    #[serde(other)]
    Other,
}

/// Eine unveränderliche 3D-Landmarke eines Zahns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToothLandmark {
    /// FDI-Zahnnummer
    pub tooth: ToothId,
    /// Typ-Tag
    pub kind: LandmarkKind,
    /// Position im Modellkoordinatensystem des Kiefers
    pub position: Vec3,
}

/// Rohformat eines Landmark-Eintrags im JSON.
#[derive(Debug, Deserialize)]
struct RawLandmark {
    #[serde(default)]
    kind: LandmarkKind,
    position: [f32; 3],
}

/// Read-only Sammlung aller Landmarken, gruppiert nach Zahn.
#[derive(Debug, Clone, Default)]
pub struct LandmarkStore {
    teeth: BTreeMap<ToothId, Vec<ToothLandmark>>,
}

impl LandmarkStore {
    /// Erstellt einen leeren Store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fügt eine Landmarke hinzu. Nicht-endliche Positionen werden verworfen.
    pub fn insert(&mut self, tooth: ToothId, kind: LandmarkKind, position: Vec3) {
        if !position.is_finite() {
            log::warn!(
                "Landmarke für Zahn {} mit ungültiger Position verworfen",
                tooth
            );
            return;
        }
        self.teeth.entry(tooth).or_default().push(ToothLandmark {
            tooth,
            kind,
            position,
        });
    }

    /// Parst einen Landmark-Store aus JSON-Text.
    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_json_value(&value))
    }

    /// Baut einen Store aus einem JSON-Objekt `{ "<fdi>": <eintrag> | [<eintrag>, …] }`.
    ///
    /// Ein Eintrag ist entweder ein Objekt `{kind, position: [x, y, z]}` oder
    /// derselbe Datensatz als JSON-String (wird bei Bedarf geparst).
    /// Fehlerhafte Schlüssel oder Einträge werden übersprungen und geloggt.
    pub fn from_json_value(value: &Value) -> Self {
        let mut store = Self::new();
        let Some(map) = value.as_object() else {
            log::warn!("Landmark-Daten sind kein JSON-Objekt, Store bleibt leer");
            return store;
        };

        for (key, entry) in map {
            let Some(tooth) = ToothId::parse(key) else {
                log::warn!("Ungültige FDI-Zahnnummer '{}' übersprungen", key);
                continue;
            };
            let entries: Vec<&Value> = match entry {
                Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            for item in entries {
                match parse_entry(item) {
                    Some(raw) => store.insert(tooth, raw.kind, Vec3::from_array(raw.position)),
                    None => log::warn!("Fehlerhafte Landmarke für Zahn {} übersprungen", tooth),
                }
            }
        }

        log::debug!(
            "Landmark-Store geladen: {} Zähne, {} Punkte",
            store.tooth_count(),
            store.point_count()
        );
        store
    }

    /// Alle Landmarken eines Zahns (leer, wenn der Zahn fehlt).
    pub fn points(&self, tooth: ToothId) -> &[ToothLandmark] {
        self.teeth.get(&tooth).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Erste Landmarke eines bestimmten Typs.
    pub fn find(&self, tooth: ToothId, kind: LandmarkKind) -> Option<Vec3> {
        self.points(tooth)
            .iter()
            .find(|l| l.kind == kind)
            .map(|l| l.position)
    }

    /// Landmarke eines Typs oder, falls nicht vorhanden, der Zahn-Schwerpunkt.
    pub fn find_or_centroid(&self, tooth: ToothId, kind: LandmarkKind) -> Option<Vec3> {
        self.find(tooth, kind).or_else(|| self.centroid(tooth))
    }

    /// Arithmetisches Mittel aller Punkte eines Zahns.
    pub fn centroid(&self, tooth: ToothId) -> Option<Vec3> {
        let points = self.points(tooth);
        if points.is_empty() {
            return None;
        }
        let sum: Vec3 = points.iter().map(|l| l.position).sum();
        Some(sum / points.len() as f32)
    }

    /// Schwerpunkte aller vorhandenen Zähne.
    pub fn centroids(&self) -> BTreeMap<ToothId, Vec3> {
        self.teeth
            .keys()
            .filter_map(|&tooth| self.centroid(tooth).map(|c| (tooth, c)))
            .collect()
    }

    /// Alle Landmarken eines Kiefers.
    pub fn jaw_landmarks(&self, jaw: Jaw) -> impl Iterator<Item = &ToothLandmark> {
        self.teeth
            .iter()
            .filter(move |(tooth, _)| tooth.jaw() == jaw)
            .flat_map(|(_, points)| points.iter())
    }

    /// Anzahl der Zähne mit mindestens einer Landmarke.
    pub fn tooth_count(&self) -> usize {
        self.teeth.len()
    }

    /// Gesamtzahl aller Landmarken.
    pub fn point_count(&self) -> usize {
        self.teeth.values().map(Vec::len).sum()
    }

    /// Gibt `true` zurück, wenn keine Landmarken vorhanden sind.
    pub fn is_empty(&self) -> bool {
        self.teeth.is_empty()
    }
}

fn parse_entry(item: &Value) -> Option<RawLandmark> {
    match item {
        Value::String(text) => serde_json::from_str(text).ok(),
        Value::Object(_) => serde_json::from_value(item.clone()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tooth(code: u8) -> ToothId {
        ToothId::new(code).unwrap()
    }

    #[test]
    fn test_centroid_is_arithmetic_mean() {
        let mut store = LandmarkStore::new();
        store.insert(tooth(16), LandmarkKind::Cusp, Vec3::new(0.0, 0.0, 0.0));
        store.insert(tooth(16), LandmarkKind::Cusp, Vec3::new(2.0, 4.0, 6.0));
        let c = store.centroid(tooth(16)).unwrap();
        assert!((c - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
        assert!(store.centroid(tooth(26)).is_none());
    }

    #[test]
    fn test_json_accepts_objects_strings_and_arrays() {
        let value = json!({
            "11": {"kind": "incisal", "position": [1.0, 2.0, 3.0]},
            "21": "{\"kind\":\"incisal\",\"position\":[4.0,5.0,6.0]}",
            "36": [
                {"kind": "cusp", "position": [0.0, 0.0, 0.0]},
                {"kind": "whatever", "position": [2.0, 0.0, 0.0]}
            ]
        });
        let store = LandmarkStore::from_json_value(&value);
        assert_eq!(store.tooth_count(), 3);
        assert_eq!(store.point_count(), 4);
        assert_eq!(
            store.find(tooth(21), LandmarkKind::Incisal),
            Some(Vec3::new(4.0, 5.0, 6.0))
        );
        assert_eq!(store.points(tooth(36))[1].kind, LandmarkKind::Other);
    }

    #[test]
    fn test_json_skips_malformed_entries() {
        let value = json!({
            "99": {"kind": "cusp", "position": [1.0, 2.0, 3.0]},
            "11": "not json",
            "12": {"kind": "cusp"},
            "13": [{"kind": "cusp", "position": [1.0, 1.0, 1.0]}, 42]
        });
        let store = LandmarkStore::from_json_value(&value);
        assert_eq!(store.tooth_count(), 1);
        assert_eq!(store.points(tooth(13)).len(), 1);
    }

    #[test]
    fn test_json_non_object_yields_empty_store() {
        let store = LandmarkStore::from_json_value(&json!([1, 2, 3]));
        assert!(store.is_empty());
    }

    #[test]
    fn test_jaw_landmarks_filters_by_jaw() {
        let mut store = LandmarkStore::new();
        store.insert(tooth(11), LandmarkKind::Incisal, Vec3::ZERO);
        store.insert(tooth(41), LandmarkKind::Incisal, Vec3::ONE);
        store.insert(tooth(31), LandmarkKind::Incisal, Vec3::ONE);
        assert_eq!(store.jaw_landmarks(Jaw::Upper).count(), 1);
        assert_eq!(store.jaw_landmarks(Jaw::Lower).count(), 2);
    }
}
