//! Mess-Zusammenfassung als Übergabevertrag an ein externes UI-Panel.

use serde::Serialize;
use serde_json::Value;

/// Eine Zeile der Zusammenfassung (Name, formatierter Wert, Bewertung).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    /// Messgröße, z.B. "Overbite"
    pub name: String,
    /// Formatierter Wert inkl. Einheit, z.B. "2.40 mm"
    pub value: String,
    /// Klinische Einordnung aus dem Payload (leer wenn nicht geliefert)
    pub result: String,
}

/// Gruppe von Zeilen unter einer Überschrift.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryGroup {
    /// Gruppentitel
    pub title: String,
    /// Zeilen in Anzeigereihenfolge
    pub rows: Vec<SummaryRow>,
}

/// Vollständige, gruppierte Zusammenfassung einer Analyse.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MeasurementSummary {
    /// Gruppen in Anzeigereihenfolge
    pub groups: Vec<SummaryGroup>,
}

impl MeasurementSummary {
    /// Gibt `true` zurück, wenn keine Zeilen vorhanden sind.
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.rows.is_empty())
    }

    /// Gesamtzahl aller Zeilen.
    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }

    /// Sucht eine Zeile per Name über alle Gruppen.
    pub fn find_row(&self, name: &str) -> Option<&SummaryRow> {
        self.groups
            .iter()
            .flat_map(|g| g.rows.iter())
            .find(|r| r.name == name)
    }
}

/// Baut eine Gruppe und lässt leere Gruppen weg.
pub(crate) struct GroupBuilder {
    group: SummaryGroup,
}

impl GroupBuilder {
    pub(crate) fn new(title: impl Into<String>) -> Self {
        Self {
            group: SummaryGroup {
                title: title.into(),
                rows: Vec::new(),
            },
        }
    }

    /// Fügt eine Zeile für ein Messwert-Objekt `{value, result?}` oder eine nackte Zahl hinzu.
    ///
    /// Fehlt der Wert, entfällt die Zeile.
    pub(crate) fn measurement(mut self, name: &str, field: Option<&Value>, unit: &str) -> Self {
        if let Some(value) = field.and_then(measurement_value) {
            let result = field
                .and_then(|f| f.get("result"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            self.group.rows.push(SummaryRow {
                name: name.to_string(),
                value: format_value(value, unit),
                result: result.to_string(),
            });
        }
        self
    }

    /// Hängt die Gruppe an die Zusammenfassung, sofern sie Zeilen enthält.
    pub(crate) fn push_into(self, summary: &mut MeasurementSummary) {
        if !self.group.rows.is_empty() {
            summary.groups.push(self.group);
        }
    }
}

/// Liest einen Zahlenwert aus `{ "value": x }` oder direkt aus einer Zahl.
pub fn measurement_value(field: &Value) -> Option<f64> {
    field
        .as_f64()
        .or_else(|| field.get("value").and_then(Value::as_f64))
        .filter(|v| v.is_finite())
}

/// Formatiert einen Wert mit zwei Nachkommastellen und optionaler Einheit.
pub fn format_value(value: f64, unit: &str) -> String {
    if unit.is_empty() {
        format!("{value:.2}")
    } else {
        format!("{value:.2} {unit}")
    }
}
