//! Strategy-Registry: Task-ID → Strategie, in Registrierungsreihenfolge.
//!
//! Wird einmal beim Bootstrap aufgebaut und über den `AnalysisContext`
//! weitergereicht; `clear()` existiert nur für Test-Harnesses.

use super::strategies;
use super::strategy::{AnalysisStrategy, RenderCategory, StrategyRecord};
use indexmap::IndexMap;

/// Konfigurationsfehler der Registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Eine Task-ID wurde doppelt registriert (fataler Konfigurationsfehler)
    #[error("Task-ID '{0}' ist bereits registriert")]
    DuplicateTaskId(String),
    /// Eine Operation wurde für eine unbekannte Task-ID angefordert
    #[error("Unbekannte Task-ID '{0}'")]
    UnknownTask(String),
}

/// Verwaltet registrierte Strategien; die Anzeigereihenfolge entspricht der Registrierung.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: IndexMap<&'static str, Box<dyn AnalysisStrategy>>,
}

impl StrategyRegistry {
    /// Erstellt eine leere Registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Erstellt eine Registry mit allen Standard-Strategien.
    pub fn with_default_strategies() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(Box::new(strategies::BoltonStrategy::new()))?;
        registry.register(Box::new(strategies::OverbiteStrategy::new()))?;
        registry.register(Box::new(strategies::ArchWidthStrategy::new()))?;
        registry.register(Box::new(strategies::ArchFormStrategy::new()))?;
        registry.register(Box::new(strategies::OcclusalPlaneStrategy::new()))?;
        Ok(registry)
    }

    /// Registriert eine Strategie und gibt ihren Anzeigereihenfolge-Index zurück.
    pub fn register(
        &mut self,
        strategy: Box<dyn AnalysisStrategy>,
    ) -> Result<usize, RegistryError> {
        let task_id = strategy.task_id();
        if self.strategies.contains_key(task_id) {
            log::error!("Doppelte Registrierung von Task-ID '{}'", task_id);
            return Err(RegistryError::DuplicateTaskId(task_id.to_string()));
        }
        let (order, _) = self.strategies.insert_full(task_id, strategy);
        log::debug!(
            "Strategie '{}' registriert (Reihenfolge {})",
            task_id,
            order
        );
        Ok(order)
    }

    /// Sucht eine Strategie; `None` ist der Not-found-Sentinel.
    pub fn get(&self, task_id: &str) -> Option<&dyn AnalysisStrategy> {
        self.strategies.get(task_id).map(|s| s.as_ref())
    }

    /// Mutable Variante von [`StrategyRegistry::get`].
    pub fn get_mut(&mut self, task_id: &str) -> Option<&mut dyn AnalysisStrategy> {
        let strategy = self.strategies.get_mut(task_id)?;
        Some(strategy.as_mut())
    }

    /// Wie `get_mut`, aber mit typisiertem Fehler für Schalt-Operationen.
    pub fn require_mut(
        &mut self,
        task_id: &str,
    ) -> Result<&mut dyn AnalysisStrategy, RegistryError> {
        match self.strategies.get_mut(task_id) {
            Some(strategy) => Ok(strategy.as_mut()),
            None => Err(RegistryError::UnknownTask(task_id.to_string())),
        }
    }

    /// Anzeigereihenfolge einer Task-ID.
    pub fn display_order(&self, task_id: &str) -> Option<usize> {
        self.strategies.get_index_of(task_id)
    }

    /// Alle Records in Registrierungsreihenfolge.
    pub fn list_all(&self) -> Vec<&StrategyRecord> {
        self.strategies.values().map(|s| s.record()).collect()
    }

    /// Records einer Render-Kategorie in Registrierungsreihenfolge.
    pub fn list_by_render_category(&self, category: RenderCategory) -> Vec<&StrategyRecord> {
        self.strategies
            .values()
            .map(|s| s.record())
            .filter(|r| r.render_category == category)
            .collect()
    }

    /// Iteriert mutabel über alle Strategien.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn AnalysisStrategy>> {
        self.strategies.values_mut()
    }

    /// Anzahl registrierter Strategien.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Gibt `true` zurück, wenn keine Strategie registriert ist.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Entfernt alle Strategien (nur für Test-Teardown).
    pub fn clear(&mut self) {
        self.strategies.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_contains_all_strategies_in_order() {
        let registry = StrategyRegistry::with_default_strategies().unwrap();
        let ids: Vec<&str> = registry.list_all().iter().map(|r| r.task_id).collect();
        let expected = [
            "bolton",
            "overbite",
            "arch_width",
            "arch_form",
            "occlusal_plane",
        ];
        assert_eq!(ids, expected);
        assert_eq!(registry.display_order("arch_form"), Some(3));
    }

    #[test]
    fn test_get_returns_matching_strategy_or_none() {
        let mut registry = StrategyRegistry::new();
        registry
            .register(Box::new(strategies::BoltonStrategy::new()))
            .unwrap();
        registry
            .register(Box::new(strategies::OverbiteStrategy::new()))
            .unwrap();

        let found = registry
            .get("overbite")
            .expect("overbite muss gefunden werden");
        assert_eq!(found.task_id(), "overbite");
        assert!(registry.get("unknown").is_none());
        assert_eq!(
            registry.require_mut("unknown").err(),
            Some(RegistryError::UnknownTask("unknown".into()))
        );
    }

    #[test]
    fn test_duplicate_task_id_is_rejected() {
        let mut registry = StrategyRegistry::new();
        registry
            .register(Box::new(strategies::BoltonStrategy::new()))
            .unwrap();
        let err = registry
            .register(Box::new(strategies::BoltonStrategy::new()))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTaskId("bolton".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_list_by_render_category_filters_and_keeps_order() {
        let registry = StrategyRegistry::with_default_strategies().unwrap();
        let curves: Vec<&str> = registry
            .list_by_render_category(RenderCategory::CurvesAndControls)
            .iter()
            .map(|r| r.task_id)
            .collect();
        assert_eq!(curves, vec!["arch_form", "occlusal_plane"]);
        let points = registry.list_by_render_category(RenderCategory::Points);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_clear_resets_registry() {
        let mut registry = StrategyRegistry::with_default_strategies().unwrap();
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.get("bolton").is_none());
    }
}
