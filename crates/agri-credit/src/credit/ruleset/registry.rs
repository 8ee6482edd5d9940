use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use super::catalog;
use super::{Factor, NormalizationConventions, RuleSetError, ScoringFamily, ScoringRuleSet};

/// Version-keyed store of immutable rule sets. Callers select a version explicitly.
#[derive(Debug, Clone, Default)]
pub struct RuleSetRegistry {
    rule_sets: BTreeMap<String, Arc<ScoringRuleSet>>,
}

impl RuleSetRegistry {
    /// Registry holding every shipped version (`1.0`, `2.0`, `2.1`).
    pub fn standard() -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for rule_set in catalog::standard_rule_sets()? {
            registry.register(rule_set)?;
        }
        Ok(registry)
    }

    /// Adds a new version. Existing versions are never replaced.
    pub fn register(
        &mut self,
        rule_set: ScoringRuleSet,
    ) -> Result<Arc<ScoringRuleSet>, RegistryError> {
        let version = rule_set.version().to_string();
        if self.rule_sets.contains_key(&version) {
            return Err(RegistryError::DuplicateVersion(version));
        }
        let rule_set = Arc::new(rule_set);
        self.rule_sets.insert(version, rule_set.clone());
        Ok(rule_set)
    }

    pub fn get(&self, version: &str) -> Result<Arc<ScoringRuleSet>, RegistryError> {
        self.rule_sets
            .get(version.trim())
            .cloned()
            .ok_or_else(|| RegistryError::UnknownVersion(version.to_string()))
    }

    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.rule_sets.keys().map(String::as_str)
    }

    pub fn summaries(&self) -> Vec<RuleSetSummary> {
        self.rule_sets
            .values()
            .map(|rule_set| RuleSetSummary::from(rule_set.as_ref()))
            .collect()
    }
}

/// Public description of a registered rule set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSetSummary {
    pub version: String,
    pub family: ScoringFamily,
    pub factors: Vec<Factor>,
    pub rated: bool,
    pub max_score: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_weight: Option<i32>,
    pub conventions: NormalizationConventions,
}

impl From<&ScoringRuleSet> for RuleSetSummary {
    fn from(rule_set: &ScoringRuleSet) -> Self {
        let total_weight = match rule_set.family() {
            ScoringFamily::WeightMultiplier => Some(rule_set.total_weight()),
            ScoringFamily::MaxPoints { .. } => None,
        };
        Self {
            version: rule_set.version().to_string(),
            family: rule_set.family(),
            factors: rule_set.rules().iter().map(|rule| rule.factor()).collect(),
            rated: rule_set.rating_policy().is_rated(),
            max_score: rule_set.max_score(),
            total_weight,
            conventions: rule_set.conventions().clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown rule-set version '{0}'")]
    UnknownVersion(String),
    #[error("rule-set version '{0}' is already registered")]
    DuplicateVersion(String),
    #[error(transparent)]
    InvalidRuleSet(#[from] RuleSetError),
}
