mod policy;
mod rules;

pub use policy::{CreditRating, RatingPolicy};

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::FarmerAttributes;
use super::ruleset::{Factor, ScoringRuleSet};

/// Key under which the debt ratio is reported in derived metrics.
pub const DEBT_RATIO_METRIC: &str = "debtRatio";

/// Stateless evaluator bound to one rule set.
#[derive(Debug, Clone)]
pub struct ScoreEvaluator {
    rule_set: Arc<ScoringRuleSet>,
}

impl ScoreEvaluator {
    pub fn new(rule_set: Arc<ScoringRuleSet>) -> Self {
        Self { rule_set }
    }

    pub fn rule_set(&self) -> &ScoringRuleSet {
        &self.rule_set
    }

    pub fn evaluate(&self, attributes: &FarmerAttributes) -> Evaluation {
        evaluate(attributes, &self.rule_set)
    }
}

/// Applies every factor rule in order and rates the total when the rule set can.
pub fn evaluate(attributes: &FarmerAttributes, rule_set: &ScoringRuleSet) -> Evaluation {
    let components: Vec<ScoreComponent> = rule_set
        .rules()
        .iter()
        .map(|rule| rules::score_factor(rule, attributes))
        .collect();
    let score = components.iter().map(|component| component.points).sum();
    let rating = rule_set
        .rating_policy()
        .rate(score, rule_set.total_weight());

    let mut derived_metrics = BTreeMap::new();
    if rule_set.uses_debt_ratio() {
        derived_metrics.insert(DEBT_RATIO_METRIC.to_string(), attributes.debt_ratio());
    }

    Evaluation {
        rule_set_version: rule_set.version().to_string(),
        score,
        rating,
        components,
        derived_metrics,
    }
}

/// Discrete contribution of one factor, kept for audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: Factor,
    pub points: i32,
    pub notes: String,
}

/// Pure outcome of applying a rule set to one attribute record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub rule_set_version: String,
    pub score: i32,
    pub rating: Option<CreditRating>,
    pub components: Vec<ScoreComponent>,
    pub derived_metrics: BTreeMap<String, f64>,
}
