use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{FarmerAttributes, FarmerId};
use super::evaluation::{CreditRating, Evaluation, ScoreComponent, DEBT_RATIO_METRIC};
use super::service::CreditServiceError;

/// Immutable record of one evaluation. Re-evaluating a farmer produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    farmer_id: FarmerId,
    score: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    rating: Option<CreditRating>,
    inputs: FarmerAttributes,
    rule_set_version: String,
    derived_metrics: BTreeMap<String, f64>,
    components: Vec<ScoreComponent>,
    evaluated_at: DateTime<Utc>,
}

impl EvaluationResult {
    pub fn new(
        farmer_id: FarmerId,
        inputs: FarmerAttributes,
        evaluation: Evaluation,
        evaluated_at: DateTime<Utc>,
    ) -> Self {
        let Evaluation {
            rule_set_version,
            score,
            rating,
            components,
            derived_metrics,
        } = evaluation;

        Self {
            farmer_id,
            score,
            rating,
            inputs,
            rule_set_version,
            derived_metrics,
            components,
            evaluated_at,
        }
    }

    pub fn farmer_id(&self) -> &FarmerId {
        &self.farmer_id
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn rating(&self) -> Option<CreditRating> {
        self.rating
    }

    pub fn inputs(&self) -> &FarmerAttributes {
        &self.inputs
    }

    pub fn rule_set_version(&self) -> &str {
        &self.rule_set_version
    }

    pub fn derived_metrics(&self) -> &BTreeMap<String, f64> {
        &self.derived_metrics
    }

    pub fn debt_ratio(&self) -> Option<f64> {
        self.derived_metrics.get(DEBT_RATIO_METRIC).copied()
    }

    pub fn components(&self) -> &[ScoreComponent] {
        &self.components
    }

    pub fn evaluated_at(&self) -> DateTime<Utc> {
        self.evaluated_at
    }

    /// Human-readable note stored alongside the persisted log entry.
    pub fn summary_note(&self) -> String {
        match self.rating {
            Some(rating) => format!("Automated evaluation: {}", rating.label()),
            None => format!(
                "Automated evaluation: score {} under rule set {}",
                self.score, self.rule_set_version
            ),
        }
    }

    pub fn log_entry(&self) -> EvaluationLogEntry {
        EvaluationLogEntry {
            farmer_id: self.farmer_id.clone(),
            credit_score: self.score,
            rating: self.rating,
            algorithm_version: self.rule_set_version.clone(),
            input_data: self.inputs.clone(),
            notes: self.summary_note(),
            created_at: self.evaluated_at,
        }
    }
}

/// Shape handed to the persistence collaborator's evaluation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationLogEntry {
    pub farmer_id: FarmerId,
    pub credit_score: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<CreditRating>,
    pub algorithm_version: String,
    pub input_data: FarmerAttributes,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Normalized inputs echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDetails {
    #[serde(flatten)]
    pub inputs: FarmerAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_ratio: Option<f64>,
}

impl From<&EvaluationResult> for ScoreDetails {
    fn from(result: &EvaluationResult) -> Self {
        Self {
            inputs: result.inputs.clone(),
            debt_ratio: result.debt_ratio(),
        }
    }
}

/// JSON payload returned by `calculate_credit_score` callers (HTTP and CLI).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditScorePayload {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<CreditRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_set_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ScoreDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CreditScorePayload {
    pub fn success(result: &EvaluationResult) -> Self {
        Self {
            success: true,
            score: Some(result.score),
            rating: result.rating,
            rule_set_version: Some(result.rule_set_version.clone()),
            details: Some(ScoreDetails::from(result)),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            score: None,
            rating: None,
            rule_set_version: None,
            details: None,
            error: Some(message.into()),
        }
    }

    /// A persistence failure keeps the computed score in the payload.
    pub fn from_outcome(outcome: &Result<EvaluationResult, CreditServiceError>) -> Self {
        match outcome {
            Ok(result) => Self::success(result),
            Err(error) => match error.evaluation() {
                Some(result) => Self {
                    success: false,
                    error: Some(error.to_string()),
                    ..Self::success(result)
                },
                None => Self::failure(error.to_string()),
            },
        }
    }
}
