use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use super::domain::{AttributeOrigin, FarmerId, RawAttributes};
use super::evaluation::ScoreEvaluator;
use super::normalizer::AttributeNormalizer;
use super::repository::{FarmerProfileSource, PersistenceError, PersistenceGateway};
use super::result::{EvaluationLogEntry, EvaluationResult};
use super::ruleset::{RegistryError, RuleSetRegistry, RuleSetSummary, ScoringRuleSet};

/// Orchestrates fetch, normalization, evaluation, and persistence for one farmer.
pub struct CreditScoringService<S, P> {
    profiles: Arc<S>,
    gateway: Arc<P>,
    registry: Arc<RuleSetRegistry>,
    active: Arc<ScoringRuleSet>,
}

impl<S, P> CreditScoringService<S, P>
where
    S: FarmerProfileSource + 'static,
    P: PersistenceGateway + 'static,
{
    /// Fails when `active_version` is not registered.
    pub fn new(
        profiles: Arc<S>,
        gateway: Arc<P>,
        registry: Arc<RuleSetRegistry>,
        active_version: &str,
    ) -> Result<Self, RegistryError> {
        let active = registry.get(active_version)?;
        Ok(Self {
            profiles,
            gateway,
            registry,
            active,
        })
    }

    pub fn active_rule_set(&self) -> &ScoringRuleSet {
        &self.active
    }

    pub fn rule_set_summaries(&self) -> Vec<RuleSetSummary> {
        self.registry.summaries()
    }

    /// Scores a farmer with the active rule set.
    ///
    /// When `raw` is `None` the attributes are fetched from the profile source.
    pub fn calculate_credit_score(
        &self,
        farmer_id: &FarmerId,
        raw: Option<RawAttributes>,
    ) -> Result<EvaluationResult, CreditServiceError> {
        self.calculate_with_version(farmer_id, raw, None)
    }

    /// Same as [`Self::calculate_credit_score`] with an explicit rule-set version.
    pub fn calculate_with_version(
        &self,
        farmer_id: &FarmerId,
        raw: Option<RawAttributes>,
        version: Option<&str>,
    ) -> Result<EvaluationResult, CreditServiceError> {
        let rule_set = match version {
            Some(version) => self.registry.get(version)?,
            None => self.active.clone(),
        };

        let (raw, origin) = match raw {
            Some(raw) => (raw, AttributeOrigin::EvaluationRequest),
            None => (self.fetch_profile(farmer_id)?, AttributeOrigin::ProfileRecord),
        };

        let attributes = AttributeNormalizer::for_rule_set(&rule_set).normalize(&raw, origin);
        let evaluation = ScoreEvaluator::new(rule_set).evaluate(&attributes);
        let result = EvaluationResult::new(farmer_id.clone(), attributes, evaluation, Utc::now());

        info!(
            farmer_id = %farmer_id,
            rule_set = result.rule_set_version(),
            score = result.score(),
            rating = result.rating().map(|rating| rating.label()),
            "credit score computed"
        );

        self.persist(result)
    }

    pub fn latest_evaluation(
        &self,
        farmer_id: &FarmerId,
    ) -> Result<Option<EvaluationLogEntry>, CreditServiceError> {
        self.gateway
            .latest_evaluation(farmer_id)
            .map_err(CreditServiceError::Lookup)
    }

    fn fetch_profile(&self, farmer_id: &FarmerId) -> Result<RawAttributes, CreditServiceError> {
        match self.profiles.fetch_profile(farmer_id) {
            Ok(Some(raw)) => Ok(raw),
            Ok(None) => {
                warn!(farmer_id = %farmer_id, "no profile record for farmer");
                Err(CreditServiceError::MissingData(farmer_id.clone()))
            }
            Err(err) => {
                warn!(farmer_id = %farmer_id, error = %err, "profile source failed");
                Err(CreditServiceError::MissingData(farmer_id.clone()))
            }
        }
    }

    /// Attempts both writes; the first failure is reported with the result attached.
    fn persist(&self, result: EvaluationResult) -> Result<EvaluationResult, CreditServiceError> {
        let farmer_id = result.farmer_id();

        let score_update = self.gateway.update_current_score(farmer_id, result.score());
        if let Err(err) = &score_update {
            error!(farmer_id = %farmer_id, error = %err, "failed to update current score");
        }

        let recorded = self.gateway.record_evaluation(farmer_id, &result);
        if let Err(err) = &recorded {
            error!(farmer_id = %farmer_id, error = %err, "failed to record evaluation");
        }

        match score_update.and(recorded) {
            Ok(()) => Ok(result),
            Err(source) => Err(CreditServiceError::Persistence {
                source,
                evaluation: Box::new(result),
            }),
        }
    }
}

/// Error raised by the credit scoring service.
#[derive(Debug, thiserror::Error)]
pub enum CreditServiceError {
    #[error("no attribute data available for farmer '{0}'")]
    MissingData(FarmerId),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("credit score computed but not persisted: {source}")]
    Persistence {
        source: PersistenceError,
        evaluation: Box<EvaluationResult>,
    },
    #[error("evaluation lookup failed: {0}")]
    Lookup(#[source] PersistenceError),
}

impl CreditServiceError {
    /// The computed result, when scoring succeeded before the failure.
    pub fn evaluation(&self) -> Option<&EvaluationResult> {
        match self {
            CreditServiceError::Persistence { evaluation, .. } => Some(evaluation.as_ref()),
            _ => None,
        }
    }
}
