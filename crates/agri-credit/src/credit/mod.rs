//! Credit scoring for smallholder farmers.
//!
//! Raw attribute payloads are normalized against the conventions of a versioned
//! [`ScoringRuleSet`], scored by the [`ScoreEvaluator`], and packaged into an
//! [`EvaluationResult`] that the [`CreditScoringService`] hands to the persistence
//! collaborators before returning it.

pub mod domain;
pub mod eligibility;
pub(crate) mod evaluation;
pub mod import;
pub mod normalizer;
pub mod repository;
pub mod result;
pub mod router;
pub mod ruleset;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{AttributeOrigin, FarmerAttributes, FarmerId, RawAttributes};
pub use eligibility::{
    loan_eligibility, rank_schemes, scheme_eligibility_score, LoanEligibility, MatchLevel,
    SchemeCategory, SchemeDescriptor, SchemeMatch,
};
pub use evaluation::{
    evaluate, CreditRating, Evaluation, RatingPolicy, ScoreComponent, ScoreEvaluator,
    DEBT_RATIO_METRIC,
};
pub use import::{FarmerCsvImporter, ImportError};
pub use normalizer::AttributeNormalizer;
pub use repository::{FarmerProfileSource, PersistenceError, PersistenceGateway};
pub use result::{CreditScorePayload, EvaluationLogEntry, EvaluationResult, ScoreDetails};
pub use router::{credit_router, ScoreRequest};
pub use ruleset::{
    Factor, FactorRule, RegistryError, RuleSetError, RuleSetRegistry, RuleSetSummary,
    ScoringFamily, ScoringRuleSet, ScoringRuleSetBuilder, POINTS_V2, POINTS_V2_1, WEIGHTED_V1,
};
pub use service::{CreditScoringService, CreditServiceError};
