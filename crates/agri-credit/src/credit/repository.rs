use super::domain::{FarmerId, RawAttributes};
use super::result::{EvaluationLogEntry, EvaluationResult};

/// Lookup of stored farmer profiles, used when a caller supplies only an identifier.
pub trait FarmerProfileSource: Send + Sync {
    fn fetch_profile(&self, farmer_id: &FarmerId)
        -> Result<Option<RawAttributes>, PersistenceError>;
}

/// Storage collaborator for evaluation outcomes. Writes are best-effort relative to
/// scoring: the service reports a failure here without discarding the result.
pub trait PersistenceGateway: Send + Sync {
    fn update_current_score(&self, farmer_id: &FarmerId, score: i32)
        -> Result<(), PersistenceError>;
    fn record_evaluation(
        &self,
        farmer_id: &FarmerId,
        result: &EvaluationResult,
    ) -> Result<(), PersistenceError>;
    fn latest_evaluation(
        &self,
        farmer_id: &FarmerId,
    ) -> Result<Option<EvaluationLogEntry>, PersistenceError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    #[error("farmer record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("write rejected: {0}")]
    Rejected(String),
}
