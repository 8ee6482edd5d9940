use agri_credit::credit::{
    CreditScoringService, EvaluationLogEntry, EvaluationResult, FarmerId, FarmerProfileSource,
    PersistenceError, PersistenceGateway, RawAttributes, RuleSetRegistry,
};
use agri_credit::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared by the operational endpoints mounted beside the credit routes.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) store: Arc<InMemoryFarmerStore>,
    pub(crate) rule_set_version: String,
}

/// Process-local stand-in for the profile database and the evaluation log.
#[derive(Default, Clone)]
pub(crate) struct InMemoryFarmerStore {
    profiles: Arc<Mutex<HashMap<FarmerId, RawAttributes>>>,
    scores: Arc<Mutex<HashMap<FarmerId, i32>>>,
    evaluations: Arc<Mutex<Vec<EvaluationLogEntry>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, PersistenceError> {
    mutex
        .lock()
        .map_err(|_| PersistenceError::Unavailable("store mutex poisoned".to_string()))
}

impl InMemoryFarmerStore {
    pub(crate) fn load_profiles(
        &self,
        profiles: impl IntoIterator<Item = (FarmerId, RawAttributes)>,
    ) -> Result<usize, PersistenceError> {
        let mut guard = lock(&self.profiles)?;
        let before = guard.len();
        guard.extend(profiles);
        Ok(guard.len() - before)
    }

    pub(crate) fn profile_count(&self) -> Result<usize, PersistenceError> {
        Ok(lock(&self.profiles)?.len())
    }

    pub(crate) fn current_score(
        &self,
        farmer_id: &FarmerId,
    ) -> Result<Option<i32>, PersistenceError> {
        Ok(lock(&self.scores)?.get(farmer_id).copied())
    }
}

impl FarmerProfileSource for InMemoryFarmerStore {
    fn fetch_profile(
        &self,
        farmer_id: &FarmerId,
    ) -> Result<Option<RawAttributes>, PersistenceError> {
        Ok(lock(&self.profiles)?.get(farmer_id).cloned())
    }
}

impl PersistenceGateway for InMemoryFarmerStore {
    fn update_current_score(
        &self,
        farmer_id: &FarmerId,
        score: i32,
    ) -> Result<(), PersistenceError> {
        lock(&self.scores)?.insert(farmer_id.clone(), score);
        Ok(())
    }

    fn record_evaluation(
        &self,
        _farmer_id: &FarmerId,
        result: &EvaluationResult,
    ) -> Result<(), PersistenceError> {
        lock(&self.evaluations)?.push(result.log_entry());
        Ok(())
    }

    fn latest_evaluation(
        &self,
        farmer_id: &FarmerId,
    ) -> Result<Option<EvaluationLogEntry>, PersistenceError> {
        Ok(lock(&self.evaluations)?
            .iter()
            .rev()
            .find(|entry| &entry.farmer_id == farmer_id)
            .cloned())
    }
}

pub(crate) type ScoringService = CreditScoringService<InMemoryFarmerStore, InMemoryFarmerStore>;

pub(crate) fn build_scoring_service(
    store: Arc<InMemoryFarmerStore>,
    active_version: &str,
) -> Result<ScoringService, AppError> {
    let registry = Arc::new(RuleSetRegistry::standard()?);
    let service = CreditScoringService::new(store.clone(), store, registry, active_version)?;
    Ok(service)
}
