use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::credit::domain::{FarmerId, RawAttributes};
use crate::credit::repository::{FarmerProfileSource, PersistenceError, PersistenceGateway};
use crate::credit::result::{EvaluationLogEntry, EvaluationResult};
use crate::credit::ruleset::{RuleSetRegistry, ScoringRuleSet, POINTS_V2, WEIGHTED_V1};
use crate::credit::{credit_router, CreditScoringService};

pub(super) fn registry() -> Arc<RuleSetRegistry> {
    Arc::new(RuleSetRegistry::standard().expect("standard registry builds"))
}

pub(super) fn rule_set(version: &str) -> Arc<ScoringRuleSet> {
    registry().get(version).expect("version registered")
}

/// Every factor in its top bucket under version 1.0.
pub(super) fn top_tier_request() -> RawAttributes {
    RawAttributes::default()
        .with("landHolding", 12)
        .with("cropType", "cash_crop")
        .with("annualIncome", 12)
        .with("existingLoans", 0)
        .with("repaymentHistory", "no_default")
        .with("cropYield", 30)
        .with("irrigationSource", "full")
        .with("farmingExperience", 12)
}

/// Same farmer as stored by the profile store: income in rupees, raw crop name.
pub(super) fn top_tier_profile() -> RawAttributes {
    RawAttributes::default()
        .with("land_holding", "12")
        .with("primary_crop", "Cotton")
        .with("annual_income", "1200000")
        .with("existing_loans", "0")
        .with("repayment_history", "no_default")
        .with("crop_yield", "30")
        .with("irrigation_source", "full")
        .with("farming_experience", "12")
}

/// Scores 850 under version 2.0.
pub(super) fn prime_points_request() -> RawAttributes {
    RawAttributes::default()
        .with("landHolding", 12)
        .with("annualIncome", 600_000)
        .with("farmingExperience", 20)
        .with("repaymentHistory", "excellent")
        .with("cropYield", 35)
}

pub(super) fn build_service(
    store: Arc<MemoryStore>,
) -> CreditScoringService<MemoryStore, MemoryStore> {
    CreditScoringService::new(store.clone(), store, registry(), WEIGHTED_V1)
        .expect("active version registered")
}

pub(super) fn build_points_service(
    store: Arc<MemoryStore>,
) -> CreditScoringService<MemoryStore, MemoryStore> {
    CreditScoringService::new(store.clone(), store, registry(), POINTS_V2)
        .expect("active version registered")
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    profiles: Arc<Mutex<HashMap<FarmerId, RawAttributes>>>,
    scores: Arc<Mutex<HashMap<FarmerId, i32>>>,
    log: Arc<Mutex<Vec<EvaluationLogEntry>>>,
}

impl MemoryStore {
    pub(super) fn with_profile(self, id: &str, raw: RawAttributes) -> Self {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(FarmerId::from(id), raw);
        self
    }

    pub(super) fn current_score(&self, id: &str) -> Option<i32> {
        self.scores
            .lock()
            .expect("score mutex poisoned")
            .get(&FarmerId::from(id))
            .copied()
    }

    pub(super) fn log(&self) -> Vec<EvaluationLogEntry> {
        self.log.lock().expect("log mutex poisoned").clone()
    }
}

impl FarmerProfileSource for MemoryStore {
    fn fetch_profile(
        &self,
        farmer_id: &FarmerId,
    ) -> Result<Option<RawAttributes>, PersistenceError> {
        let guard = self.profiles.lock().expect("profile mutex poisoned");
        Ok(guard.get(farmer_id).cloned())
    }
}

impl PersistenceGateway for MemoryStore {
    fn update_current_score(
        &self,
        farmer_id: &FarmerId,
        score: i32,
    ) -> Result<(), PersistenceError> {
        self.scores
            .lock()
            .expect("score mutex poisoned")
            .insert(farmer_id.clone(), score);
        Ok(())
    }

    fn record_evaluation(
        &self,
        _farmer_id: &FarmerId,
        result: &EvaluationResult,
    ) -> Result<(), PersistenceError> {
        self.log
            .lock()
            .expect("log mutex poisoned")
            .push(result.log_entry());
        Ok(())
    }

    fn latest_evaluation(
        &self,
        farmer_id: &FarmerId,
    ) -> Result<Option<EvaluationLogEntry>, PersistenceError> {
        let guard = self.log.lock().expect("log mutex poisoned");
        Ok(guard
            .iter()
            .rev()
            .find(|entry| &entry.farmer_id == farmer_id)
            .cloned())
    }
}

/// Profile source whose backing store is offline.
pub(super) struct OfflineProfiles;

impl FarmerProfileSource for OfflineProfiles {
    fn fetch_profile(
        &self,
        _farmer_id: &FarmerId,
    ) -> Result<Option<RawAttributes>, PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }
}

/// Gateway that can fail either write and counts every attempt.
#[derive(Default)]
pub(super) struct FailingGateway {
    fail_score_update: bool,
    fail_record: bool,
    attempts: AtomicUsize,
}

impl FailingGateway {
    pub(super) fn score_update_offline() -> Self {
        Self {
            fail_score_update: true,
            ..Self::default()
        }
    }

    pub(super) fn log_rejecting() -> Self {
        Self {
            fail_record: true,
            ..Self::default()
        }
    }

    pub(super) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl PersistenceGateway for FailingGateway {
    fn update_current_score(
        &self,
        _farmer_id: &FarmerId,
        _score: i32,
    ) -> Result<(), PersistenceError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_score_update {
            return Err(PersistenceError::Unavailable("database offline".to_string()));
        }
        Ok(())
    }

    fn record_evaluation(
        &self,
        _farmer_id: &FarmerId,
        _result: &EvaluationResult,
    ) -> Result<(), PersistenceError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_record {
            return Err(PersistenceError::Rejected("log table locked".to_string()));
        }
        Ok(())
    }

    fn latest_evaluation(
        &self,
        _farmer_id: &FarmerId,
    ) -> Result<Option<EvaluationLogEntry>, PersistenceError> {
        Err(PersistenceError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn credit_router_with_service(
    service: CreditScoringService<MemoryStore, MemoryStore>,
) -> axum::Router {
    credit_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
