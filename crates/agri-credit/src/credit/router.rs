use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{FarmerId, RawAttributes};
use super::eligibility::{loan_eligibility, rank_schemes, LoanEligibility, SchemeDescriptor};
use super::repository::{FarmerProfileSource, PersistenceGateway};
use super::result::{CreditScorePayload, EvaluationLogEntry};
use super::ruleset::RegistryError;
use super::service::{CreditScoringService, CreditServiceError};
use crate::error::AppError;

/// Body accepted by the scoring endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoreRequest {
    pub farmer_id: FarmerId,
    #[serde(default)]
    pub attributes: Option<RawAttributes>,
    #[serde(default)]
    pub rule_set_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemeRequest {
    pub schemes: Vec<SchemeDescriptor>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreditSummaryView {
    pub evaluation: EvaluationLogEntry,
    pub loan_eligibility: LoanEligibility,
}

/// Router builder exposing scoring, rule-set, and eligibility endpoints.
pub fn credit_router<S, P>(service: Arc<CreditScoringService<S, P>>) -> Router
where
    S: FarmerProfileSource + 'static,
    P: PersistenceGateway + 'static,
{
    Router::new()
        .route("/api/v1/credit/score", post(score_handler::<S, P>))
        .route("/api/v1/credit/rule-sets", get(rule_sets_handler::<S, P>))
        .route(
            "/api/v1/farmers/:farmer_id/credit",
            get(summary_handler::<S, P>),
        )
        .route(
            "/api/v1/farmers/:farmer_id/schemes",
            post(schemes_handler::<S, P>),
        )
        .with_state(service)
}

pub(crate) async fn score_handler<S, P>(
    State(service): State<Arc<CreditScoringService<S, P>>>,
    axum::Json(request): axum::Json<ScoreRequest>,
) -> Response
where
    S: FarmerProfileSource + 'static,
    P: PersistenceGateway + 'static,
{
    let ScoreRequest {
        farmer_id,
        attributes,
        rule_set_version,
    } = request;

    let outcome =
        service.calculate_with_version(&farmer_id, attributes, rule_set_version.as_deref());
    let status = match &outcome {
        Ok(_) => StatusCode::OK,
        Err(CreditServiceError::MissingData(_)) => StatusCode::NOT_FOUND,
        Err(CreditServiceError::Registry(RegistryError::UnknownVersion(_))) => {
            StatusCode::BAD_REQUEST
        }
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = CreditScorePayload::from_outcome(&outcome);
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn rule_sets_handler<S, P>(
    State(service): State<Arc<CreditScoringService<S, P>>>,
) -> Response
where
    S: FarmerProfileSource + 'static,
    P: PersistenceGateway + 'static,
{
    let payload = json!({
        "active": service.active_rule_set().version(),
        "rule_sets": service.rule_set_summaries(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn summary_handler<S, P>(
    State(service): State<Arc<CreditScoringService<S, P>>>,
    Path(farmer_id): Path<String>,
) -> Result<Response, AppError>
where
    S: FarmerProfileSource + 'static,
    P: PersistenceGateway + 'static,
{
    let id = FarmerId(farmer_id);
    let response = match service.latest_evaluation(&id)? {
        Some(evaluation) => {
            let view = CreditSummaryView {
                loan_eligibility: loan_eligibility(evaluation.credit_score),
                evaluation,
            };
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        None => not_evaluated(&id),
    };
    Ok(response)
}

pub(crate) async fn schemes_handler<S, P>(
    State(service): State<Arc<CreditScoringService<S, P>>>,
    Path(farmer_id): Path<String>,
    axum::Json(request): axum::Json<SchemeRequest>,
) -> Result<Response, AppError>
where
    S: FarmerProfileSource + 'static,
    P: PersistenceGateway + 'static,
{
    let id = FarmerId(farmer_id);
    let response = match service.latest_evaluation(&id)? {
        Some(evaluation) => {
            let matches = rank_schemes(
                evaluation.credit_score,
                &evaluation.input_data,
                request.schemes,
                request.limit,
            );
            let payload = json!({
                "farmer_id": id,
                "credit_score": evaluation.credit_score,
                "schemes": matches,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        None => not_evaluated(&id),
    };
    Ok(response)
}

fn not_evaluated(id: &FarmerId) -> Response {
    let payload = json!({
        "error": format!("no credit evaluation recorded for farmer '{id}'"),
    });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}
