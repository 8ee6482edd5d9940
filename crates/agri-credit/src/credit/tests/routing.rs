use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::credit::domain::FarmerId;
use crate::credit::router::ScoreRequest;
use crate::credit::{credit_router, CreditScoringService};

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serializable body")))
        .expect("valid request")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("valid request")
}

#[tokio::test]
async fn score_route_returns_payload_for_supplied_attributes() {
    let service = build_service(Arc::new(MemoryStore::default()));
    let router = credit_router_with_service(service);

    let body = json!({
        "farmer_id": "F-1",
        "attributes": serde_json::to_value(top_tier_request()).expect("raw attributes serialize"),
    });
    let response = router
        .oneshot(json_request("POST", "/api/v1/credit/score", body))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["score"], json!(66));
    assert_eq!(payload["rating"], json!("High Credit Rating"));
    assert_eq!(payload["details"]["repaymentHistory"], json!("no_default"));
    assert!(payload.get("error").is_none());
}

#[tokio::test]
async fn score_route_reports_missing_profiles_as_not_found() {
    let service = build_service(Arc::new(MemoryStore::default()));
    let router = credit_router_with_service(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/credit/score",
            json!({ "farmer_id": "ghost" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(false));
    assert!(payload["error"]
        .as_str()
        .is_some_and(|message| message.contains("ghost")));
}

#[tokio::test]
async fn score_route_rejects_unknown_versions() {
    let service = build_service(Arc::new(MemoryStore::default()));
    let router = credit_router_with_service(service);

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/credit/score",
            json!({ "farmer_id": "F-1", "attributes": {}, "rule_set_version": "3.0" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn score_handler_keeps_score_when_persistence_fails() {
    let service = Arc::new(
        CreditScoringService::new(
            Arc::new(MemoryStore::default()),
            Arc::new(FailingGateway::score_update_offline()),
            registry(),
            "1.0",
        )
        .expect("active version registered"),
    );

    let response = crate::credit::router::score_handler::<MemoryStore, FailingGateway>(
        State(service),
        axum::Json(ScoreRequest {
            farmer_id: FarmerId::from("F-9"),
            attributes: Some(top_tier_request()),
            rule_set_version: None,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(false));
    assert_eq!(payload["score"], json!(66));
    assert!(payload["error"].is_string());
}

#[tokio::test]
async fn summary_handler_reports_lookup_failures_as_server_errors() {
    let service = Arc::new(
        CreditScoringService::new(
            Arc::new(MemoryStore::default()),
            Arc::new(FailingGateway::default()),
            registry(),
            "1.0",
        )
        .expect("active version registered"),
    );

    let response = crate::credit::router::summary_handler::<MemoryStore, FailingGateway>(
        State(service),
        axum::extract::Path("F-9".to_string()),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["error"],
        json!("evaluation error: evaluation lookup failed: store unavailable: database offline")
    );
}

#[tokio::test]
async fn rule_sets_route_lists_registered_versions() {
    let service = build_service(Arc::new(MemoryStore::default()));
    let router = credit_router_with_service(service);

    let response = router
        .oneshot(get_request("/api/v1/credit/rule-sets"))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["active"], json!("1.0"));
    let versions: Vec<&str> = payload["rule_sets"]
        .as_array()
        .expect("array of summaries")
        .iter()
        .filter_map(|summary| summary["version"].as_str())
        .collect();
    assert_eq!(versions, vec!["1.0", "2.0", "2.1"]);
}

#[tokio::test]
async fn credit_summary_requires_a_recorded_evaluation() {
    let store = Arc::new(MemoryStore::default());
    let service = Arc::new(build_points_service(store));
    let router = credit_router(service.clone());

    let missing = router
        .clone()
        .oneshot(get_request("/api/v1/farmers/F-2/credit"))
        .await
        .expect("router responds");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    service
        .calculate_credit_score(&FarmerId::from("F-2"), Some(prime_points_request()))
        .expect("scoring succeeds");

    let response = router
        .oneshot(get_request("/api/v1/farmers/F-2/credit"))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["evaluation"]["credit_score"], json!(850));
    assert_eq!(payload["loan_eligibility"]["status"], json!("Eligible"));
    assert_eq!(payload["loan_eligibility"]["maxAmount"], json!(1_000_000));
    assert_eq!(payload["loan_eligibility"]["interestRatePercent"], json!(8));
}

#[tokio::test]
async fn scheme_route_ranks_matches_from_latest_evaluation() {
    let store = Arc::new(MemoryStore::default());
    let service = Arc::new(build_points_service(store));
    service
        .calculate_credit_score(&FarmerId::from("F-3"), Some(prime_points_request()))
        .expect("scoring succeeds");
    let router = credit_router(service);

    let body = json!({
        "schemes": [
            { "id": "seed", "name": "Seed Subsidy", "category": "Inputs" },
            { "id": "kcc", "name": "Kisan Credit Card", "category": "Credit" },
            { "id": "drip", "name": "Drip Irrigation", "category": "Infrastructure" },
        ],
        "limit": 2,
    });
    let response = router
        .oneshot(json_request("POST", "/api/v1/farmers/F-3/schemes", body))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let schemes = payload["schemes"].as_array().expect("scheme list");
    assert_eq!(schemes.len(), 2);
    assert_eq!(schemes[0]["scheme"]["id"], json!("kcc"));
    assert_eq!(schemes[0]["eligibility_score"], json!(75));
    assert_eq!(schemes[0]["level"], json!("High"));
    assert_eq!(schemes[1]["scheme"]["id"], json!("drip"));
}
