use crate::cli::ServeArgs;
use crate::commands::import_profiles;
use crate::infra::{build_scoring_service, AppState, InMemoryFarmerStore};
use crate::routes::with_credit_routes;
use agri_credit::config::AppConfig;
use agri_credit::error::AppError;
use agri_credit::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let store = Arc::new(InMemoryFarmerStore::default());
    if let Some(path) = args.profiles.take() {
        let imported = import_profiles(&store, &path)?;
        info!(profiles = imported.len(), path = %path.display(), "seeded farmer profiles");
    }
    let scoring_service = Arc::new(build_scoring_service(
        store.clone(),
        &config.scoring.rule_set_version,
    )?);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        store,
        rule_set_version: config.scoring.rule_set_version.clone(),
    };

    let app = with_credit_routes(scoring_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        rule_set = %config.scoring.rule_set_version,
        "credit scoring service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
