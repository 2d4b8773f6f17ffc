use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde::Serialize;
use serde_json::{json, Map, Value};
use vendor_mock_core::{
    Assessment, AssessmentResponse, CoreError, DueDiligenceCase, Vendor, VendorState,
};
use vendor_mock_store_memory::{
    MissingParentPolicy, RecordCounts, Repository, RepositoryConfig, StoreError, TransitionPolicy,
};

const OPENAPI_YAML: &str = include_str!("../../../openapi/openapi.yaml");

#[derive(Debug, Clone)]
struct ServiceState {
    repo: Arc<Repository>,
    vendors_per_state: usize,
    telemetry: Arc<ServiceTelemetry>,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceError {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

#[derive(Debug, Clone)]
struct ServiceFailure {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    records: RecordCounts,
    telemetry: ServiceTelemetrySnapshot,
    policies: PolicySnapshot,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PolicySnapshot {
    transition_policy: TransitionPolicy,
    missing_assessment: MissingParentPolicy,
    vendors_per_state: usize,
}

#[derive(Debug, Default)]
#[allow(clippy::struct_field_names)]
struct ServiceTelemetry {
    requests_total: AtomicU64,
    requests_success_total: AtomicU64,
    requests_failure_total: AtomicU64,
    invalid_json_total: AtomicU64,
    not_found_total: AtomicU64,
    transition_rejected_total: AtomicU64,
    internal_error_total: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
#[allow(clippy::struct_field_names)]
struct ServiceTelemetrySnapshot {
    requests_total: u64,
    requests_success_total: u64,
    requests_failure_total: u64,
    invalid_json_total: u64,
    not_found_total: u64,
    transition_rejected_total: u64,
    internal_error_total: u64,
}

fn transition_policy_arg(value: &str) -> Result<TransitionPolicy, String> {
    TransitionPolicy::parse(value)
        .ok_or_else(|| format!("unknown transition policy `{value}` (permissive|strict)"))
}

fn missing_assessment_arg(value: &str) -> Result<MissingParentPolicy, String> {
    MissingParentPolicy::parse(value)
        .ok_or_else(|| format!("unknown missing-assessment policy `{value}` (reject|lenient)"))
}

#[derive(Debug, Parser)]
#[command(name = "vendor-mock-service")]
#[command(about = "Mock vendor onboarding, due-diligence and TPRM assessment API")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,
    /// Fixed seed for reproducible fake data.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value = "permissive", value_parser = transition_policy_arg)]
    transition_policy: TransitionPolicy,
    /// What a response submission does when its assessment is unknown.
    #[arg(long, default_value = "reject", value_parser = missing_assessment_arg)]
    missing_assessment: MissingParentPolicy,
    #[arg(long, default_value_t = 3)]
    vendors_per_state: usize,
}

impl IntoResponse for ServiceFailure {
    fn into_response(self) -> Response {
        let payload = ServiceError { error: self.message, code: self.code, details: self.details };
        (self.status, Json(payload)).into_response()
    }
}

impl ServiceState {
    fn new(config: RepositoryConfig, vendors_per_state: usize) -> Self {
        Self {
            repo: Arc::new(Repository::new(config)),
            vendors_per_state,
            telemetry: Arc::new(ServiceTelemetry::default()),
        }
    }

    fn failure(
        status: StatusCode,
        code: &'static str,
        message: impl Into<String>,
        details: Option<Value>,
    ) -> ServiceFailure {
        ServiceFailure { status, code, message: message.into(), details }
    }

    fn invalid_json(&self, rejection: &JsonRejection) -> ServiceFailure {
        self.telemetry.record_failure("invalid_json");
        tracing::warn!(status = %rejection.status(), error = %rejection, "request body rejected");
        Self::failure(
            rejection.status(),
            "invalid_json",
            rejection.body_text(),
            Some(json!({"rejection": rejection.to_string()})),
        )
    }

    fn classify_store_error(err: &StoreError) -> ServiceFailure {
        let message = err.to_string();
        match err {
            StoreError::AssessmentNotFound(id) => Self::failure(
                StatusCode::NOT_FOUND,
                "assessment_not_found",
                message,
                Some(json!({"assessmentId": id})),
            ),
            StoreError::AssessmentResponseNotFound(id) => Self::failure(
                StatusCode::NOT_FOUND,
                "assessment_response_not_found",
                message,
                Some(json!({"responseId": id})),
            ),
            StoreError::Lifecycle(CoreError::UnknownState(state)) => Self::failure(
                StatusCode::UNPROCESSABLE_ENTITY,
                "unknown_state",
                message,
                Some(json!({
                    "state": state,
                    "knownStates": VendorState::ALL.map(VendorState::as_str),
                })),
            ),
            StoreError::Lifecycle(CoreError::IllegalTransition { from, to }) => {
                let allowed: Vec<&str> = VendorState::parse(from)
                    .map(|state| state.successors().iter().map(|next| next.as_str()).collect())
                    .unwrap_or_default();
                Self::failure(
                    StatusCode::CONFLICT,
                    "illegal_transition",
                    message,
                    Some(json!({"from": from, "to": to, "allowed": allowed})),
                )
            }
            StoreError::Lifecycle(CoreError::Timestamp(_)) => {
                Self::failure(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message, None)
            }
        }
    }

    fn finish<T>(&self, result: Result<T, StoreError>) -> Result<Json<T>, ServiceFailure> {
        match result {
            Ok(value) => {
                self.telemetry.record_success();
                Ok(Json(value))
            }
            Err(err) => {
                let failure = Self::classify_store_error(&err);
                self.telemetry.record_failure(failure.code);
                tracing::warn!(code = failure.code, error = %err, "request failed");
                Err(failure)
            }
        }
    }

    fn policies(&self) -> PolicySnapshot {
        let config = self.repo.config();
        PolicySnapshot {
            transition_policy: config.transition_policy,
            missing_assessment: config.missing_parent_policy,
            vendors_per_state: self.vendors_per_state,
        }
    }
}

impl ServiceTelemetry {
    fn record_success(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.requests_success_total.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self, code: &str) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.requests_failure_total.fetch_add(1, Ordering::Relaxed);
        let counter = match code {
            "invalid_json" => &self.invalid_json_total,
            "not_found" | "assessment_not_found" | "assessment_response_not_found" => {
                &self.not_found_total
            }
            "illegal_transition" | "unknown_state" => &self.transition_rejected_total,
            _ => &self.internal_error_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ServiceTelemetrySnapshot {
        ServiceTelemetrySnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_success_total: self.requests_success_total.load(Ordering::Relaxed),
            requests_failure_total: self.requests_failure_total.load(Ordering::Relaxed),
            invalid_json_total: self.invalid_json_total.load(Ordering::Relaxed),
            not_found_total: self.not_found_total.load(Ordering::Relaxed),
            transition_rejected_total: self.transition_rejected_total.load(Ordering::Relaxed),
            internal_error_total: self.internal_error_total.load(Ordering::Relaxed),
        }
    }
}

fn app(state: ServiceState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/openapi.yaml", get(openapi))
        .route("/api/v1/vendors/:id", get(vendor_show))
        .route("/api/v1/vendors/state/:state", get(vendors_by_state))
        .route("/api/v1/vendors/:id/state", post(vendor_update_state))
        .route("/api/v1/due-diligence/vendor/:vendor_id", get(due_diligence_show))
        .route("/api/v1/assessments/tprm-a", post(assessment_create))
        .route("/api/v1/assessments/:id", get(assessment_show))
        .route("/api/v1/assessments/:id/response", post(assessment_submit_response))
        .route("/api/v1/assessments/responses/:response_id", get(assessment_response_show))
        .fallback(route_not_found)
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = RepositoryConfig {
        seed: args.seed,
        transition_policy: args.transition_policy,
        missing_parent_policy: args.missing_assessment,
    };
    let state = ServiceState::new(config, args.vendors_per_state);

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(
        bind = %args.bind,
        transition_policy = config.transition_policy.as_str(),
        missing_assessment = config.missing_parent_policy.as_str(),
        seeded = config.seed.is_some(),
        "vendor-mock-service v{} listening",
        env!("CARGO_PKG_VERSION")
    );
    axum::serve(listener, app(state)).with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("vendor-mock-service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

async fn route_not_found(State(state): State<ServiceState>, uri: Uri) -> ServiceFailure {
    state.telemetry.record_failure("not_found");
    tracing::warn!(path = uri.path(), "no route");
    ServiceState::failure(
        StatusCode::NOT_FOUND,
        "not_found",
        "Not found",
        Some(json!({"path": uri.path()})),
    )
}

async fn root() -> Json<Value> {
    Json(json!({"status": "API is running"}))
}

async fn health(State(state): State<ServiceState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        records: state.repo.counts(),
        telemetry: state.telemetry.snapshot(),
        policies: state.policies(),
    })
}

async fn openapi() -> impl IntoResponse {
    (StatusCode::OK, [("content-type", "application/yaml; charset=utf-8")], OPENAPI_YAML)
}

async fn vendor_show(
    State(state): State<ServiceState>,
    Path(id): Path<String>,
) -> Result<Json<Vendor>, ServiceFailure> {
    state.finish(Ok(state.repo.vendor_or_create(&id)))
}

async fn vendors_by_state(
    State(state): State<ServiceState>,
    Path(vendor_state): Path<String>,
) -> Result<Json<Vec<Vendor>>, ServiceFailure> {
    state.finish(Ok(state.repo.vendors_in_state(&vendor_state, state.vendors_per_state)))
}

async fn vendor_update_state(
    State(state): State<ServiceState>,
    Path(id): Path<String>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<Vendor>, ServiceFailure> {
    let Json(payload) = payload.map_err(|rejection| state.invalid_json(&rejection))?;
    state.finish(state.repo.update_vendor_state(&id, &payload))
}

async fn due_diligence_show(
    State(state): State<ServiceState>,
    Path(vendor_id): Path<String>,
) -> Result<Json<DueDiligenceCase>, ServiceFailure> {
    state.finish(Ok(state.repo.due_diligence_for_vendor(&vendor_id)))
}

async fn assessment_create(
    State(state): State<ServiceState>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<Assessment>, ServiceFailure> {
    let Json(payload) = payload.map_err(|rejection| state.invalid_json(&rejection))?;
    state.finish(Ok(state.repo.create_assessment(payload)))
}

async fn assessment_show(
    State(state): State<ServiceState>,
    Path(id): Path<String>,
) -> Result<Json<Assessment>, ServiceFailure> {
    let result = state.repo.assessment(&id).ok_or(StoreError::AssessmentNotFound(id));
    state.finish(result)
}

async fn assessment_submit_response(
    State(state): State<ServiceState>,
    Path(id): Path<String>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<AssessmentResponse>, ServiceFailure> {
    let Json(payload) = payload.map_err(|rejection| state.invalid_json(&rejection))?;
    state.finish(state.repo.submit_response(&id, payload))
}

async fn assessment_response_show(
    State(state): State<ServiceState>,
    Path(response_id): Path<String>,
) -> Result<Json<AssessmentResponse>, ServiceFailure> {
    state.finish(state.repo.assessment_response(&response_id))
}
