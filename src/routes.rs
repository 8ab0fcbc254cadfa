//! HTTP surface: router, handlers and error mapping.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::api::{
    CodeChangesRequest, CompletionResponse, FixIssueRequest, FixerService, GenerateFilesRequest,
    GenerateFilesResponse, HealthResponse,
};
use crate::error::ServiceError;

/// Body of `GET /`
pub const GREETING: &str = "Hello! Thank you for checking out. I am working !!";

const SUPERSEDED_MESSAGE: &str = "Request superseded by a newer request for the same repository";
const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    service: Arc<FixerService>,
}

/// Builds the router with all routes and middleware
pub fn create_app(service: Arc<FixerService>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/generate-files", post(generate_files))
        .route("/code-changes", post(code_changes))
        .route("/fix-issue", post(fix_issue))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}

/// A [`ServiceError`] rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ServiceError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            err if err.is_client_error() => (StatusCode::BAD_REQUEST, err.to_string()),
            ServiceError::Superseded(_) => (StatusCode::CONFLICT, SUPERSEDED_MESSAGE.to_string()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string()),
        };

        if status.is_server_error() {
            error!("Request failed (transient: {}): {}", self.0.is_transient(), self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Liveness string
async fn index() -> Json<&'static str> {
    Json(GREETING)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.service.health().await)
}

/// Clone, serialize and persist a repository
async fn generate_files(
    State(state): State<AppState>,
    payload: Result<Json<GenerateFilesRequest>, JsonRejection>,
) -> Result<Json<GenerateFilesResponse>, ApiError> {
    let Json(request) = payload?;
    info!("generate-files: {}/{}", request.repo_owner, request.repo_name);
    Ok(Json(state.service.generate_files(request).await?))
}

/// Request changes to an already serialized repository
async fn code_changes(
    State(state): State<AppState>,
    payload: Result<Json<CodeChangesRequest>, JsonRejection>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let Json(request) = payload?;
    info!("code-changes: {} issues supplied", request.issues.len());
    Ok(Json(state.service.code_changes(request).await?))
}

/// Clone a repository and request a fix
async fn fix_issue(
    State(state): State<AppState>,
    payload: Result<Json<FixIssueRequest>, JsonRejection>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let Json(request) = payload?;
    info!("fix-issue: {}", request.github_repo_url);
    Ok(Json(state.service.fix_issue(request).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(ServiceError::Validation("bad".into()), StatusCode::BAD_REQUEST)]
    #[test_case(ServiceError::Superseded("x".into()), StatusCode::CONFLICT)]
    #[test_case(ServiceError::Completion("quota".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[test_case(ServiceError::Clone("exit 128".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_error_status(err: ServiceError, expected: StatusCode) {
        assert_eq!(ApiError(err).into_response().status(), expected);
    }
}
