//! REST API handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::state::AppState;
use crate::pipeline::{QueryRequest, QueryResponse};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub provider_configured: bool,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.model.clone(),
        provider_configured: state.provider_configured,
    })
}

/// Translate a prompt to SQL, run it, and return the outcome.
///
/// Application-level failures are reported in the body's `error` field with a
/// 200 status. So are bodies whose fields have the wrong types; bodies that are
/// not JSON at all keep the extractor's 4xx status but still get a JSON error.
pub async fn query(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return rejected_body(rejection),
    };

    tracing::info!(
        database = req.connection.as_ref().map(|c| c.database.as_str()).unwrap_or(""),
        "Handling query request"
    );
    Json(state.pipeline.run(&req).await).into_response()
}

fn rejected_body(rejection: JsonRejection) -> Response {
    tracing::warn!(status = %rejection.status(), "Rejected request body: {}", rejection.body_text());

    match rejection {
        JsonRejection::JsonDataError(e) => (
            StatusCode::OK,
            Json(QueryResponse::failed(format!("Server error: {}", e.body_text()))),
        )
            .into_response(),
        other => (other.status(), Json(QueryResponse::failed(other.body_text()))).into_response(),
    }
}
