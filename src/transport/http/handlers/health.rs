use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy (DB reachable)", body = ApiResponse),
        (status = 503, description = "Service is unhealthy (DB unreachable)", body = ApiResponse)
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> Response {
    match state.service.store().ping().await {
        Ok(()) => ApiResponse::ok("Service is healthy", &serde_json::json!({ "status": "ok" })),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            ApiResponse::failure(
                StatusCode::SERVICE_UNAVAILABLE,
                "Service is unhealthy",
                "database unreachable",
            )
        }
    }
}
