use crate::app::Strategy;
use crate::transport::http::types::{query_400, ApiResponse, AppState, RecalculateQuery};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};

/// Runs a recalculation synchronously and returns its report.
#[utoipa::path(
    post,
    path = "/api/v1/admin/recalculate",
    params(RecalculateQuery),
    responses(
        (status = 200, description = "Recalculation finished", body = ApiResponse),
        (status = 400, description = "Unknown strategy", body = ApiResponse),
        (status = 500, description = "Restaurants could not be enumerated", body = ApiResponse)
    )
)]
pub async fn recalculate_handler(
    State(state): State<AppState>,
    query: Result<Query<RecalculateQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(v) => v,
        Err(e) => return query_400(e),
    };
    let strategy = match q.strategy.as_deref() {
        None => Strategy::default(),
        Some(raw) => match raw.parse::<Strategy>() {
            Ok(s) => s,
            Err(e) => return ApiResponse::bad_request(e),
        },
    };

    match state.pipeline.run(strategy).await {
        Ok(report) => ApiResponse::ok("Recalculation finished", &report),
        Err(e) => e.into_response(),
    }
}
