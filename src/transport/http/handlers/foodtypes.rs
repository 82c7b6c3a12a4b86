use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::State;
use axum::response::{IntoResponse, Response};

#[utoipa::path(
    get,
    path = "/api/v1/foodtypes",
    responses(
        (status = 200, description = "Distinct food type names", body = ApiResponse),
        (status = 500, description = "Internal server error", body = ApiResponse)
    )
)]
pub async fn list_food_types_handler(State(state): State<AppState>) -> Response {
    match state.service.food_types().await {
        Ok(names) => ApiResponse::ok("Food types fetched successfully", &names),
        Err(e) => e.into_response(),
    }
}
