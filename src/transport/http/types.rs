use crate::app::{RecalculationPipeline, RestaurantService};
use crate::domain::Restaurant;
use crate::error::ServiceError;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Clone)]
pub struct AppState {
    pub service: RestaurantService,
    pub pipeline: Arc<RecalculationPipeline>,
}

/// Envelope for every JSON response.
#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    /// 200 with `data` serialized into the envelope.
    pub fn ok<T: Serialize>(message: impl Into<String>, data: &T) -> Response {
        match serde_json::to_value(data) {
            Ok(value) => (
                StatusCode::OK,
                Json(ApiResponse {
                    success: true,
                    message: message.into(),
                    data: Some(value),
                    error: None,
                }),
            )
                .into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response body");
                Self::failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    "response serialization failed",
                )
            }
        }
    }

    pub fn failure(status: StatusCode, message: impl Into<String>, error: impl Into<String>) -> Response {
        (
            status,
            Json(ApiResponse {
                success: false,
                message: message.into(),
                data: None,
                error: Some(error.into()),
            }),
        )
            .into_response()
    }

    pub fn bad_request(error: impl Into<String>) -> Response {
        Self::failure(StatusCode::BAD_REQUEST, "Invalid request", error)
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::NotFound(what) => {
                ApiResponse::failure(StatusCode::NOT_FOUND, "Not found", format!("{what} not found"))
            }
            ServiceError::Validation(msg) => ApiResponse::bad_request(msg),
            ServiceError::Storage(e) => {
                // Database text stays in the logs.
                tracing::error!(error = %e, "Storage failure while serving request");
                ApiResponse::failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    "storage failure",
                )
            }
        }
    }
}

pub fn query_400(err: QueryRejection) -> Response {
    ApiResponse::bad_request(format!("Invalid query string: {}", err.body_text()))
}

/// Listing filters. Values arrive as raw strings and are parsed by the handler
/// so malformed numbers can be answered with a 400 naming the parameter.
#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RestaurantListQuery {
    /// Latitude of the search origin. Geo ordering needs both lat and lng non-zero.
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub food_type: Option<String>,
    pub city_id: Option<String>,
    pub district_id: Option<String>,
    /// 1-based page of 10 rows. Wins over `limit`.
    pub page: Option<String>,
    /// Row cap when no page is given. Invalid values fall back to 30.
    pub limit: Option<String>,
    /// Include the total match count.
    pub count: Option<String>,
}

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Words that must all appear in the restaurant name.
    pub query: Option<String>,
    /// Defaults to 10.
    pub limit: Option<String>,
}

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OriginQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
}

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReviewsQuery {
    /// One of ambience, delivery, food, price, service.
    pub label: Option<String>,
    /// Defaults to 1.
    pub page: Option<String>,
    /// Include the total review count. Defaults to true.
    pub count: Option<String>,
    /// Only reviews with written feedback.
    pub text_only: Option<String>,
}

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecalculateQuery {
    /// `workers` (default) or `bulk`.
    pub strategy: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct RestaurantList {
    pub restaurants: Vec<Restaurant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
}
