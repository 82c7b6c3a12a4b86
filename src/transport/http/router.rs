use crate::app::{RecalculationReport, Strategy};
use crate::domain::{
    Dish, GeoPoint, Label, LabelRating, LabelsRating, PlatformRating, Restaurant,
    RestaurantDetail, Review, ReviewPage,
};
use crate::transport::http::handlers::{admin, foodtypes, health, restaurants};
use crate::transport::http::types::{ApiResponse, AppState, RestaurantList};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        restaurants::list_restaurants_handler,
        restaurants::search_restaurants_handler,
        restaurants::get_restaurant_handler,
        restaurants::get_menu_handler,
        restaurants::get_reviews_handler,
        foodtypes::list_food_types_handler,
        admin::recalculate_handler
    ),
    components(schemas(
        ApiResponse,
        RestaurantList,
        Restaurant,
        RestaurantDetail,
        Dish,
        PlatformRating,
        GeoPoint,
        Label,
        LabelRating,
        LabelsRating,
        Review,
        ReviewPage,
        Strategy,
        RecalculationReport
    ))
)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/api/v1/restaurants", get(restaurants::list_restaurants_handler))
        .route(
            "/api/v1/restaurants/search",
            get(restaurants::search_restaurants_handler),
        )
        .route("/api/v1/restaurants/:id", get(restaurants::get_restaurant_handler))
        .route("/api/v1/restaurants/:id/menu", get(restaurants::get_menu_handler))
        .route(
            "/api/v1/restaurants/:id/reviews",
            get(restaurants::get_reviews_handler),
        )
        .route("/api/v1/foodtypes", get(foodtypes::list_food_types_handler))
        .route("/api/v1/admin/recalculate", post(admin::recalculate_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
