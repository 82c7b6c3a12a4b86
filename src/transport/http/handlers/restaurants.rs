use crate::domain::FilterCriteria;
use crate::transport::http::handlers::common::{
    parse_flag, parse_limit, parse_origin, parse_page,
};
use crate::transport::http::types::{
    query_400, ApiResponse, AppState, OriginQuery, RestaurantList, RestaurantListQuery,
    ReviewsQuery, SearchQuery,
};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};

fn criteria_from(q: &RestaurantListQuery) -> Result<FilterCriteria, String> {
    Ok(FilterCriteria {
        origin: parse_origin(q.lat.as_deref(), q.lng.as_deref())?,
        food_type: q.food_type.clone(),
        city_id: q.city_id.clone(),
        district_id: q.district_id.clone(),
        page: parse_page(q.page.as_deref())?,
        limit: parse_limit(q.limit.as_deref()),
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/restaurants",
    params(RestaurantListQuery),
    responses(
        (status = 200, description = "Ranked page of restaurants", body = ApiResponse),
        (status = 400, description = "Malformed coordinates or page", body = ApiResponse),
        (status = 500, description = "Internal server error", body = ApiResponse)
    )
)]
pub async fn list_restaurants_handler(
    State(state): State<AppState>,
    query: Result<Query<RestaurantListQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(v) => v,
        Err(e) => return query_400(e),
    };

    let criteria = match criteria_from(&q) {
        Ok(c) => c,
        Err(e) => return ApiResponse::bad_request(e),
    };
    let want_count = match parse_flag("count", q.count.as_deref(), false) {
        Ok(v) => v,
        Err(e) => return ApiResponse::bad_request(e),
    };

    match state.service.search(&criteria, want_count).await {
        Ok((restaurants, total_count)) => ApiResponse::ok(
            "Restaurants fetched successfully",
            &RestaurantList {
                restaurants,
                total_count,
            },
        ),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/restaurants/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Restaurants whose name contains every word", body = ApiResponse),
        (status = 400, description = "Missing query", body = ApiResponse)
    )
)]
pub async fn search_restaurants_handler(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(v) => v,
        Err(e) => return query_400(e),
    };
    let text = match q.query.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => return ApiResponse::bad_request("query must not be empty"),
    };

    match state
        .service
        .autocomplete(&text, parse_limit(q.limit.as_deref()))
        .await
    {
        Ok(rows) => ApiResponse::ok("Search completed", &rows),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}",
    params(
        ("id" = String, Path, description = "Restaurant ID"),
        OriginQuery
    ),
    responses(
        (status = 200, description = "Restaurant with menu, label ratings and platform ratings", body = ApiResponse),
        (status = 404, description = "Unknown restaurant", body = ApiResponse)
    )
)]
pub async fn get_restaurant_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<OriginQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(v) => v,
        Err(e) => return query_400(e),
    };
    let origin = match parse_origin(q.lat.as_deref(), q.lng.as_deref()) {
        Ok(o) => o,
        Err(e) => return ApiResponse::bad_request(e),
    };

    match state.service.restaurant_detail(&id, origin).await {
        Ok(detail) => ApiResponse::ok("Restaurant fetched successfully", &detail),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}/menu",
    params(("id" = String, Path, description = "Restaurant ID")),
    responses(
        (status = 200, description = "Dishes on the menu", body = ApiResponse),
        (status = 404, description = "Unknown restaurant", body = ApiResponse)
    )
)]
pub async fn get_menu_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.service.menu(&id).await {
        Ok(dishes) => ApiResponse::ok("Menu fetched successfully", &dishes),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}/reviews",
    params(
        ("id" = String, Path, description = "Restaurant ID"),
        ReviewsQuery
    ),
    responses(
        (status = 200, description = "One page of reviews, newest first", body = ApiResponse),
        (status = 400, description = "Missing or unknown label", body = ApiResponse)
    )
)]
pub async fn get_reviews_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<ReviewsQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(v) => v,
        Err(e) => return query_400(e),
    };
    let Some(label) = q.label.as_deref() else {
        return ApiResponse::bad_request("label is required");
    };
    let parsed = parse_page(q.page.as_deref()).and_then(|page| {
        Ok((
            page.unwrap_or(1),
            parse_flag("count", q.count.as_deref(), true)?,
            parse_flag("text_only", q.text_only.as_deref(), false)?,
        ))
    });
    let (page, want_count, text_only) = match parsed {
        Ok(v) => v,
        Err(e) => return ApiResponse::bad_request(e),
    };

    match state
        .service
        .reviews(&id, label, page, want_count, text_only)
        .await
    {
        Ok(page) => ApiResponse::ok("Reviews fetched successfully", &page),
        Err(e) => e.into_response(),
    }
}
