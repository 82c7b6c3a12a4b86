//! Records served by the discovery API.

use crate::domain::labels::LabelsRating;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Empty when the stored address is NULL.
    pub address: String,
    /// 0 until the restaurant has been rated.
    pub rating: f64,
    pub review_count: i64,
    pub city_id: String,
    pub district_id: String,
    pub food_type_name: String,
    /// Kilometers from the query origin; 0 when the query had no origin.
    pub distance: f64,
}

/// Current persisted aggregate of one restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RestaurantRating {
    pub restaurant_id: String,
    pub rating: f64,
    pub review_count: i64,
}

impl RestaurantRating {
    pub fn new(restaurant_id: impl Into<String>, rating: f64, review_count: i64) -> Self {
        Self {
            restaurant_id: restaurant_id.into(),
            rating,
            review_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Review {
    pub rating_id: String,
    pub username: String,
    pub rating: f64,
    pub feedback: String,
    pub review_time: Option<DateTime<Utc>>,
    pub label: String,
    pub rating_label: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_reviews: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Dish {
    pub name: String,
    pub price: f64,
}

/// Rating a restaurant holds on an external listing platform.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PlatformRating {
    pub platform: String,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RestaurantDetail {
    pub restaurant: Restaurant,
    pub dishes: Vec<Dish>,
    pub labels: LabelsRating,
    pub platforms: Vec<PlatformRating>,
}
