//! Pure restaurant-discovery logic: distances, label aggregation, rating rules,
//! filter plans and ranking. Nothing in here touches storage.

pub mod filter;
pub mod geo;
pub mod labels;
pub mod ranking;
pub mod rating;
pub mod restaurant;

pub use filter::{FilterCriteria, QueryPlan, ReviewQuery, PAGE_SIZE};
pub use geo::{haversine_km, GeoPoint};
pub use labels::{aggregate_labels, Label, LabelRating, LabeledReviewStat, LabelsRating};
pub use rating::{overall_rating, round2};
pub use restaurant::{
    Dish, PlatformRating, Restaurant, RestaurantDetail, RestaurantRating, Review, ReviewPage,
};
