//! Storage collaborator consumed by the service and the recalculation pipeline.

use crate::domain::filter::{QueryPlan, ReviewQuery};
use crate::domain::{
    Dish, GeoPoint, LabeledReviewStat, PlatformRating, Restaurant, RestaurantRating, Review,
};
use crate::error::StoreError;
use async_trait::async_trait;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgRestaurantStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Contract every storage backend implements.
///
/// Implementations must be safe to share across the recalculation workers; each
/// worker touches a single restaurant ID so no extra locking is expected.
#[async_trait]
pub trait RestaurantStore: Send + Sync {
    /// Returns `StoreError::NotFound` when no row has this ID. With an origin the
    /// returned restaurant carries its distance from it.
    async fn fetch_restaurant_by_id(
        &self,
        id: &str,
        origin: Option<GeoPoint>,
    ) -> StoreResult<Restaurant>;

    /// Every restaurant with its currently persisted rating and review count.
    async fn fetch_restaurant_ratings(&self) -> StoreResult<Vec<RestaurantRating>>;

    /// Label rows for one restaurant, grouped by stored label.
    async fn fetch_labeled_review_stats(
        &self,
        restaurant_id: &str,
    ) -> StoreResult<Vec<LabeledReviewStat>>;

    async fn count_reviews(&self, restaurant_id: &str) -> StoreResult<i64>;

    /// Single update keyed by restaurant ID.
    async fn persist_restaurant_rating(
        &self,
        restaurant_id: &str,
        rating: f64,
        review_count: i64,
    ) -> StoreResult<()>;

    /// Set-based recount of every restaurant's reviews.
    async fn bulk_recompute_review_counts(&self) -> StoreResult<u64>;

    /// Set-based recomputation of every restaurant's rating, rounded to 2 decimals.
    async fn bulk_recompute_ratings(&self) -> StoreResult<u64>;

    /// One page of the plan plus, when asked, the count of all matching rows.
    async fn fetch_restaurants_by_filter(
        &self,
        plan: &QueryPlan,
        want_count: bool,
    ) -> StoreResult<(Vec<Restaurant>, Option<i64>)>;

    /// Autocomplete lookup; the plan holds one name predicate per word.
    async fn fetch_restaurants_by_name_words(&self, plan: &QueryPlan)
        -> StoreResult<Vec<Restaurant>>;

    async fn fetch_reviews(
        &self,
        restaurant_id: &str,
        query: &ReviewQuery,
    ) -> StoreResult<(Vec<Review>, Option<i64>)>;

    async fn fetch_dishes(&self, restaurant_id: &str) -> StoreResult<Vec<Dish>>;

    async fn fetch_food_types(&self) -> StoreResult<Vec<String>>;

    async fn fetch_platform_ratings(&self, restaurant_id: &str)
        -> StoreResult<Vec<PlatformRating>>;

    /// Reachability check used by the health endpoint.
    async fn ping(&self) -> StoreResult<()>;
}
