//! In-memory [`RestaurantStore`] with the same semantics as the Postgres adapter.
//!
//! Backs the test suite, the performance test binary and local demos. Filter
//! queries run through [`ranking::evaluate`] on a snapshot of the table.

use crate::domain::filter::{QueryPlan, ReviewQuery};
use crate::domain::ranking::{self, project_distance};
use crate::domain::{
    aggregate_labels, overall_rating, Dish, GeoPoint, Label, LabeledReviewStat, PlatformRating,
    Restaurant, RestaurantRating, Review,
};
use crate::error::StoreError;
use crate::storage::{RestaurantStore, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

/// A review row together with its feedback labels.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredReview {
    pub rating_id: String,
    pub restaurant_id: String,
    pub username: String,
    pub rating: f64,
    pub feedback: String,
    pub review_time: Option<DateTime<Utc>>,
    /// `(label, rating_label)` pairs.
    pub labels: Vec<(String, f64)>,
}

#[derive(Default)]
struct Tables {
    restaurants: Vec<Restaurant>,
    reviews: Vec<StoredReview>,
    dishes: HashMap<String, Vec<Dish>>,
    platforms: HashMap<String, Vec<PlatformRating>>,
}

impl Tables {
    fn label_stats(&self, restaurant_id: &str) -> Vec<LabeledReviewStat> {
        let mut grouped: BTreeMap<String, (f64, i64)> = BTreeMap::new();
        for review in self.reviews.iter().filter(|r| r.restaurant_id == restaurant_id) {
            for (label, rating) in &review.labels {
                let entry = grouped.entry(label.to_lowercase()).or_insert((0.0, 0));
                entry.0 += rating;
                entry.1 += 1;
            }
        }
        grouped
            .into_iter()
            .map(|(label, (sum, count))| LabeledReviewStat::new(label, sum, count))
            .collect()
    }

    fn review_count(&self, restaurant_id: &str) -> i64 {
        self.reviews
            .iter()
            .filter(|r| r.restaurant_id == restaurant_id)
            .count() as i64
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a restaurant by ID.
    pub async fn insert_restaurant(&self, restaurant: Restaurant) {
        let mut tables = self.tables.write().await;
        match tables.restaurants.iter_mut().find(|r| r.id == restaurant.id) {
            Some(existing) => *existing = restaurant,
            None => tables.restaurants.push(restaurant),
        }
    }

    pub async fn insert_review(&self, review: StoredReview) {
        self.tables.write().await.reviews.push(review);
    }

    pub async fn insert_dish(&self, restaurant_id: &str, dish: Dish) {
        let mut tables = self.tables.write().await;
        tables
            .dishes
            .entry(restaurant_id.to_string())
            .or_default()
            .push(dish);
    }

    pub async fn insert_platform_rating(&self, restaurant_id: &str, rating: PlatformRating) {
        let mut tables = self.tables.write().await;
        tables
            .platforms
            .entry(restaurant_id.to_string())
            .or_default()
            .push(rating);
    }
}

#[async_trait]
impl RestaurantStore for MemoryStore {
    async fn fetch_restaurant_by_id(
        &self,
        id: &str,
        origin: Option<GeoPoint>,
    ) -> StoreResult<Restaurant> {
        let tables = self.tables.read().await;
        let mut restaurant = tables
            .restaurants
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        project_distance(std::slice::from_mut(&mut restaurant), origin);
        Ok(restaurant)
    }

    async fn fetch_restaurant_ratings(&self) -> StoreResult<Vec<RestaurantRating>> {
        let tables = self.tables.read().await;
        let mut out: Vec<RestaurantRating> = tables
            .restaurants
            .iter()
            .map(|r| RestaurantRating::new(r.id.clone(), r.rating, r.review_count))
            .collect();
        out.sort_by(|a, b| a.restaurant_id.cmp(&b.restaurant_id));
        Ok(out)
    }

    async fn fetch_labeled_review_stats(
        &self,
        restaurant_id: &str,
    ) -> StoreResult<Vec<LabeledReviewStat>> {
        Ok(self.tables.read().await.label_stats(restaurant_id))
    }

    async fn count_reviews(&self, restaurant_id: &str) -> StoreResult<i64> {
        Ok(self.tables.read().await.review_count(restaurant_id))
    }

    async fn persist_restaurant_rating(
        &self,
        restaurant_id: &str,
        rating: f64,
        review_count: i64,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let restaurant = tables
            .restaurants
            .iter_mut()
            .find(|r| r.id == restaurant_id)
            .ok_or(StoreError::NotFound)?;
        restaurant.rating = rating;
        restaurant.review_count = review_count;
        Ok(())
    }

    async fn bulk_recompute_review_counts(&self) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let counts: Vec<i64> = tables
            .restaurants
            .iter()
            .map(|r| tables.review_count(&r.id))
            .collect();
        for (restaurant, count) in tables.restaurants.iter_mut().zip(counts) {
            restaurant.review_count = count;
        }
        Ok(tables.restaurants.len() as u64)
    }

    async fn bulk_recompute_ratings(&self) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let ratings: Vec<f64> = tables
            .restaurants
            .iter()
            .map(|r| overall_rating(&aggregate_labels(&tables.label_stats(&r.id))))
            .collect();
        for (restaurant, rating) in tables.restaurants.iter_mut().zip(ratings) {
            restaurant.rating = rating;
        }
        Ok(tables.restaurants.len() as u64)
    }

    async fn fetch_restaurants_by_filter(
        &self,
        plan: &QueryPlan,
        want_count: bool,
    ) -> StoreResult<(Vec<Restaurant>, Option<i64>)> {
        let snapshot = self.tables.read().await.restaurants.clone();
        let (page, total) = ranking::evaluate(snapshot, plan);
        Ok((page, want_count.then_some(total as i64)))
    }

    async fn fetch_restaurants_by_name_words(
        &self,
        plan: &QueryPlan,
    ) -> StoreResult<Vec<Restaurant>> {
        if plan.predicates.is_empty() {
            return Ok(Vec::new());
        }
        let snapshot = self.tables.read().await.restaurants.clone();
        Ok(ranking::evaluate(snapshot, plan).0)
    }

    async fn fetch_reviews(
        &self,
        restaurant_id: &str,
        query: &ReviewQuery,
    ) -> StoreResult<(Vec<Review>, Option<i64>)> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Review> = Vec::new();
        for review in tables.reviews.iter().filter(|r| r.restaurant_id == restaurant_id) {
            // Same rule as `BTRIM` in the Postgres adapter: only spaces count as blank.
            if query.text_only && review.feedback.trim_matches(' ').is_empty() {
                continue;
            }
            for (label, rating_label) in &review.labels {
                let matches = match label.parse::<Label>() {
                    Ok(parsed) => parsed == query.label || parsed == Label::Unknown,
                    Err(_) => false,
                };
                if matches {
                    rows.push(Review {
                        rating_id: review.rating_id.clone(),
                        username: review.username.clone(),
                        rating: review.rating,
                        feedback: review.feedback.clone(),
                        review_time: review.review_time,
                        label: label.to_lowercase(),
                        rating_label: *rating_label,
                    });
                }
            }
        }
        // Newest first, undated reviews last.
        rows.sort_by(|a, b| b.review_time.cmp(&a.review_time));

        let total = rows.len() as i64;
        let window = query.window();
        let offset = usize::try_from(window.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(window.limit()).unwrap_or(usize::MAX);
        let page = rows.into_iter().skip(offset).take(limit).collect();
        Ok((page, query.want_count.then_some(total)))
    }

    async fn fetch_dishes(&self, restaurant_id: &str) -> StoreResult<Vec<Dish>> {
        let tables = self.tables.read().await;
        let mut dishes = tables.dishes.get(restaurant_id).cloned().unwrap_or_default();
        dishes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(dishes)
    }

    async fn fetch_food_types(&self) -> StoreResult<Vec<String>> {
        let tables = self.tables.read().await;
        let names: BTreeSet<String> = tables
            .restaurants
            .iter()
            .map(|r| r.food_type_name.clone())
            .collect();
        Ok(names.into_iter().collect())
    }

    async fn fetch_platform_ratings(&self, restaurant_id: &str) -> StoreResult<Vec<PlatformRating>> {
        let tables = self.tables.read().await;
        let mut out = tables
            .platforms
            .get(restaurant_id)
            .cloned()
            .unwrap_or_default();
        out.sort_by(|a, b| a.platform.cmp(&b.platform));
        Ok(out)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
