//! Read side of the discovery API.
//!
//! `RestaurantService` validates input, builds query plans and hands them to
//! the store. Every storage call goes through the `RestaurantStore` trait object
//! so the HTTP layer and the tests can run against any backend.

use crate::domain::filter::{search_words, DEFAULT_AUTOCOMPLETE_LIMIT};
use crate::domain::ranking::stabilize;
use crate::domain::{
    aggregate_labels, Dish, FilterCriteria, GeoPoint, Label, LabelsRating, QueryPlan, Restaurant,
    RestaurantDetail, ReviewPage, ReviewQuery,
};
use crate::error::{Result, ServiceError};
use crate::storage::RestaurantStore;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct RestaurantService {
    store: Arc<dyn RestaurantStore>,
}

fn require_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ServiceError::Validation("restaurant id must not be empty".into()));
    }
    Ok(id)
}

impl RestaurantService {
    pub fn new(store: Arc<dyn RestaurantStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RestaurantStore> {
        &self.store
    }

    pub async fn restaurant(&self, id: &str, origin: Option<GeoPoint>) -> Result<Restaurant> {
        let id = require_id(id)?;
        self.store
            .fetch_restaurant_by_id(id, origin)
            .await
            .map_err(|e| ServiceError::from_lookup(format!("restaurant {id}"), e))
    }

    /// Restaurant with its menu, label breakdown and platform ratings.
    pub async fn restaurant_detail(
        &self,
        id: &str,
        origin: Option<GeoPoint>,
    ) -> Result<RestaurantDetail> {
        let restaurant = self.restaurant(id, origin).await?;
        let dishes = self.store.fetch_dishes(&restaurant.id).await?;
        let labels = self.labels_rating(&restaurant.id).await?;
        let platforms = self.store.fetch_platform_ratings(&restaurant.id).await?;
        Ok(RestaurantDetail {
            restaurant,
            dishes,
            labels,
            platforms,
        })
    }

    pub async fn labels_rating(&self, id: &str) -> Result<LabelsRating> {
        let id = require_id(id)?;
        let stats = self.store.fetch_labeled_review_stats(id).await?;
        Ok(aggregate_labels(&stats))
    }

    pub async fn menu(&self, id: &str) -> Result<Vec<Dish>> {
        let id = require_id(id)?;
        // 404 rather than an empty menu for an unknown restaurant.
        self.store
            .fetch_restaurant_by_id(id, None)
            .await
            .map_err(|e| ServiceError::from_lookup(format!("restaurant {id}"), e))?;
        Ok(self.store.fetch_dishes(id).await?)
    }

    pub async fn food_types(&self) -> Result<Vec<String>> {
        Ok(self.store.fetch_food_types().await?)
    }

    /// Filtered, ranked page of restaurants plus the total match count when
    /// `want_count` is set.
    pub async fn search(
        &self,
        criteria: &FilterCriteria,
        want_count: bool,
    ) -> Result<(Vec<Restaurant>, Option<i64>)> {
        criteria.validate().map_err(ServiceError::Validation)?;
        let plan = criteria.plan();
        debug!(
            predicates = plan.predicates.len(),
            geo = plan.origin().is_some(),
            offset = plan.window.offset(),
            limit = plan.window.limit(),
            "Running restaurant search"
        );

        let (mut rows, total) = self
            .store
            .fetch_restaurants_by_filter(&plan, want_count)
            .await?;
        stabilize(&mut rows, &plan.order);
        Ok((rows, total))
    }

    /// Name autocomplete. Every word of `query` must appear in the name.
    pub async fn autocomplete(&self, query: &str, limit: Option<u32>) -> Result<Vec<Restaurant>> {
        let words = search_words(query);
        if words.is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit
            .filter(|l| *l >= 1)
            .unwrap_or(DEFAULT_AUTOCOMPLETE_LIMIT);
        let plan = QueryPlan::name_search(&words, limit);

        let mut rows = self.store.fetch_restaurants_by_name_words(&plan).await?;
        stabilize(&mut rows, &plan.order);
        Ok(rows)
    }

    /// One page of reviews for a fixed category, newest first. Reviews labeled
    /// `unknown` match every category.
    pub async fn reviews(
        &self,
        id: &str,
        label: &str,
        page: u32,
        want_count: bool,
        text_only: bool,
    ) -> Result<ReviewPage> {
        let id = require_id(id)?;
        let label: Label = label.parse().map_err(ServiceError::Validation)?;
        if !label.is_category() {
            return Err(ServiceError::Validation(format!(
                "label must be one of ambience, delivery, food, price, service; got '{label}'"
            )));
        }
        if page == 0 {
            return Err(ServiceError::Validation("page must be >= 1".into()));
        }

        let query = ReviewQuery {
            label,
            page,
            want_count,
            text_only,
        };
        let (reviews, total_reviews) = self.store.fetch_reviews(id, &query).await?;
        Ok(ReviewPage {
            reviews,
            total_reviews,
        })
    }
}
