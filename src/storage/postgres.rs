//! PostgreSQL implementation of [`RestaurantStore`].
//!
//! Dynamic predicates are assembled with `sqlx::QueryBuilder`, so every filter
//! value is a bind parameter. The page query and the count query share the
//! same WHERE clause builder.

use crate::domain::filter::{Operator, PredicateSet, QueryPlan, RankOrder, ReviewQuery, Window};
use crate::domain::ranking::project_distance;
use crate::domain::{
    Dish, GeoPoint, LabeledReviewStat, PlatformRating, Restaurant, RestaurantRating, Review,
};
use crate::error::StoreError;
use crate::storage::{RestaurantStore, StoreResult};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

const RESTAURANT_COLUMNS: &str = "SELECT r.restaurant_id, r.restaurant_name, r.latitude, r.longitude, \
     COALESCE(r.address, '') AS address, \
     COALESCE(r.restaurant_rating, 0)::FLOAT8 AS restaurant_rating, \
     COALESCE(r.review_count, 0)::BIGINT AS review_count, \
     r.city_id, r.district_id, ft.food_type_name, ";

const RESTAURANT_FROM: &str =
    " FROM restaurant r JOIN food_type ft ON r.food_type_id = ft.food_type_id";

const RECOMPUTE_REVIEW_COUNTS_SQL: &str = "UPDATE restaurant r
     SET review_count = (
         SELECT COUNT(*) FROM review rv WHERE rv.restaurant_id = r.restaurant_id
     )";

// Labels without a score are skipped here and in `RECOMPUTE_RATINGS_SQL` alike.
const LABEL_STATS_SQL: &str = "SELECT LOWER(fl.label) AS label,
            SUM(fl.rating_label)::FLOAT8 AS rating_sum,
            COUNT(*) AS cnt
     FROM review rv
     JOIN feedback_label fl ON rv.rating_id = fl.rating_id
     WHERE rv.restaurant_id = $1 AND fl.rating_label IS NOT NULL
     GROUP BY LOWER(fl.label)";

// `unknown` rows are joined onto every category, mirroring the in-process aggregator.
const RECOMPUTE_RATINGS_SQL: &str = "WITH label_stats AS (
         SELECT rv.restaurant_id,
                LOWER(fl.label) AS label,
                SUM(fl.rating_label)::FLOAT8 AS sum_label,
                COUNT(*) AS cnt_label
         FROM feedback_label fl
         JOIN review rv ON fl.rating_id = rv.rating_id
         WHERE fl.rating_label IS NOT NULL
         GROUP BY rv.restaurant_id, LOWER(fl.label)
     ),
     categories (label) AS (
         VALUES ('ambience'), ('delivery'), ('food'), ('price'), ('service')
     ),
     folded AS (
         SELECT s.restaurant_id,
                c.label,
                SUM(s.sum_label)::FLOAT8 AS sum_label,
                SUM(s.cnt_label)::FLOAT8 AS cnt_label
         FROM label_stats s
         JOIN categories c ON s.label = c.label OR s.label = 'unknown'
         GROUP BY s.restaurant_id, c.label
     ),
     final_rating AS (
         SELECT restaurant_id,
                ROUND(AVG(sum_label / cnt_label)::NUMERIC, 2)::FLOAT8 AS rating
         FROM folded
         WHERE cnt_label > 0
         GROUP BY restaurant_id
     )
     UPDATE restaurant r
     SET restaurant_rating = COALESCE(
         (SELECT fr.rating FROM final_rating fr WHERE fr.restaurant_id = r.restaurant_id),
         0
     )";

#[derive(Clone)]
pub struct PgRestaurantStore {
    pool: PgPool,
}

impl PgRestaurantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escapes `%`, `_` and `\` so a search word only ever matches literally.
pub(crate) fn escape_like(word: &str) -> String {
    let mut out = String::with_capacity(word.len() + 2);
    for ch in word.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn push_distance(qb: &mut QueryBuilder<'static, Postgres>, origin: GeoPoint) {
    qb.push("(6371.0 * 2 * ASIN(LEAST(1.0, SQRT(POWER(SIN(RADIANS(r.latitude - ")
        .push_bind(origin.lat)
        .push(") / 2), 2) + COS(RADIANS(")
        .push_bind(origin.lat)
        .push(")) * COS(RADIANS(r.latitude)) * POWER(SIN(RADIANS(r.longitude - ")
        .push_bind(origin.lng)
        .push(") / 2), 2))))) AS distance");
}

fn push_where(qb: &mut QueryBuilder<'static, Postgres>, predicates: &PredicateSet) {
    let mut first = true;
    for predicate in predicates.iter() {
        qb.push(if first { " WHERE " } else { " AND " });
        first = false;

        qb.push(predicate.column.sql());
        match predicate.op {
            Operator::Eq => {
                qb.push(" = ").push_bind(predicate.value.clone());
            }
            Operator::Contains => {
                qb.push(" ILIKE ")
                    .push_bind(format!("%{}%", escape_like(&predicate.value)));
            }
        }
    }
}

pub(crate) fn build_select(plan: &QueryPlan) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new(RESTAURANT_COLUMNS);

    match plan.order {
        RankOrder::Distance(origin) => push_distance(&mut qb, origin),
        RankOrder::Rating => {
            qb.push("0::FLOAT8 AS distance");
        }
    }
    qb.push(RESTAURANT_FROM);
    push_where(&mut qb, &plan.predicates);

    match plan.order {
        RankOrder::Distance(_) => qb.push(" ORDER BY distance ASC, restaurant_rating DESC"),
        RankOrder::Rating => qb.push(" ORDER BY restaurant_rating DESC"),
    };

    qb.push(" LIMIT ")
        .push_bind(plan.window.limit() as i64);
    if let Window::Page { .. } = plan.window {
        qb.push(" OFFSET ").push_bind(plan.window.offset() as i64);
    }
    qb
}

pub(crate) fn build_count(predicates: &PredicateSet) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new("SELECT COUNT(*)");
    qb.push(RESTAURANT_FROM);
    push_where(&mut qb, predicates);
    qb
}

pub(crate) fn build_reviews(
    restaurant_id: &str,
    query: &ReviewQuery,
) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new(
        "SELECT rv.rating_id, COALESCE(u.user_name, '') AS user_name, \
         COALESCE(rv.rating, 0)::FLOAT8 AS rating, COALESCE(rv.feedback, '') AS feedback, \
         rv.review_time, LOWER(fl.label) AS label, \
         COALESCE(fl.rating_label, 0)::FLOAT8 AS rating_label",
    );
    push_review_from(&mut qb, restaurant_id, query);
    qb.push(" ORDER BY rv.review_time DESC NULLS LAST LIMIT ")
        .push_bind(query.window().limit() as i64)
        .push(" OFFSET ")
        .push_bind(query.window().offset() as i64);
    qb
}

pub(crate) fn build_review_count(
    restaurant_id: &str,
    query: &ReviewQuery,
) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new("SELECT COUNT(*)");
    push_review_from(&mut qb, restaurant_id, query);
    qb
}

fn push_review_from(
    qb: &mut QueryBuilder<'static, Postgres>,
    restaurant_id: &str,
    query: &ReviewQuery,
) {
    qb.push(
        " FROM review rv \
         LEFT JOIN users u ON rv.user_id = u.user_id \
         JOIN feedback_label fl ON rv.rating_id = fl.rating_id \
         WHERE rv.restaurant_id = ",
    )
    .push_bind(restaurant_id.to_string())
    .push(" AND LOWER(fl.label) IN (")
    .push_bind(query.label.as_str())
    .push(", 'unknown')");
    if query.text_only {
        qb.push(" AND BTRIM(COALESCE(rv.feedback, '')) <> ''");
    }
}

fn restaurant_from_row(row: &PgRow) -> Result<Restaurant, sqlx::Error> {
    Ok(Restaurant {
        id: row.try_get("restaurant_id")?,
        name: row.try_get("restaurant_name")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        address: row.try_get("address")?,
        rating: row.try_get("restaurant_rating")?,
        review_count: row.try_get("review_count")?,
        city_id: row.try_get("city_id")?,
        district_id: row.try_get("district_id")?,
        food_type_name: row.try_get("food_type_name")?,
        distance: row.try_get("distance")?,
    })
}

#[async_trait]
impl RestaurantStore for PgRestaurantStore {
    async fn fetch_restaurant_by_id(
        &self,
        id: &str,
        origin: Option<GeoPoint>,
    ) -> StoreResult<Restaurant> {
        let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new(RESTAURANT_COLUMNS);
        qb.push("0::FLOAT8 AS distance")
            .push(RESTAURANT_FROM)
            .push(" WHERE r.restaurant_id = ")
            .push_bind(id.to_string());

        let row = qb
            .build()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;

        let mut restaurant = restaurant_from_row(&row)?;
        project_distance(std::slice::from_mut(&mut restaurant), origin);
        Ok(restaurant)
    }

    async fn fetch_restaurant_ratings(&self) -> StoreResult<Vec<RestaurantRating>> {
        let rows = sqlx::query(
            "SELECT restaurant_id,
                    COALESCE(restaurant_rating, 0)::FLOAT8 AS restaurant_rating,
                    COALESCE(review_count, 0)::BIGINT AS review_count
             FROM restaurant
             ORDER BY restaurant_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(RestaurantRating {
                restaurant_id: row.try_get("restaurant_id")?,
                rating: row.try_get("restaurant_rating")?,
                review_count: row.try_get("review_count")?,
            });
        }
        Ok(out)
    }

    async fn fetch_labeled_review_stats(
        &self,
        restaurant_id: &str,
    ) -> StoreResult<Vec<LabeledReviewStat>> {
        let rows = sqlx::query(LABEL_STATS_SQL)
            .bind(restaurant_id)
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(LabeledReviewStat {
                label: row.try_get("label")?,
                rating_sum: row.try_get("rating_sum")?,
                count: row.try_get("cnt")?,
            });
        }
        Ok(out)
    }

    async fn count_reviews(&self, restaurant_id: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM review WHERE restaurant_id = $1")
            .bind(restaurant_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn persist_restaurant_rating(
        &self,
        restaurant_id: &str,
        rating: f64,
        review_count: i64,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE restaurant SET restaurant_rating = $1, review_count = $2 WHERE restaurant_id = $3",
        )
        .bind(rating)
        .bind(review_count)
        .bind(restaurant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn bulk_recompute_review_counts(&self) -> StoreResult<u64> {
        let result = sqlx::query(RECOMPUTE_REVIEW_COUNTS_SQL)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn bulk_recompute_ratings(&self) -> StoreResult<u64> {
        let result = sqlx::query(RECOMPUTE_RATINGS_SQL)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn fetch_restaurants_by_filter(
        &self,
        plan: &QueryPlan,
        want_count: bool,
    ) -> StoreResult<(Vec<Restaurant>, Option<i64>)> {
        let rows = build_select(plan).build().fetch_all(&self.pool).await?;
        let restaurants = rows
            .iter()
            .map(restaurant_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let total = if want_count {
            let count: i64 = build_count(&plan.predicates)
                .build_query_scalar()
                .fetch_one(&self.pool)
                .await?;
            Some(count)
        } else {
            None
        };

        Ok((restaurants, total))
    }

    async fn fetch_restaurants_by_name_words(
        &self,
        plan: &QueryPlan,
    ) -> StoreResult<Vec<Restaurant>> {
        if plan.predicates.is_empty() {
            return Ok(Vec::new());
        }
        let rows = build_select(plan).build().fetch_all(&self.pool).await?;
        let restaurants = rows
            .iter()
            .map(restaurant_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(restaurants)
    }

    async fn fetch_reviews(
        &self,
        restaurant_id: &str,
        query: &ReviewQuery,
    ) -> StoreResult<(Vec<Review>, Option<i64>)> {
        let rows = build_reviews(restaurant_id, query)
            .build()
            .fetch_all(&self.pool)
            .await?;

        let mut reviews = Vec::with_capacity(rows.len());
        for row in rows {
            reviews.push(Review {
                rating_id: row.try_get("rating_id")?,
                username: row.try_get("user_name")?,
                rating: row.try_get("rating")?,
                feedback: row.try_get("feedback")?,
                review_time: row.try_get("review_time")?,
                label: row.try_get("label")?,
                rating_label: row.try_get("rating_label")?,
            });
        }

        let total = if query.want_count {
            let count: i64 = build_review_count(restaurant_id, query)
                .build_query_scalar()
                .fetch_one(&self.pool)
                .await?;
            Some(count)
        } else {
            None
        };

        Ok((reviews, total))
    }

    async fn fetch_dishes(&self, restaurant_id: &str) -> StoreResult<Vec<Dish>> {
        let rows = sqlx::query(
            "SELECT item_name, COALESCE(price, 0)::FLOAT8 AS price
             FROM dish WHERE restaurant_id = $1 ORDER BY item_name",
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        let mut dishes = Vec::with_capacity(rows.len());
        for row in rows {
            dishes.push(Dish {
                name: row.try_get("item_name")?,
                price: row.try_get("price")?,
            });
        }
        Ok(dishes)
    }

    async fn fetch_food_types(&self) -> StoreResult<Vec<String>> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT food_type_name FROM food_type ORDER BY food_type_name")
                .fetch_all(&self.pool)
                .await?;
        Ok(names)
    }

    async fn fetch_platform_ratings(&self, restaurant_id: &str) -> StoreResult<Vec<PlatformRating>> {
        let rows = sqlx::query(
            "SELECT p.platform_name, COALESCE(rp.restaurant_rating, 0)::FLOAT8 AS restaurant_rating
             FROM restaurant_platform rp
             JOIN platform p ON rp.platform_id = p.platform_id
             WHERE rp.restaurant_id = $1
             ORDER BY p.platform_name",
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(PlatformRating {
                platform: row.try_get("platform_name")?,
                rating: row.try_get("restaurant_rating")?,
            });
        }
        Ok(out)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
