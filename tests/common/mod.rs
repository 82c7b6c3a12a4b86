#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use restaurant_discovery::domain::Restaurant;
use restaurant_discovery::storage::memory::StoredReview;
use restaurant_discovery::MemoryStore;
use std::sync::Arc;

/// Degrees of longitude per km along the equator.
pub const DEG_PER_KM: f64 = 1.0 / 111.194_926_644_558_73;

pub fn restaurant(id: &str, name: &str, lat: f64, lng: f64, rating: f64) -> Restaurant {
    Restaurant {
        id: id.to_string(),
        name: name.to_string(),
        latitude: lat,
        longitude: lng,
        address: format!("{id} street"),
        rating,
        review_count: 0,
        city_id: "hcm".into(),
        district_id: "d1".into(),
        food_type_name: "Pho".into(),
        distance: 0.0,
    }
}

pub fn review(id: &str, restaurant_id: &str, day: u32, labels: &[(&str, f64)]) -> StoredReview {
    StoredReview {
        rating_id: id.to_string(),
        restaurant_id: restaurant_id.to_string(),
        username: format!("user-{id}"),
        rating: 4.0,
        feedback: format!("review {id}"),
        review_time: Some(Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()),
        labels: labels.iter().map(|(l, r)| (l.to_string(), *r)).collect(),
    }
}

/// `r1`: ten reviews, food 4 and service 5 → 4.50. `r2`: no reviews → 0.00.
pub async fn rated_pair() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.insert_restaurant(restaurant("r1", "Pho Hoa", 10.0, 106.0, 0.0)).await;
    store.insert_restaurant(restaurant("r2", "Bun Cha", 10.1, 106.1, 3.0)).await;

    store.insert_review(review("v1", "r1", 1, &[("food", 4.0)])).await;
    store.insert_review(review("v2", "r1", 2, &[("Service", 5.0)])).await;
    for i in 3..=10 {
        store.insert_review(review(&format!("v{i}"), "r1", i, &[])).await;
    }
    store
}

/// Twelve restaurants with distinct ratings and varied districts and food types.
pub async fn catalogue() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for i in 0..12u32 {
        let mut r = restaurant(
            &format!("c{i:02}"),
            &format!("Quan {i}"),
            10.0 + f64::from(i) * 0.01,
            106.0,
            f64::from(i) * 0.4,
        );
        r.district_id = if i % 2 == 0 { "d1".into() } else { "d2".into() };
        r.food_type_name = if i < 6 { "Pho".into() } else { "Com Tam".into() };
        store.insert_restaurant(r).await;
    }
    store
}
