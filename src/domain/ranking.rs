//! Ordering and windowing of restaurant result sets.

use crate::domain::filter::{QueryPlan, RankOrder};
use crate::domain::geo::GeoPoint;
use crate::domain::restaurant::Restaurant;
use std::cmp::Ordering;

fn compare(a: &Restaurant, b: &Restaurant, order: &RankOrder) -> Ordering {
    let by_rating = b.rating.total_cmp(&a.rating);
    match order {
        RankOrder::Distance(_) => a.distance.total_cmp(&b.distance).then(by_rating),
        RankOrder::Rating => by_rating,
    }
}

/// Stable re-sort of a fetched page.
///
/// Rows equal on the primary key are ordered by descending rating; rows equal on
/// both keep their relative order. A geo page stays in distance order.
pub fn stabilize(rows: &mut [Restaurant], order: &RankOrder) {
    rows.sort_by(|a, b| compare(a, b, order));
}

/// Sets `distance` on every row: km from `origin`, or 0 without one.
pub fn project_distance(rows: &mut [Restaurant], origin: Option<GeoPoint>) {
    for row in rows.iter_mut() {
        row.distance = match origin {
            Some(o) => o.distance_km(&GeoPoint::new(row.latitude, row.longitude)),
            None => 0.0,
        };
    }
}

/// Evaluates a plan against a full candidate set: filter, project distance,
/// order, then cut the window. Returns the page and the unwindowed match count.
pub fn evaluate(candidates: Vec<Restaurant>, plan: &QueryPlan) -> (Vec<Restaurant>, usize) {
    let mut matching: Vec<Restaurant> = candidates
        .into_iter()
        .filter(|r| plan.predicates.matches(r))
        .collect();
    let total = matching.len();

    project_distance(&mut matching, plan.origin());
    stabilize(&mut matching, &plan.order);

    let offset = usize::try_from(plan.window.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(plan.window.limit()).unwrap_or(usize::MAX);
    let page = matching.into_iter().skip(offset).take(limit).collect();
    (page, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter::{FilterCriteria, Window};

    fn restaurant(id: &str, rating: f64, distance: f64) -> Restaurant {
        Restaurant {
            id: id.to_string(),
            name: format!("Quan {id}"),
            latitude: 0.0,
            longitude: 0.0,
            address: String::new(),
            rating,
            review_count: 1,
            city_id: "1".into(),
            district_id: "1".into(),
            food_type_name: "Pho".into(),
            distance,
        }
    }

    fn ids(rows: &[Restaurant]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn distance_order_is_not_overturned_by_rating() {
        let mut rows = vec![
            restaurant("far", 5.0, 5.0),
            restaurant("near", 1.0, 1.0),
            restaurant("mid", 3.0, 3.0),
        ];
        stabilize(&mut rows, &RankOrder::Distance(GeoPoint::new(1.0, 1.0)));
        assert_eq!(ids(&rows), vec!["near", "mid", "far"]);
    }

    #[test]
    fn equal_distances_break_ties_by_rating() {
        let mut rows = vec![
            restaurant("a", 3.0, 2.0),
            restaurant("b", 4.5, 2.0),
            restaurant("c", 3.0, 2.0),
        ];
        stabilize(&mut rows, &RankOrder::Distance(GeoPoint::new(1.0, 1.0)));
        assert_eq!(ids(&rows), vec!["b", "a", "c"]);
    }

    #[test]
    fn rating_order_is_stable() {
        let mut rows = vec![
            restaurant("x", 4.0, 0.0),
            restaurant("y", 4.0, 0.0),
            restaurant("z", 4.8, 0.0),
        ];
        stabilize(&mut rows, &RankOrder::Rating);
        assert_eq!(ids(&rows), vec!["z", "x", "y"]);
    }

    #[test]
    fn evaluate_windows_after_ordering() {
        let rows: Vec<Restaurant> = (0..25)
            .map(|i| restaurant(&format!("r{i:02}"), f64::from(i) / 10.0, 0.0))
            .collect();
        let plan = FilterCriteria {
            page: Some(2),
            ..Default::default()
        }
        .plan();
        assert!(matches!(plan.window, Window::Page { page: 2, .. }));

        let (page, total) = evaluate(rows, &plan);
        assert_eq!(total, 25);
        // Descending rating: r24..r15 on page 1, r14..r05 on page 2.
        assert_eq!(page.first().map(|r| r.id.as_str()), Some("r14"));
        assert_eq!(page.last().map(|r| r.id.as_str()), Some("r05"));
        assert_eq!(page.len(), 10);
    }
}
