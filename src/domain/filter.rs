//! Filter criteria and the query plan built from them.
//!
//! A [`QueryPlan`] is storage-agnostic: the Postgres adapter translates it to SQL,
//! the in-memory adapter evaluates it directly. The same [`PredicateSet`] drives
//! both the page query and the total-count query.

use crate::domain::geo::GeoPoint;
use crate::domain::labels::Label;
use crate::domain::restaurant::Restaurant;

/// Rows per page, for restaurant listings and review pages alike.
pub const PAGE_SIZE: u32 = 10;

/// Row cap when the caller gives neither a page nor a limit.
pub const DEFAULT_LIMIT: u32 = 30;

pub const DEFAULT_AUTOCOMPLETE_LIMIT: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Any `Some` origin, `(0, 0)` included, turns on geo mode. The "both
    /// coordinates non-zero" rule lives at the HTTP edge (`GeoPoint::origin`).
    pub origin: Option<GeoPoint>,
    pub food_type: Option<String>,
    pub city_id: Option<String>,
    pub district_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl FilterCriteria {
    /// Rejects criteria that can never describe a valid query.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(origin) = &self.origin {
            if !origin.lat.is_finite() || !(-90.0..=90.0).contains(&origin.lat) {
                return Err(format!("latitude {} is out of range", origin.lat));
            }
            if !origin.lng.is_finite() || !(-180.0..=180.0).contains(&origin.lng) {
                return Err(format!("longitude {} is out of range", origin.lng));
            }
        }
        if self.page == Some(0) {
            return Err("page must be >= 1".to_string());
        }
        if self.limit == Some(0) {
            return Err("limit must be >= 1".to_string());
        }
        Ok(())
    }

    /// Page-number mode wins over limit mode; neither means the default limit.
    pub fn window(&self) -> Window {
        match (self.page, self.limit) {
            (Some(page), _) if page >= 1 => Window::Page {
                page,
                size: PAGE_SIZE,
            },
            (_, Some(limit)) if limit >= 1 => Window::Limit(limit),
            _ => Window::Limit(DEFAULT_LIMIT),
        }
    }

    pub fn predicates(&self) -> PredicateSet {
        let mut set = PredicateSet::default();
        if let Some(v) = non_blank(&self.food_type) {
            set.push(Column::FoodTypeName, Operator::Eq, v);
        }
        if let Some(v) = non_blank(&self.city_id) {
            set.push(Column::CityId, Operator::Eq, v);
        }
        if let Some(v) = non_blank(&self.district_id) {
            set.push(Column::DistrictId, Operator::Eq, v);
        }
        set
    }

    pub fn plan(&self) -> QueryPlan {
        let order = match self.origin {
            Some(origin) => RankOrder::Distance(origin),
            None => RankOrder::Rating,
        };
        QueryPlan {
            predicates: self.predicates(),
            order,
            window: self.window(),
        }
    }
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    FoodTypeName,
    CityId,
    DistrictId,
    RestaurantName,
}

impl Column {
    /// Qualified column name in the restaurant/food_type join.
    pub fn sql(&self) -> &'static str {
        match self {
            Column::FoodTypeName => "ft.food_type_name",
            Column::CityId => "r.city_id",
            Column::DistrictId => "r.district_id",
            Column::RestaurantName => "r.restaurant_name",
        }
    }

    fn value_of<'a>(&self, r: &'a Restaurant) -> &'a str {
        match self {
            Column::FoodTypeName => &r.food_type_name,
            Column::CityId => &r.city_id,
            Column::DistrictId => &r.district_id,
            Column::RestaurantName => &r.name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    /// Case-insensitive substring match.
    Contains,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: Column,
    pub op: Operator,
    pub value: String,
}

impl Predicate {
    pub fn matches(&self, restaurant: &Restaurant) -> bool {
        let actual = self.column.value_of(restaurant);
        match self.op {
            Operator::Eq => actual == self.value,
            Operator::Contains => actual
                .to_lowercase()
                .contains(&self.value.to_lowercase()),
        }
    }
}

/// Predicates combined with AND. Empty means "no constraint".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    pub fn push(&mut self, column: Column, op: Operator, value: impl Into<String>) {
        self.predicates.push(Predicate {
            column,
            op,
            value: value.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates.iter()
    }

    pub fn matches(&self, restaurant: &Restaurant) -> bool {
        self.predicates.iter().all(|p| p.matches(restaurant))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RankOrder {
    /// Ascending distance from the origin.
    Distance(GeoPoint),
    /// Descending aggregate rating.
    Rating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Page { page: u32, size: u32 },
    Limit(u32),
}

impl Window {
    pub fn offset(&self) -> u64 {
        match self {
            Window::Page { page, size } => u64::from(page.saturating_sub(1)) * u64::from(*size),
            Window::Limit(_) => 0,
        }
    }

    pub fn limit(&self) -> u64 {
        match self {
            Window::Page { size, .. } => u64::from(*size),
            Window::Limit(limit) => u64::from(*limit),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub predicates: PredicateSet,
    pub order: RankOrder,
    pub window: Window,
}

impl QueryPlan {
    /// Autocomplete: every word must appear in the name, best rated first.
    pub fn name_search(words: &[String], limit: u32) -> Self {
        let mut predicates = PredicateSet::default();
        for word in words {
            predicates.push(Column::RestaurantName, Operator::Contains, word.clone());
        }
        Self {
            predicates,
            order: RankOrder::Rating,
            window: Window::Limit(limit),
        }
    }

    pub fn origin(&self) -> Option<GeoPoint> {
        match self.order {
            RankOrder::Distance(origin) => Some(origin),
            RankOrder::Rating => None,
        }
    }
}

/// Splits an autocomplete query into words. `+` is treated as a space, as
/// form-encoded clients send it.
pub fn search_words(query: &str) -> Vec<String> {
    query
        .replace('+', " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// One page of reviews carrying `label` (or `unknown`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewQuery {
    pub label: Label,
    pub page: u32,
    pub want_count: bool,
    pub text_only: bool,
}

impl ReviewQuery {
    pub fn window(&self) -> Window {
        Window::Page {
            page: self.page.max(1),
            size: PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_wins_over_limit() {
        let criteria = FilterCriteria {
            page: Some(2),
            limit: Some(5),
            ..Default::default()
        };
        let window = criteria.window();
        assert_eq!(window, Window::Page { page: 2, size: PAGE_SIZE });
        assert_eq!(window.offset(), u64::from(PAGE_SIZE));
        assert_eq!(window.limit(), u64::from(PAGE_SIZE));
    }

    #[test]
    fn limit_mode_and_default() {
        let limited = FilterCriteria {
            limit: Some(5),
            ..Default::default()
        };
        assert_eq!(limited.window(), Window::Limit(5));
        assert_eq!(limited.window().offset(), 0);
        assert_eq!(FilterCriteria::default().window(), Window::Limit(DEFAULT_LIMIT));
    }

    #[test]
    fn predicates_skip_blank_values() {
        let criteria = FilterCriteria {
            food_type: Some("Pho".into()),
            city_id: Some("  ".into()),
            district_id: Some("7".into()),
            ..Default::default()
        };
        let set = criteria.predicates();
        let cols: Vec<Column> = set.iter().map(|p| p.column).collect();
        assert_eq!(cols, vec![Column::FoodTypeName, Column::DistrictId]);
        assert!(FilterCriteria::default().predicates().is_empty());
    }

    #[test]
    fn geo_mode_needs_an_origin() {
        let geo = FilterCriteria {
            origin: GeoPoint::origin(10.0, 106.0),
            ..Default::default()
        };
        assert!(matches!(geo.plan().order, RankOrder::Distance(_)));
        assert_eq!(FilterCriteria::default().plan().order, RankOrder::Rating);
    }

    #[test]
    fn explicit_zero_origin_still_plans_by_distance() {
        let zero = FilterCriteria {
            origin: Some(GeoPoint::new(0.0, 0.0)),
            ..Default::default()
        };
        assert_eq!(
            zero.plan().order,
            RankOrder::Distance(GeoPoint::new(0.0, 0.0))
        );
        assert!(GeoPoint::origin(0.0, 0.0).is_none());
    }

    #[test]
    fn validation_rejects_out_of_range_input() {
        let bad_lat = FilterCriteria {
            origin: Some(GeoPoint::new(91.0, 10.0)),
            ..Default::default()
        };
        assert!(bad_lat.validate().is_err());
        let bad_page = FilterCriteria {
            page: Some(0),
            ..Default::default()
        };
        assert!(bad_page.validate().is_err());
        assert!(FilterCriteria::default().validate().is_ok());
    }

    #[test]
    fn search_words_split_on_plus_and_spaces() {
        assert_eq!(search_words("pho+bo  ha noi"), vec!["pho", "bo", "ha", "noi"]);
        assert!(search_words("  + ").is_empty());
    }

    #[test]
    fn name_search_ands_one_predicate_per_word() {
        let plan = QueryPlan::name_search(&["pho".into(), "bo".into()], 10);
        assert_eq!(plan.predicates.len(), 2);
        assert!(plan.predicates.iter().all(|p| p.op == Operator::Contains));
        assert_eq!(plan.order, RankOrder::Rating);
        assert!(plan.origin().is_none());
    }
}
