//! Per-category rating statistics derived from feedback labels.
//!
//! Every review can carry one or more feedback labels. Five of them are fixed
//! categories (ambience, delivery, food, price, service); the sixth, `unknown`,
//! marks feedback the classifier could not attribute and counts as evidence
//! for every category at once.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Ambience,
    Delivery,
    Food,
    Price,
    Service,
    Unknown,
}

impl Label {
    /// The fixed categories, in reporting order. `Unknown` is not one of them.
    pub const CATEGORIES: [Label; 5] = [
        Label::Ambience,
        Label::Delivery,
        Label::Food,
        Label::Price,
        Label::Service,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Ambience => "ambience",
            Label::Delivery => "delivery",
            Label::Food => "food",
            Label::Price => "price",
            Label::Service => "service",
            Label::Unknown => "unknown",
        }
    }

    pub fn is_category(&self) -> bool {
        !matches!(self, Label::Unknown)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    /// Case-insensitive: stored labels appear both as `food` and `Food`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ambience" => Ok(Label::Ambience),
            "delivery" => Ok(Label::Delivery),
            "food" => Ok(Label::Food),
            "price" => Ok(Label::Price),
            "service" => Ok(Label::Service),
            "unknown" => Ok(Label::Unknown),
            other => Err(format!("unrecognized label '{}'", other)),
        }
    }
}

/// Summed rating and row count for one restaurant and one stored label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledReviewStat {
    pub label: String,
    pub rating_sum: f64,
    pub count: i64,
}

impl LabeledReviewStat {
    pub fn new(label: impl Into<String>, rating_sum: f64, count: i64) -> Self {
        Self {
            label: label.into(),
            rating_sum,
            count,
        }
    }
}

/// Average rating and sample count of one category.
///
/// `rating` is `None` when no review contributed to the category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
pub struct LabelRating {
    pub rating: Option<f64>,
    pub count: i64,
}

impl LabelRating {
    pub fn contributes(&self) -> bool {
        self.count > 0 && self.rating.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
pub struct LabelsRating {
    pub ambience: LabelRating,
    pub delivery: LabelRating,
    pub food: LabelRating,
    pub price: LabelRating,
    pub service: LabelRating,
}

impl LabelsRating {
    pub fn iter(&self) -> impl Iterator<Item = (Label, &LabelRating)> + '_ {
        [
            (Label::Ambience, &self.ambience),
            (Label::Delivery, &self.delivery),
            (Label::Food, &self.food),
            (Label::Price, &self.price),
            (Label::Service, &self.service),
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    sum: f64,
    count: i64,
}

impl Bucket {
    fn add(&mut self, sum: f64, count: i64) {
        self.sum += sum;
        self.count += count;
    }

    fn finish(self) -> LabelRating {
        let rating = if self.count > 0 {
            Some(self.sum / self.count as f64)
        } else {
            None
        };
        LabelRating {
            rating,
            count: self.count,
        }
    }
}

/// Folds grouped label rows into the five category statistics.
///
/// Rows labeled `unknown` are added to every category bucket. Labels outside the
/// known set are skipped.
pub fn aggregate_labels(rows: &[LabeledReviewStat]) -> LabelsRating {
    let mut buckets = [Bucket::default(); 5];

    for row in rows {
        match row.label.parse::<Label>() {
            Ok(Label::Unknown) => {
                for bucket in buckets.iter_mut() {
                    bucket.add(row.rating_sum, row.count);
                }
            }
            Ok(label) => {
                if let Some(idx) = Label::CATEGORIES.iter().position(|c| *c == label) {
                    buckets[idx].add(row.rating_sum, row.count);
                }
            }
            Err(e) => {
                tracing::debug!(label = %row.label, error = %e, "Skipping unrecognized feedback label");
            }
        }
    }

    let [ambience, delivery, food, price, service] = buckets;
    LabelsRating {
        ambience: ambience.finish(),
        delivery: delivery.finish(),
        food: food.finish(),
        price: price.finish(),
        service: service.finish(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(value: Option<f64>, expected: f64) -> bool {
        value.map(|v| (v - expected).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn unknown_folds_into_every_category() {
        let rows = vec![
            LabeledReviewStat::new("ambience", 4.0, 1),
            LabeledReviewStat::new("food", 5.0, 1),
            LabeledReviewStat::new("unknown", 3.0, 1),
        ];
        let labels = aggregate_labels(&rows);

        assert!(approx(labels.ambience.rating, 3.5));
        assert_eq!(labels.ambience.count, 2);
        assert!(approx(labels.food.rating, 4.0));
        assert_eq!(labels.food.count, 2);
        for cat in [labels.delivery, labels.price, labels.service] {
            assert!(approx(cat.rating, 3.0));
            assert_eq!(cat.count, 1);
        }
    }

    #[test]
    fn no_rows_is_a_sparse_state() {
        let labels = aggregate_labels(&[]);
        for (_, stat) in labels.iter() {
            assert_eq!(stat.count, 0);
            assert!(stat.rating.is_none());
            assert!(!stat.contributes());
        }
    }

    #[test]
    fn labels_are_case_insensitive_and_strangers_ignored() {
        let rows = vec![
            LabeledReviewStat::new("Food", 8.0, 2),
            LabeledReviewStat::new("food", 4.0, 1),
            LabeledReviewStat::new("parking", 1.0, 10),
        ];
        let labels = aggregate_labels(&rows);
        assert!(approx(labels.food.rating, 4.0));
        assert_eq!(labels.food.count, 3);
        assert_eq!(labels.service.count, 0);
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert_eq!(" Service ".parse::<Label>(), Ok(Label::Service));
        assert!("parking".parse::<Label>().is_err());
        assert!(!Label::Unknown.is_category());
    }
}
