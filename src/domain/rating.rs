//! Overall restaurant rating.

use crate::domain::labels::LabelsRating;

/// Significant digits Postgres keeps when casting `FLOAT8` to `NUMERIC`.
const FLOAT8_DIGITS: usize = 15;

/// Rounds to two decimal places the way `ROUND(x::NUMERIC, 2)` does.
///
/// The value is first cut to 15 significant decimal digits, then rounded half
/// away from zero on that decimal form, so 2.425 becomes 2.43.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() || value == 0.0 {
        return value;
    }
    // "d.dddddddddddddde<exp>": mantissa digits M and exponent e, value = M * 10^(e - 14).
    let formatted = format!("{:.*e}", FLOAT8_DIGITS - 1, value.abs());
    let Some((mantissa, exponent)) = formatted.split_once('e') else {
        return (value * 100.0).round() / 100.0;
    };
    let digits = mantissa.replace('.', "").parse::<u128>();
    let (Ok(digits), Ok(exponent)) = (digits, exponent.parse::<i32>()) else {
        return (value * 100.0).round() / 100.0;
    };

    // Scale to hundredths: value * 100 = M * 10^(e - 12).
    let shift = exponent - (FLOAT8_DIGITS as i32 - 1) + 2;
    if shift >= 0 {
        // No digits below the hundredths place.
        return value;
    }
    let hundredths = if -shift > 30 {
        0
    } else {
        let divisor = 10u128.pow((-shift) as u32);
        let (quotient, remainder) = (digits / divisor, digits % divisor);
        if remainder * 2 >= divisor {
            quotient + 1
        } else {
            quotient
        }
    };
    (hundredths as f64 / 100.0).copysign(value)
}

/// Mean of the category averages that have at least one contributing review.
///
/// Categories without reviews neither contribute nor drag the mean to zero. With
/// no contributing category at all the rating is 0.
pub fn overall_rating(labels: &LabelsRating) -> f64 {
    let (sum, n) = labels
        .iter()
        .filter(|(_, stat)| stat.contributes())
        .filter_map(|(_, stat)| stat.rating)
        .fold((0.0_f64, 0_u32), |(sum, n), r| (sum + r, n + 1));

    if n == 0 {
        return 0.0;
    }
    round2(sum / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::labels::LabelRating;

    fn stat(rating: f64, count: i64) -> LabelRating {
        LabelRating {
            rating: if count > 0 { Some(rating) } else { None },
            count,
        }
    }

    #[test]
    fn zero_count_categories_are_excluded() {
        let labels = LabelsRating {
            ambience: stat(4.0, 1),
            delivery: stat(0.0, 0),
            food: stat(5.0, 1),
            ..Default::default()
        };
        assert_eq!(overall_rating(&labels), 4.5);
    }

    #[test]
    fn no_contributions_yield_zero() {
        assert_eq!(overall_rating(&LabelsRating::default()), 0.0);
    }

    #[test]
    fn result_is_rounded_to_two_decimals() {
        let labels = LabelsRating {
            ambience: stat(4.0, 3),
            food: stat(3.0, 1),
            service: stat(3.0, 2),
            ..Default::default()
        };
        // 10 / 3 = 3.333...
        assert_eq!(overall_rating(&labels), 3.33);
        assert_eq!(round2(2.675_000_1), 2.68);
        assert_eq!(round2(4.0), 4.0);
    }

    #[test]
    fn round2_matches_numeric_rounding_at_half_boundaries() {
        // (input, ROUND(input::FLOAT8::NUMERIC, 2))
        let cases = [
            (1.005, 1.01),
            (0.285, 0.29),
            (4.015, 4.02),
            (2.675, 2.68),
            (2.425, 2.43),
            (1.275, 1.28),
            (2.175, 2.18),
            (0.004_999, 0.0),
            (0.005, 0.01),
            (4.994_999_999, 4.99),
            (10.0 / 3.0, 3.33),
            (2.2, 2.2),
            (5.0, 5.0),
            (0.0, 0.0),
            (-1.005, -1.01),
        ];
        for (input, expected) in cases {
            assert_eq!(round2(input), expected, "round2({input})");
        }
    }

    #[test]
    fn half_boundary_mean_rounds_up() {
        // ambience 5/4 = 1.25, food 18/5 = 3.6, mean 2.425
        let labels = LabelsRating {
            ambience: stat(5.0 / 4.0, 4),
            food: stat(18.0 / 5.0, 5),
            ..Default::default()
        };
        assert_eq!(overall_rating(&labels), 2.43);
    }
}
