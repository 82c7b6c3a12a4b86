//! Query-string parsing shared by the handlers.

use crate::domain::GeoPoint;

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Parses one coordinate; missing means 0.
pub fn parse_coordinate(name: &str, raw: Option<&str>, bound: f64) -> Result<f64, String> {
    let Some(raw) = present(raw) else {
        return Ok(0.0);
    };
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("{name} must be a number, got '{raw}'"))?;
    if !value.is_finite() || value.abs() > bound {
        return Err(format!("{name} must be within ±{bound}, got {value}"));
    }
    Ok(value)
}

/// Origin from `lat`/`lng`. Geo mode needs both to be non-zero.
pub fn parse_origin(lat: Option<&str>, lng: Option<&str>) -> Result<Option<GeoPoint>, String> {
    let lat = parse_coordinate("lat", lat, 90.0)?;
    let lng = parse_coordinate("lng", lng, 180.0)?;
    Ok(GeoPoint::origin(lat, lng))
}

/// A page must be a positive integer when present.
pub fn parse_page(raw: Option<&str>) -> Result<Option<u32>, String> {
    match present(raw) {
        None => Ok(None),
        Some(raw) => match raw.parse::<u32>() {
            Ok(page) if page >= 1 => Ok(Some(page)),
            _ => Err(format!("page must be a positive integer, got '{raw}'")),
        },
    }
}

/// Malformed or non-positive limits are dropped so the default applies.
pub fn parse_limit(raw: Option<&str>) -> Option<u32> {
    present(raw)
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|l| *l >= 1)
        .map(|l| u32::try_from(l).unwrap_or(u32::MAX))
}

pub fn parse_flag(name: &str, raw: Option<&str>, default: bool) -> Result<bool, String> {
    match present(raw).map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(format!("{name} must be true or false, got '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_requires_both_coordinates() {
        assert_eq!(parse_origin(None, None), Ok(None));
        assert_eq!(parse_origin(Some("10.5"), None), Ok(None));
        assert_eq!(
            parse_origin(Some("10.5"), Some("106.7")),
            Ok(Some(GeoPoint::new(10.5, 106.7)))
        );
        assert!(parse_origin(Some("north"), Some("1")).is_err());
        assert!(parse_origin(Some("95"), Some("1")).is_err());
    }

    #[test]
    fn bad_limits_fall_back_and_bad_pages_fail() {
        assert_eq!(parse_limit(Some("5")), Some(5));
        assert_eq!(parse_limit(Some("-3")), None);
        assert_eq!(parse_limit(Some("0")), None);
        assert_eq!(parse_limit(Some("ten")), None);
        assert_eq!(parse_page(Some("2")), Ok(Some(2)));
        assert_eq!(parse_page(None), Ok(None));
        assert!(parse_page(Some("0")).is_err());
        assert!(parse_page(Some("x")).is_err());
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("count", Some("TRUE"), false), Ok(true));
        assert_eq!(parse_flag("count", Some("0"), true), Ok(false));
        assert_eq!(parse_flag("count", None, true), Ok(true));
        assert!(parse_flag("count", Some("maybe"), true).is_err());
    }
}
