//! Field constraints shared by the album, song and tracklist operations.

use albumshelf_db::entities::song::MIN_RUNNING_TIME_SECS;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

pub const MAX_TEXT_LEN: usize = 512;
pub const MAX_PRICE_CENTS: i32 = 99_999;
/// Release dates may be at most this many days after today.
pub const RELEASE_CEILING_DAYS: i64 = 3 * 365;

/// Price as submitted: JSON string (`"25.99"`) or number (`25.99`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Text(String),
    Number(f64),
}

impl PriceInput {
    /// Validated price in cents.
    pub fn to_cents(&self) -> Result<i32> {
        let raw = match self {
            PriceInput::Text(s) => s.trim().to_string(),
            PriceInput::Number(n) if n.is_finite() => n.to_string(),
            PriceInput::Number(_) => return Err(invalid_price()),
        };
        check_price_cents(parse_cents(&raw)?)
    }
}

impl From<&str> for PriceInput {
    fn from(s: &str) -> Self {
        PriceInput::Text(s.to_string())
    }
}

fn invalid_price() -> CatalogError {
    CatalogError::validation("price", "A valid number is required.")
}

/// Parse a decimal with at most two fraction digits into cents. Range is
/// not checked here.
fn parse_cents(raw: &str) -> Result<i64> {
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));

    if whole.is_empty() && frac.is_empty() {
        return Err(invalid_price());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid_price());
    }
    if frac.len() > 2 {
        return Err(CatalogError::validation(
            "price",
            "Ensure that there are no more than 2 decimal places.",
        ));
    }

    let out_of_range = || {
        CatalogError::validation("price", "Ensure this value is less than or equal to 999.99.")
    };
    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| out_of_range())?
    };
    let frac: i64 = format!("{frac:0<2}").parse().map_err(|_| invalid_price())?;
    let cents = whole
        .checked_mul(100)
        .and_then(|c| c.checked_add(frac))
        .ok_or_else(out_of_range)?;

    Ok(if negative { -cents } else { cents })
}

pub fn check_price_cents(cents: i64) -> Result<i32> {
    if cents < 0 {
        return Err(CatalogError::validation(
            "price",
            "Ensure this value is greater than or equal to 0.",
        ));
    }
    if cents > i64::from(MAX_PRICE_CENTS) {
        return Err(CatalogError::validation(
            "price",
            "Ensure this value is less than or equal to 999.99.",
        ));
    }
    Ok(cents as i32)
}

pub fn release_date_ceiling(today: NaiveDate) -> NaiveDate {
    today + Duration::days(RELEASE_CEILING_DAYS)
}

pub fn check_release_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
    if date > release_date_ceiling(today) {
        return Err(CatalogError::validation(
            "release_date",
            "Release date cannot be more than 3 years in the future.",
        ));
    }
    Ok(())
}

pub fn check_running_time(field: &str, seconds: i64) -> Result<i32> {
    if seconds < i64::from(MIN_RUNNING_TIME_SECS) {
        return Err(CatalogError::validation(
            field,
            "Running time must be at least 10 seconds.",
        ));
    }
    i32::try_from(seconds)
        .map_err(|_| CatalogError::validation(field, "Running time is too large."))
}

/// Running time from raw form input, e.g. `"259"`.
pub fn parse_running_time(raw: &str) -> Result<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CatalogError::validation(
            "running_time",
            "Running time is required.",
        ));
    }
    let seconds: i64 = raw.parse().map_err(|_| {
        CatalogError::validation("running_time", "Running time must be a valid number.")
    })?;
    check_running_time("running_time", seconds)
}

/// Trimmed, non-empty text of at most [`MAX_TEXT_LEN`] characters.
pub fn required_text(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CatalogError::validation(field, "This field is required."));
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(CatalogError::validation(
            field,
            format!("Ensure this field has no more than {MAX_TEXT_LEN} characters."),
        ));
    }
    Ok(value.to_string())
}

pub fn check_position(field: &str, position: Option<i32>) -> Result<()> {
    match position {
        Some(p) if p < 1 => Err(CatalogError::validation(
            field,
            "Position must be a positive integer.",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(s: &str) -> Result<i32> {
        PriceInput::from(s).to_cents()
    }

    #[test]
    fn test_price_text_parsing() {
        assert_eq!(cents("25.99").unwrap(), 2599);
        assert_eq!(cents("0").unwrap(), 0);
        assert_eq!(cents("0.00").unwrap(), 0);
        assert_eq!(cents("999.99").unwrap(), 99_999);
        assert_eq!(cents("15.5").unwrap(), 1550);
        assert_eq!(cents(".5").unwrap(), 50);
        assert_eq!(cents(" 12 ").unwrap(), 1200);
    }

    #[test]
    fn test_price_number_parsing() {
        assert_eq!(PriceInput::Number(25.99).to_cents().unwrap(), 2599);
        assert_eq!(PriceInput::Number(15.0).to_cents().unwrap(), 1500);
        assert!(PriceInput::Number(f64::NAN).to_cents().is_err());
    }

    #[test]
    fn test_price_upper_bound() {
        let err = cents("1000.00").unwrap_err();
        assert_eq!(err.field(), Some("price"));
        assert!(PriceInput::Number(1000.0).to_cents().is_err());
        assert!(cents("99999999999999999999999").is_err());
    }

    #[test]
    fn test_price_negative() {
        let err = cents("-5.99").unwrap_err();
        assert_eq!(
            err.to_string(),
            "price: Ensure this value is greater than or equal to 0."
        );
        assert!(PriceInput::Number(-5.99).to_cents().is_err());
    }

    #[test]
    fn test_price_rejects_garbage_and_extra_decimals() {
        assert!(cents("abc").is_err());
        assert!(cents("").is_err());
        assert!(cents("1.2.3").is_err());
        assert!(cents("1e3").is_err());
        let err = cents("1.999").unwrap_err();
        assert!(err.to_string().contains("2 decimal places"));
    }

    #[test]
    fn test_price_input_deserializes_string_or_number() {
        let p: PriceInput = serde_json::from_str(r#""25.99""#).unwrap();
        assert_eq!(p.to_cents().unwrap(), 2599);
        let p: PriceInput = serde_json::from_str("25.99").unwrap();
        assert_eq!(p.to_cents().unwrap(), 2599);
        let p: PriceInput = serde_json::from_str("25").unwrap();
        assert_eq!(p.to_cents().unwrap(), 2500);
    }

    #[test]
    fn test_release_date_ceiling() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let ceiling = release_date_ceiling(today);
        assert!(check_release_date(ceiling, today).is_ok());
        assert!(check_release_date(ceiling + Duration::days(1), today).is_err());
        assert!(check_release_date(NaiveDate::from_ymd_opt(1969, 9, 26).unwrap(), today).is_ok());
    }

    #[test]
    fn test_release_date_four_years_out_rejected() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let err = check_release_date(today + Duration::days(4 * 365), today).unwrap_err();
        assert_eq!(err.field(), Some("release_date"));
    }

    #[test]
    fn test_running_time_boundary() {
        assert!(check_running_time("running_time", 9).is_err());
        assert_eq!(check_running_time("running_time", 10).unwrap(), 10);
        assert!(check_running_time("running_time", -1).is_err());
        assert!(check_running_time("running_time", i64::from(i32::MAX) + 1).is_err());
    }

    #[test]
    fn test_parse_running_time() {
        assert_eq!(parse_running_time("259").unwrap(), 259);
        assert_eq!(parse_running_time(" 10 ").unwrap(), 10);
        assert_eq!(
            parse_running_time("abc").unwrap_err().to_string(),
            "running_time: Running time must be a valid number."
        );
        assert!(parse_running_time("").is_err());
        assert!(parse_running_time("9").is_err());
        assert!(parse_running_time("3:20").is_err());
    }

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("title", "  Abbey Road ").unwrap(), "Abbey Road");
        assert!(required_text("title", "   ").is_err());
        assert!(required_text("title", &"x".repeat(513)).is_err());
        assert!(required_text("title", &"x".repeat(512)).is_ok());
    }

    #[test]
    fn test_check_position() {
        assert!(check_position("position", None).is_ok());
        assert!(check_position("position", Some(1)).is_ok());
        assert!(check_position("position", Some(0)).is_err());
        assert!(check_position("position", Some(-3)).is_err());
    }
}
