//! Calendar date normalization
//!
//! Every stored or compared date is a `NaiveDate`, written as ISO
//! `YYYY-MM-DD`. Older records used `D.M.YYYY` and the US-locale `M/D/YYYY`;
//! both are accepted here and nowhere else.

use chrono::{Local, NaiveDate};

use crate::error::{NutritionError, NutritionResult};

/// Canonical storage format
pub const ISO_FORMAT: &str = "%Y-%m-%d";

/// Accepted input formats, tried in order
const ACCEPTED_FORMATS: &[&str] = &[ISO_FORMAT, "%d.%m.%Y", "%m/%d/%Y"];

/// Parse any accepted date representation
pub fn parse_date(input: &str) -> NutritionResult<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(NutritionError::invalid("date is empty"));
    }

    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| {
            NutritionError::invalid(format!(
                "unrecognized date '{}' (expected YYYY-MM-DD, D.M.YYYY or M/D/YYYY)",
                trimmed
            ))
        })
}

/// Normalize any accepted representation to the canonical ISO string
pub fn normalize_date(input: &str) -> NutritionResult<String> {
    parse_date(input).map(format_date)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

/// Today's date in the local time zone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse an optional date argument, defaulting to today
pub fn date_or_today(input: Option<&str>) -> NutritionResult<NaiveDate> {
    match input {
        Some(s) if !s.trim().is_empty() => parse_date(s),
        _ => Ok(today()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso() {
        let d = parse_date("2024-03-07").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
    }

    #[test]
    fn test_dotted_and_slashed_forms_agree() {
        let dotted = normalize_date("7.3.2024").unwrap();
        let slashed = normalize_date("3/7/2024").unwrap();
        assert_eq!(dotted, "2024-03-07");
        assert_eq!(dotted, slashed);
    }

    #[test]
    fn test_zero_padded_legacy_forms() {
        assert_eq!(normalize_date("07.03.2024").unwrap(), "2024-03-07");
        assert_eq!(normalize_date("03/07/2024").unwrap(), "2024-03-07");
    }

    #[test]
    fn test_rejects_unknown_formats() {
        assert!(parse_date("March 7, 2024").is_err());
        assert!(parse_date("2024/03/07").is_err());
        assert!(parse_date("").is_err());
        assert!(parse_date("31/12/2024").is_err()); // month 31
    }

    #[test]
    fn test_date_or_today() {
        assert_eq!(date_or_today(None).unwrap(), today());
        assert_eq!(date_or_today(Some("  ")).unwrap(), today());
        assert_eq!(
            date_or_today(Some("1.1.2023")).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
        );
    }
}
