//! Record normalization
//!
//! Loose records (numbers that arrive as strings, legacy field names, mixed
//! date formats) are turned into typed, validated entities here, before any
//! aggregation runs. Bad numeric fields on a meal record become zero and are
//! reported; they never fail the batch.

use rusqlite::types::Value as SqlValue;
use serde::Serialize;
use serde_json::Value;

use super::dates;
use crate::error::{NutritionError, NutritionResult, PartialDataWarning};
use crate::models::{MealEntryCreate, MealType, Nutrition};

/// Name used when a legacy record carries none
const UNNAMED_FOOD: &str = "Unnamed food";

/// Upper bound for one entry's calories or macro grams
pub const MAX_NUTRIENT_VALUE: f64 = 100_000.0;

/// Interpret a JSON number or numeric string as a finite f64
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

/// Interpret a SQLite cell as a finite f64 (REAL columns may hold text)
pub fn coerce_sql_number(value: &SqlValue) -> Option<f64> {
    let n = match value {
        SqlValue::Integer(i) => Some(*i as f64),
        SqlValue::Real(r) => Some(*r),
        SqlValue::Text(s) => s.trim().parse::<f64>().ok(),
        SqlValue::Null | SqlValue::Blob(_) => None,
    };
    n.filter(|v| v.is_finite())
}

/// Parse a strictly positive, finite number from user input
pub fn parse_positive(field: &str, raw: &str) -> NutritionResult<f64> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| NutritionError::invalid(format!("{} must be a number, got '{}'", field, raw)))?;
    require_positive(field, value)
}

pub fn require_positive(field: &str, value: f64) -> NutritionResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(NutritionError::invalid(format!(
            "{} must be a positive number, got {}",
            field, value
        )));
    }
    Ok(value)
}

/// A single entry's nutrient value: finite, non-negative and at most
/// `MAX_NUTRIENT_VALUE`
pub fn require_nutrient(field: &str, value: f64) -> NutritionResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(NutritionError::invalid(format!(
            "{} must be a non-negative number, got {}",
            field, value
        )));
    }
    if value > MAX_NUTRIENT_VALUE {
        return Err(NutritionError::invalid(format!(
            "{} must be at most {}, got {}",
            field, MAX_NUTRIENT_VALUE, value
        )));
    }
    Ok(value)
}

/// Parse a strictly positive whole number (ages are integral years)
pub fn parse_positive_int(field: &str, raw: &str) -> NutritionResult<u32> {
    let value = raw.trim().parse::<u32>().map_err(|_| {
        NutritionError::invalid(format!("{} must be a whole number, got '{}'", field, raw))
    })?;
    if value == 0 {
        return Err(NutritionError::invalid(format!("{} must be greater than 0", field)));
    }
    Ok(value)
}

/// Result of normalizing a batch of loose meal records
#[derive(Debug, Default, Serialize)]
pub struct NormalizedMeals {
    pub entries: Vec<MealEntryCreate>,
    pub warnings: Vec<PartialDataWarning>,
    /// Records dropped entirely (no usable date), as "label: reason"
    pub skipped: Vec<String>,
}

/// Normalize a legacy meal export.
///
/// Accepts either the day-grouped shape `[{"date": ..., "meals": [...]}]`
/// or a flat array of meal objects each carrying its own `date`.
pub fn normalize_legacy_meals(payload: &Value) -> NutritionResult<NormalizedMeals> {
    let items = payload
        .as_array()
        .ok_or_else(|| NutritionError::invalid("expected a JSON array of meals or days"))?;

    let mut out = NormalizedMeals::default();

    for (day_idx, item) in items.iter().enumerate() {
        match item.get("meals").and_then(Value::as_array) {
            Some(meals) => {
                let day_date = item.get("date");
                for (meal_idx, meal) in meals.iter().enumerate() {
                    let label = format!("#{}.{}", day_idx, meal_idx);
                    let date = meal.get("date").or(day_date);
                    normalize_one(&label, meal, date, &mut out);
                }
            }
            None => {
                let label = format!("#{}", day_idx);
                normalize_one(&label, item, item.get("date"), &mut out);
            }
        }
    }

    tracing::debug!(
        entries = out.entries.len(),
        warnings = out.warnings.len(),
        skipped = out.skipped.len(),
        "Normalized legacy meal batch"
    );

    Ok(out)
}

fn normalize_one(label: &str, record: &Value, date: Option<&Value>, out: &mut NormalizedMeals) {
    if !record.is_object() {
        out.skipped.push(format!("{}: not an object", label));
        return;
    }

    let date = match date.and_then(Value::as_str).map(dates::parse_date) {
        Some(Ok(d)) => d,
        Some(Err(e)) => {
            out.skipped.push(format!("{}: {}", label, e));
            return;
        }
        None => {
            out.skipped.push(format!("{}: missing date", label));
            return;
        }
    };

    let name = first_field(record, &["name", "food_name"])
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNNAMED_FOOD)
        .to_string();

    let meal_type = first_field(record, &["mealType", "meal_type"])
        .and_then(Value::as_str)
        .map(MealType::from_str)
        .unwrap_or(MealType::Other);

    let brand = first_field(record, &["brand", "food_brand"])
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut numeric = |field: &str, aliases: &[&str]| -> f64 {
        let raw = first_field(record, aliases);
        match raw.and_then(coerce_number).map(|v| require_nutrient(field, v)) {
            Some(Ok(v)) => v,
            _ => {
                out.warnings.push(PartialDataWarning::new(
                    label,
                    field,
                    raw.map(|v| v.to_string()),
                ));
                0.0
            }
        }
    };

    let nutrition = Nutrition {
        calories: numeric("calories", &["calories"]),
        protein: numeric("protein", &["protein"]),
        carbs: numeric("carbs", &["carbohydrates", "carbohydrate", "carbs"]),
        fat: numeric("fat", &["fat"]),
    };

    // Amount is informational; a missing amount is not worth a warning
    let amount_grams = first_field(record, &["amount", "amount_grams"])
        .and_then(coerce_number)
        .filter(|v| *v >= 0.0)
        .unwrap_or(0.0);

    out.entries.push(MealEntryCreate {
        name,
        brand,
        food_id: None,
        meal_type,
        date,
        amount_grams,
        nutrition,
    });
}

fn first_field<'a>(record: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|n| record.get(*n))
        .filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(&json!(12.5)), Some(12.5));
        assert_eq!(coerce_number(&json!(" 7.25 ")), Some(7.25));
        assert_eq!(coerce_number(&json!("abc")), None);
        assert_eq!(coerce_number(&json!(null)), None);
        assert_eq!(coerce_number(&json!("NaN")), None);
    }

    #[test]
    fn test_coerce_sql_number() {
        assert_eq!(coerce_sql_number(&SqlValue::Integer(3)), Some(3.0));
        assert_eq!(coerce_sql_number(&SqlValue::Text("4.5".into())), Some(4.5));
        assert_eq!(coerce_sql_number(&SqlValue::Text("n/a".into())), None);
        assert_eq!(coerce_sql_number(&SqlValue::Null), None);
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive("weight", "70").unwrap(), 70.0);
        assert!(parse_positive("weight", "-1").is_err());
        assert!(parse_positive("weight", "0").is_err());
        assert!(parse_positive("weight", "seventy").is_err());
        assert!(parse_positive("weight", "inf").is_err());
        assert_eq!(parse_positive_int("age", "30").unwrap(), 30);
        assert!(parse_positive_int("age", "30.5").is_err());
        assert!(parse_positive_int("age", "0").is_err());
    }

    #[test]
    fn test_day_grouped_shape() {
        let payload = json!([
            {
                "date": "7.3.2024",
                "meals": [
                    {"name": "Oats", "calories": "300.50", "protein": "10", "carbohydrates": "50", "fat": "5", "mealType": "Breakfast", "amount": "80"},
                    {"name": "Apple", "calories": 95, "protein": 0.5, "carbohydrates": 25, "fat": 0.3, "mealType": "Snack"}
                ]
            }
        ]);

        let out = normalize_legacy_meals(&payload).unwrap();
        assert_eq!(out.entries.len(), 2);
        assert!(out.warnings.is_empty());
        assert!(out.skipped.is_empty());

        let oats = &out.entries[0];
        assert_eq!(oats.date, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        assert_eq!(oats.meal_type, MealType::Breakfast);
        assert!((oats.nutrition.calories - 300.5).abs() < 1e-9);
        assert!((oats.amount_grams - 80.0).abs() < 1e-9);
        assert_eq!(out.entries[1].meal_type, MealType::Snack);
    }

    #[test]
    fn test_bad_macro_field_is_zeroed_and_reported() {
        let payload = json!([
            {"name": "Mystery", "date": "2024-03-07", "calories": 200, "protein": "lots", "carbs": 10, "fat": 2},
            {"name": "Toast", "date": "3/7/2024", "calories": 120, "protein": 4, "carbohydrate": 20, "fat": 1}
        ]);

        let out = normalize_legacy_meals(&payload).unwrap();
        assert_eq!(out.entries.len(), 2);
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].field, "protein");
        assert_eq!(out.warnings[0].record, "#0");
        assert_eq!(out.entries[0].nutrition.protein, 0.0);
        assert_eq!(out.entries[1].nutrition.carbs, 20.0);
        assert_eq!(out.entries[0].date, out.entries[1].date);
    }

    #[test]
    fn test_require_nutrient_bounds() {
        assert_eq!(require_nutrient("fat", 0.0).unwrap(), 0.0);
        assert_eq!(require_nutrient("fat", MAX_NUTRIENT_VALUE).unwrap(), MAX_NUTRIENT_VALUE);
        assert!(require_nutrient("fat", -0.5).is_err());
        assert!(require_nutrient("fat", 1e308).is_err());
        assert!(require_nutrient("fat", f64::INFINITY).is_err());
    }

    #[test]
    fn test_oversized_legacy_value_is_zeroed_and_reported() {
        let payload = json!([
            {"name": "Typo", "date": "2024-03-07", "calories": 250, "protein": 1e308, "carbs": 30, "fat": 8}
        ]);

        let out = normalize_legacy_meals(&payload).unwrap();
        assert_eq!(out.entries.len(), 1);
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].field, "protein");
        assert_eq!(out.entries[0].nutrition.protein, 0.0);
        assert_eq!(out.entries[0].nutrition.carbs, 30.0);
    }

    #[test]
    fn test_unusable_date_skips_record() {
        let payload = json!([
            {"name": "A", "date": "someday", "calories": 1, "protein": 1, "carbs": 1, "fat": 1},
            {"name": "B", "calories": 1, "protein": 1, "carbs": 1, "fat": 1}
        ]);

        let out = normalize_legacy_meals(&payload).unwrap();
        assert!(out.entries.is_empty());
        assert_eq!(out.skipped.len(), 2);
    }

    #[test]
    fn test_rejects_non_array() {
        assert!(normalize_legacy_meals(&json!({"meals": []})).is_err());
    }
}
