//! Meal Log MCP Tools
//!
//! Tools for logging meals, reading them back, and the derived daily summary.

use chrono::NaiveDate;
use serde::Serialize;

use super::profile::{resolve_goals, GOAL_SOURCE_INCOMPLETE};
use crate::db::Database;
use crate::error::PartialDataWarning;
use crate::food_search::FoodSearchProvider;
use crate::models::{DaySummary, MealEntry, MealEntryCreate, MealType, Nutrition, UserProfile};
use crate::nutrition::normalize::require_nutrient;
use crate::nutrition::serving::DEFAULT_SERVING_GRAMS;
use crate::nutrition::{aggregate_day, date_or_today, format_date, normalize_legacy_meals, today, DerivedDailyTotals};

/// Default page size for list_days
pub const DEFAULT_DAYS_LIMIT: i64 = 30;
const MAX_DAYS_LIMIT: i64 = 366;

/// Input for log_food
#[derive(Debug, Clone)]
pub struct LogFoodRequest {
    pub food_id: String,
    pub amount_grams: f64,
    pub meal_type: Option<String>,
    pub date: Option<String>,
}

/// Input for log_meal (nutrition entered by hand)
#[derive(Debug, Clone)]
pub struct ManualMeal {
    pub name: String,
    pub brand: Option<String>,
    pub meal_type: Option<String>,
    pub date: Option<String>,
    pub amount_grams: Option<f64>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Response for log_food and log_meal
#[derive(Debug, Serialize)]
pub struct LogMealResponse {
    pub id: i64,
    pub date: String,
    pub meal_type: String,
    pub name: String,
    pub brand: Option<String>,
    pub amount_grams: f64,
    pub nutrition: Nutrition,
    /// Serving the nutrition was scaled from, for food search entries
    pub serving_description: Option<String>,
}

impl LogMealResponse {
    fn from_entry(entry: MealEntry, serving_description: Option<String>) -> Self {
        Self {
            id: entry.id,
            date: format_date(entry.date),
            meal_type: entry.meal_type.as_str().to_string(),
            name: entry.name,
            brand: entry.brand,
            amount_grams: entry.amount_grams,
            nutrition: entry.nutrition,
            serving_description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteMealEntryResponse {
    pub id: i64,
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct ListMealsResponse {
    /// `None` when listing every day
    pub date: Option<String>,
    pub count: usize,
    pub entries: Vec<MealEntry>,
    pub warnings: Vec<PartialDataWarning>,
}

#[derive(Debug, Serialize)]
pub struct ClearMealsResponse {
    pub date: Option<String>,
    pub deleted: usize,
}

/// Response for get_daily_summary
#[derive(Debug, Serialize)]
pub struct DailySummaryResponse {
    #[serde(flatten)]
    pub summary: DerivedDailyTotals,
    /// Where the calorie goal came from; see `tools::profile`
    pub goal_source: &'static str,
    pub warnings: Vec<PartialDataWarning>,
}

/// Response for list_days
#[derive(Debug, Serialize)]
pub struct ListDaysResponse {
    pub days: Vec<DaySummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for import_legacy_meals
#[derive(Debug, Serialize)]
pub struct ImportMealsResponse {
    pub imported: usize,
    pub warnings: Vec<PartialDataWarning>,
    pub skipped: Vec<String>,
}

fn parse_meal_type(raw: Option<&str>) -> MealType {
    raw.map(MealType::from_str).unwrap_or(MealType::Other)
}

fn parse_optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>, String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => crate::nutrition::parse_date(s).map(Some).map_err(|e| e.to_string()),
        None => Ok(None),
    }
}

fn validate_nutrient(field: &str, value: f64) -> Result<f64, String> {
    require_nutrient(field, value).map_err(|e| e.to_string())
}

fn validate_nutrition(nutrition: Nutrition) -> Result<Nutrition, String> {
    Ok(Nutrition {
        calories: validate_nutrient("calories", nutrition.calories)?,
        protein: validate_nutrient("protein", nutrition.protein)?,
        carbs: validate_nutrient("carbs", nutrition.carbs)?,
        fat: validate_nutrient("fat", nutrition.fat)?,
    })
}

// ============================================================================
// Logging Tools
// ============================================================================

/// Log a food from the search provider, scaled to the grams eaten
pub fn log_food(
    db: &Database,
    provider: &dyn FoodSearchProvider,
    user_id: &str,
    request: LogFoodRequest,
) -> Result<LogMealResponse, String> {
    let date = date_or_today(request.date.as_deref()).map_err(|e| e.to_string())?;

    let details = provider
        .get_details(&request.food_id)
        .map_err(|e| format!("Failed to get food details: {}", e))?;
    let nutrition = details.scale_to(request.amount_grams).map_err(|e| e.to_string())?;
    let nutrition = validate_nutrition(nutrition)?;

    let data = MealEntryCreate {
        name: details.name,
        brand: Some(details.brand),
        food_id: Some(details.food_id),
        meal_type: parse_meal_type(request.meal_type.as_deref()),
        date,
        amount_grams: request.amount_grams,
        nutrition,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let entry = MealEntry::create(&conn, user_id, &data)
        .map_err(|e| format!("Failed to log meal: {}", e))?;

    tracing::info!(id = entry.id, date = %entry.date, calories = entry.nutrition.calories, "Food logged");
    Ok(LogMealResponse::from_entry(entry, Some(details.serving.description)))
}

/// Log a meal with nutrition values entered by hand
pub fn log_meal(db: &Database, user_id: &str, meal: ManualMeal) -> Result<LogMealResponse, String> {
    let name = meal.name.trim();
    if name.is_empty() {
        return Err("Invalid input: meal name is required".to_string());
    }
    let date = date_or_today(meal.date.as_deref()).map_err(|e| e.to_string())?;

    let amount_grams = match meal.amount_grams {
        Some(a) if a.is_finite() && a > 0.0 => a,
        Some(a) => return Err(format!("Invalid input: amount must be a positive number of grams, got {}", a)),
        None => DEFAULT_SERVING_GRAMS,
    };

    let nutrition = validate_nutrition(Nutrition {
        calories: meal.calories,
        protein: meal.protein,
        carbs: meal.carbs,
        fat: meal.fat,
    })?;

    let data = MealEntryCreate {
        name: name.to_string(),
        brand: meal.brand.filter(|b| !b.trim().is_empty()),
        food_id: None,
        meal_type: parse_meal_type(meal.meal_type.as_deref()),
        date,
        amount_grams,
        nutrition,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let entry = MealEntry::create(&conn, user_id, &data)
        .map_err(|e| format!("Failed to log meal: {}", e))?;

    tracing::info!(id = entry.id, date = %entry.date, "Meal logged");
    Ok(LogMealResponse::from_entry(entry, None))
}

/// Delete one meal entry
pub fn delete_meal_entry(db: &Database, user_id: &str, id: i64) -> Result<DeleteMealEntryResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = MealEntry::delete(&conn, user_id, id)
        .map_err(|e| format!("Failed to delete meal entry: {}", e))?;
    if !deleted {
        return Err(format!("Not found: meal entry {}", id));
    }

    Ok(DeleteMealEntryResponse { id, deleted })
}

/// List meal entries for one day, or all of them
pub fn list_meals(db: &Database, user_id: &str, date: Option<&str>) -> Result<ListMealsResponse, String> {
    let date = parse_optional_date(date)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let loaded = MealEntry::list(&conn, user_id, date)
        .map_err(|e| format!("Failed to list meals: {}", e))?;

    Ok(ListMealsResponse {
        date: date.map(format_date),
        count: loaded.entries.len(),
        entries: loaded.entries,
        warnings: loaded.warnings,
    })
}

/// Delete one day's entries, or the whole log
pub fn clear_meals(db: &Database, user_id: &str, date: Option<&str>) -> Result<ClearMealsResponse, String> {
    let date = parse_optional_date(date)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = MealEntry::clear(&conn, user_id, date)
        .map_err(|e| format!("Failed to clear meals: {}", e))?;

    tracing::info!(deleted, date = ?date, "Meals cleared");
    Ok(ClearMealsResponse {
        date: date.map(format_date),
        deleted,
    })
}

// ============================================================================
// Summary Tools
// ============================================================================

/// Totals, groups, macro split and remaining calories for a day
///
/// The meal set is read first and aggregated as one snapshot. For today, the
/// remaining calories are then mirrored into the profile.
pub fn get_daily_summary(db: &Database, user_id: &str, date: Option<&str>) -> Result<DailySummaryResponse, String> {
    let day = date_or_today(date).map_err(|e| e.to_string())?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let goals = resolve_goals(&conn, user_id).map_err(|e| format!("Failed to get goals: {}", e))?;
    let loaded = MealEntry::list(&conn, user_id, Some(day))
        .map_err(|e| format!("Failed to list meals: {}", e))?;

    // An incomplete profile has no calorie goal, so remaining is unknown
    let daily_calories = if goals.source == GOAL_SOURCE_INCOMPLETE {
        None
    } else {
        Some(goals.daily_calories)
    };
    let summary = aggregate_day(&loaded.entries, day, daily_calories);

    if day == today() {
        let has_profile = UserProfile::get(&conn, user_id)
            .map_err(|e| format!("Failed to get profile: {}", e))?
            .is_some();
        if has_profile {
            let remaining = summary.remaining_calories.map(|r| r.round() as i64);
            UserProfile::set_remaining_calories(&conn, user_id, remaining)
                .map_err(|e| format!("Failed to store remaining calories: {}", e))?;
        }
    }

    Ok(DailySummaryResponse {
        summary,
        goal_source: goals.source,
        warnings: loaded.warnings,
    })
}

/// History grouped by day, newest first
pub fn list_days(
    db: &Database,
    user_id: &str,
    limit: Option<i64>,
    offset: Option<i64>,
) -> Result<ListDaysResponse, String> {
    let limit = limit.unwrap_or(DEFAULT_DAYS_LIMIT).clamp(1, MAX_DAYS_LIMIT);
    let offset = offset.unwrap_or(0).max(0);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let days = MealEntry::day_summaries(&conn, user_id, limit, offset)
        .map_err(|e| format!("Failed to list days: {}", e))?;
    let total = MealEntry::count_days(&conn, user_id)
        .map_err(|e| format!("Failed to count days: {}", e))?;

    Ok(ListDaysResponse {
        days,
        total,
        limit,
        offset,
    })
}

/// Import a legacy meal export (JSON text)
///
/// All normalized entries are inserted in one transaction.
pub fn import_legacy_meals(db: &Database, user_id: &str, payload: &str) -> Result<ImportMealsResponse, String> {
    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| format!("Invalid input: payload is not valid JSON: {}", e))?;
    let normalized = normalize_legacy_meals(&value).map_err(|e| e.to_string())?;

    let imported = db
        .with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            for entry in &normalized.entries {
                MealEntry::create(&tx, user_id, entry)?;
            }
            tx.commit()?;
            Ok(normalized.entries.len())
        })
        .map_err(|e| format!("Failed to import meals: {}", e))?;

    tracing::info!(
        imported,
        warnings = normalized.warnings.len(),
        skipped = normalized.skipped.len(),
        "Legacy meals imported"
    );

    Ok(ImportMealsResponse {
        imported,
        warnings: normalized.warnings,
        skipped: normalized.skipped,
    })
}
