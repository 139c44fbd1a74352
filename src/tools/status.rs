//! Nutrilog Status Tool
//!
//! Runtime status of the service and the usage guide for assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::migrations::{get_schema_version, needs_migration, SCHEMA_VERSION};
use crate::db::Database;

/// Usage guide returned by `nutrilog_instructions`
pub const NUTRILOG_INSTRUCTIONS: &str = r#"
# Nutrilog Instructions

Nutrilog tracks daily calories, macronutrients and water for one user.

## 1. Set up the profile first

`setup_profile` needs sex (male/female), height_cm, weight_kg, age_years and
activity_level (low, moderate, high). It computes:

- **BMR** (Harris-Benedict)
  - male: 88.362 + 13.397 × weight + 4.799 × height − 5.677 × age
  - female: 447.593 + 9.247 × weight + 3.098 × height − 4.330 × age
- **Daily calories** = BMR × activity multiplier (low 1.2, moderate 1.55, high 1.725)
- **Daily water** = weight × 35 ml

Use `update_profile` to change single fields later (e.g. a new weight); goals
are recomputed automatically. Without a profile, goals default to 2000 kcal
and 2000 ml. A partly filled profile also uses 2000 ml for water, but the
remaining calories stay unknown until the profile is complete.

## 2. Logging food

**From the food database** (requires FatSecret credentials):
1. `search_foods` with a query like "chicken breast" (page is zero-based)
2. `get_food_details` with the chosen `food_id` to see the reference serving
3. `log_food` with `food_id`, `amount_grams`, and `meal_type`

Nutrition is scaled: `serving value × amount_grams / serving size in grams`.

**By hand:** `log_meal` with name, calories, protein, carbs, fat (grams),
optional `amount_grams` (default 100) and `meal_type`.

Meal types: breakfast, lunch, dinner, snack (anything else is stored as "other").

## 3. Dates

- Dates are stored as YYYY-MM-DD.
- Input also accepts D.M.YYYY (e.g. 3.2.2024) and M/D/YYYY (e.g. 2/3/2024).
- Omit `date` to use today.

## 4. Daily summary

`get_daily_summary` returns totals, meals grouped by type, the macro split
(percent of total macro grams) and remaining calories (never below zero).
When nothing with macros was logged, the split is a neutral 33.3 / 33.3 / 33.3
with `placeholder: true`; do not present it as a real ratio.

`list_days` shows history per day, newest first.

## 5. Water

`add_water` adds 250 ml by default, or `amount_ml` if given. The counter
resets to zero automatically on a new day. `get_water` shows progress.

## 6. Corrections

- `delete_meal_entry` removes one entry by id (see `list_meals`).
- `clear_meals` with a `date` clears that day; without one it clears the
  whole log. Confirm with the user before clearing everything.

## 7. Importing old data

`import_legacy_meals` takes a JSON string, either
`[{"date": "...", "meals": [...]}]` or a flat array of meals with their own
`date`. Numbers may be strings. Malformed macro fields import as 0 and are
listed in `warnings`; records with unreadable dates are listed in `skipped`.
"#;

/// Runtime status of the Nutrilog service
#[derive(Debug, Clone, Serialize)]
pub struct NutrilogStatus {
    /// Build information
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub schema_version: Option<i32>,
    pub expected_schema_version: i32,
    pub needs_migration: Option<bool>,

    pub user_id: String,
    pub food_search_enabled: bool,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
    user_id: String,
    food_search_enabled: bool,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf, user_id: String, food_search_enabled: bool) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
            user_id,
            food_search_enabled,
        }
    }

    /// Get the current status
    pub fn get_status(&self, db: &Database) -> NutrilogStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        // Schema details are best effort; status must work on a broken database
        let schema = db.with_conn(|conn| Ok((get_schema_version(conn)?, needs_migration(conn)?)));
        let (schema_version, pending) = match schema {
            Ok((version, pending)) => (Some(version), Some(pending)),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read schema version");
                (None, None)
            }
        };

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        NutrilogStatus {
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            schema_version,
            expected_schema_version: SCHEMA_VERSION,
            needs_migration: pending,
            user_id: self.user_id.clone(),
            food_search_enabled: self.food_search_enabled,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
