//! Water Intake MCP Tools

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use super::profile::resolve_goals;
use crate::db::{Database, DbResult};
use crate::models::WaterStore;
use crate::nutrition::{today, WaterCounter, WaterProgress, WATER_STEP_ML};

/// Response for get_water and add_water
#[derive(Debug, Serialize)]
pub struct WaterResponse {
    #[serde(flatten)]
    pub progress: WaterProgress,
    /// Amount just added, for add_water
    pub added_ml: Option<i64>,
    /// True when a counter left over from an earlier day was reset
    pub reset: bool,
    pub goal_source: &'static str,
}

/// Load the counter, resetting and persisting it if it belongs to another day
fn fresh_counter(conn: &Connection, user_id: &str, today: NaiveDate) -> DbResult<(WaterCounter, bool)> {
    let (mut counter, existed) = match WaterStore::get(conn, user_id)? {
        Some(c) => (c, true),
        None => (WaterCounter::new(today), false),
    };

    let reset = counter.ensure_fresh(today);
    if reset || !existed {
        WaterStore::set(conn, user_id, &counter)?;
    }
    Ok((counter, reset))
}

fn water_for_day(db: &Database, user_id: &str, day: NaiveDate) -> Result<WaterResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let (counter, reset) = fresh_counter(&conn, user_id, day)
        .map_err(|e| format!("Failed to read water intake: {}", e))?;
    let goals = resolve_goals(&conn, user_id).map_err(|e| format!("Failed to get goals: {}", e))?;

    Ok(WaterResponse {
        progress: WaterProgress::new(&counter, goals.daily_water_ml),
        added_ml: None,
        reset,
        goal_source: goals.source,
    })
}

fn add_water_on_day(db: &Database, user_id: &str, amount_ml: Option<f64>, day: NaiveDate) -> Result<WaterResponse, String> {
    let amount = amount_ml.unwrap_or(WATER_STEP_ML as f64);

    db.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        let (mut counter, reset) = fresh_counter(&tx, user_id, day)?;
        let before = counter.amount_ml;

        let added = match counter.increment(amount, day) {
            Ok(total) => total - before,
            Err(e) => return Ok(Err(e.to_string())),
        };
        WaterStore::set(&tx, user_id, &counter)?;
        let goals = resolve_goals(&tx, user_id)?;
        tx.commit()?;

        tracing::info!(added_ml = added, total_ml = counter.amount_ml, "Water added");
        Ok(Ok(WaterResponse {
            progress: WaterProgress::new(&counter, goals.daily_water_ml),
            added_ml: Some(added),
            reset,
            goal_source: goals.source,
        }))
    })
    .map_err(|e| format!("Failed to add water: {}", e))?
}

// ============================================================================
// Water Tools
// ============================================================================

/// Today's water intake against the goal
pub fn get_water(db: &Database, user_id: &str) -> Result<WaterResponse, String> {
    water_for_day(db, user_id, today())
}

/// Add water to today's counter (default 250 ml)
pub fn add_water(db: &Database, user_id: &str, amount_ml: Option<f64>) -> Result<WaterResponse, String> {
    add_water_on_day(db, user_id, amount_ml, today())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::profile::{setup_profile, ProfileSetup};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_fresh_counter_starts_at_zero() {
        let db = Database::in_memory().unwrap();
        let water = water_for_day(&db, "u1", day(1)).unwrap();
        assert_eq!(water.progress.consumed_ml, 0);
        assert_eq!(water.progress.goal_ml, 2000);
        assert_eq!(water.goal_source, "default");
        assert!(!water.reset);
    }

    #[test]
    fn test_add_default_step_and_custom_amount() {
        let db = Database::in_memory().unwrap();
        let first = add_water_on_day(&db, "u1", None, day(1)).unwrap();
        assert_eq!(first.added_ml, Some(250));

        let second = add_water_on_day(&db, "u1", Some(330.4), day(1)).unwrap();
        assert_eq!(second.added_ml, Some(330));
        assert_eq!(second.progress.consumed_ml, 580);
        assert_eq!(second.progress.remaining_ml, 1420);
    }

    #[test]
    fn test_invalid_amount_leaves_counter_alone() {
        let db = Database::in_memory().unwrap();
        add_water_on_day(&db, "u1", None, day(1)).unwrap();

        assert!(add_water_on_day(&db, "u1", Some(-100.0), day(1)).is_err());
        assert!(add_water_on_day(&db, "u1", Some(f64::NAN), day(1)).is_err());
        assert!(add_water_on_day(&db, "u1", Some(1e30), day(1)).is_err());

        let water = water_for_day(&db, "u1", day(1)).unwrap();
        assert_eq!(water.progress.consumed_ml, 250);
    }

    #[test]
    fn test_stale_counter_resets_and_persists() {
        let db = Database::in_memory().unwrap();
        add_water_on_day(&db, "u1", Some(1500.0), day(1)).unwrap();

        let next_day = water_for_day(&db, "u1", day(2)).unwrap();
        assert!(next_day.reset);
        assert_eq!(next_day.progress.consumed_ml, 0);

        let stored = WaterStore::get(&db.get_conn().unwrap(), "u1").unwrap().unwrap();
        assert_eq!(stored.day, day(2));
        assert_eq!(stored.amount_ml, 0);

        let again = water_for_day(&db, "u1", day(2)).unwrap();
        assert!(!again.reset);
    }

    #[test]
    fn test_adding_on_new_day_starts_from_zero() {
        let db = Database::in_memory().unwrap();
        add_water_on_day(&db, "u1", Some(1500.0), day(1)).unwrap();

        let water = add_water_on_day(&db, "u1", None, day(2)).unwrap();
        assert!(water.reset);
        assert_eq!(water.progress.consumed_ml, 250);
    }

    #[test]
    fn test_goal_comes_from_profile() {
        let db = Database::in_memory().unwrap();
        setup_profile(
            &db,
            "u1",
            ProfileSetup {
                username: None,
                sex: "male".to_string(),
                height_cm: 175.0,
                weight_kg: 70.0,
                age_years: 30,
                activity_level: "moderate".to_string(),
            },
        )
        .unwrap();

        let water = add_water_on_day(&db, "u1", Some(2450.0), day(1)).unwrap();
        assert_eq!(water.progress.goal_ml, 2450);
        assert_eq!(water.progress.remaining_ml, 0);
        assert_eq!(water.progress.percent_of_goal, 100.0);
        assert_eq!(water.goal_source, "profile");
    }

    #[test]
    fn test_public_tools_use_today() {
        let db = Database::in_memory().unwrap();
        let water = add_water(&db, "u1", None).unwrap();
        assert_eq!(water.progress.day, today());
        assert_eq!(get_water(&db, "u1").unwrap().progress.consumed_ml, 250);
    }
}
