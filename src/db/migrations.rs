//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!("Applied schema migration v1");
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- PROFILES
        -- One row per user identity. Body fields stay
        -- nullable so partial updates can be merged.
        -- ============================================
        CREATE TABLE profiles (
            user_id TEXT PRIMARY KEY,
            username TEXT,
            sex TEXT CHECK(sex IN ('male', 'female')),
            height_cm REAL,
            weight_kg REAL,
            age_years INTEGER,
            activity_level TEXT,

            -- Derived goals, rewritten whenever body fields change
            daily_calories INTEGER,
            daily_water_ml INTEGER,

            -- Display mirror of the last computed summary; never read back
            -- as a source for calculations
            remaining_calories INTEGER,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- MEAL ENTRIES
        -- Nutrition already scaled to amount_grams
        -- ============================================
        CREATE TABLE meal_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            brand TEXT,
            food_id TEXT,                        -- provider id when logged from search
            meal_type TEXT NOT NULL CHECK(meal_type IN ('breakfast', 'lunch', 'dinner', 'snack', 'other')),
            date TEXT NOT NULL,                  -- ISO date: "2025-01-09"
            amount_grams REAL NOT NULL DEFAULT 0,

            calories REAL NOT NULL DEFAULT 0,
            protein REAL NOT NULL DEFAULT 0,     -- grams
            carbs REAL NOT NULL DEFAULT 0,       -- grams
            fat REAL NOT NULL DEFAULT 0,         -- grams

            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_meal_entries_user_date ON meal_entries(user_id, date);

        -- ============================================
        -- WATER INTAKE
        -- Running counter for the stored day only
        -- ============================================
        CREATE TABLE water_intake (
            user_id TEXT PRIMARY KEY,
            amount_ml INTEGER NOT NULL DEFAULT 0,
            day TEXT NOT NULL,                   -- ISO date the counter belongs to
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!needs_migration(&conn).unwrap());
    }

    #[test]
    fn test_meal_type_is_constrained() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO meal_entries (user_id, name, meal_type, date) VALUES ('u', 'x', 'brunch', '2024-01-01')",
            [],
        );
        assert!(result.is_err());
    }
}
