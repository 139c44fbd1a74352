//! Water intake model
//!
//! Persists the single running counter per user.

use rusqlite::{params, Connection};

use crate::db::DbResult;
use crate::nutrition::dates::{format_date, parse_date};
use crate::nutrition::WaterCounter;

pub struct WaterStore;

impl WaterStore {
    /// Stored counter for a user, if any
    ///
    /// A stored day that no longer parses is treated as no counter at all.
    pub fn get(conn: &Connection, user_id: &str) -> DbResult<Option<WaterCounter>> {
        let result = conn.query_row(
            "SELECT amount_ml, day FROM water_intake WHERE user_id = ?1",
            [user_id],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
        );

        match result {
            Ok((amount_ml, day)) => match parse_date(&day) {
                Ok(day) => Ok(Some(WaterCounter { amount_ml, day })),
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "Discarding water counter with unreadable day");
                    Ok(None)
                }
            },
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the user's counter
    pub fn set(conn: &Connection, user_id: &str, counter: &WaterCounter) -> DbResult<()> {
        conn.execute(
            r#"
            INSERT INTO water_intake (user_id, amount_ml, day)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                amount_ml = excluded.amount_ml,
                day = excluded.day,
                updated_at = datetime('now')
            "#,
            params![user_id, counter.amount_ml, format_date(counter.day)],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use chrono::NaiveDate;

    #[test]
    fn test_round_trip_and_overwrite() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        assert!(WaterStore::get(&conn, "u1").unwrap().is_none());

        let day = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        WaterStore::set(&conn, "u1", &WaterCounter { amount_ml: 500, day }).unwrap();
        WaterStore::set(&conn, "u1", &WaterCounter { amount_ml: 750, day }).unwrap();

        let stored = WaterStore::get(&conn, "u1").unwrap().unwrap();
        assert_eq!(stored.amount_ml, 750);
        assert_eq!(stored.day, day);
    }

    #[test]
    fn test_unreadable_day_is_ignored() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO water_intake (user_id, amount_ml, day) VALUES ('u1', 900, 'Tuesday')",
            [],
        )
        .unwrap();

        assert!(WaterStore::get(&conn, "u1").unwrap().is_none());
    }
}
