//! Meal Entry model
//!
//! A logged food with its nutrition already scaled to the amount eaten.
//! Entries are never edited; they are created and deleted.

use chrono::NaiveDate;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::Nutrition;
use crate::db::DbResult;
use crate::error::PartialDataWarning;
use crate::nutrition::dates::{format_date, parse_date};
use crate::nutrition::normalize::coerce_sql_number;

/// Meal type enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Other,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
            MealType::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => MealType::Breakfast,
            "lunch" => MealType::Lunch,
            "dinner" => MealType::Dinner,
            "snack" | "snacks" => MealType::Snack,
            _ => MealType::Other,
        }
    }
}

/// A logged meal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub brand: Option<String>,
    /// Food search provider id, when logged from a search result
    pub food_id: Option<String>,
    pub meal_type: MealType,
    pub date: NaiveDate,
    pub amount_grams: f64,
    pub nutrition: Nutrition,
    pub created_at: String,
}

/// Data for creating a meal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealEntryCreate {
    pub name: String,
    pub brand: Option<String>,
    pub food_id: Option<String>,
    pub meal_type: MealType,
    pub date: NaiveDate,
    pub amount_grams: f64,
    pub nutrition: Nutrition,
}

/// Entries read from the store plus any fields that had to be coerced
#[derive(Debug, Default)]
pub struct LoadedMeals {
    pub entries: Vec<MealEntry>,
    pub warnings: Vec<PartialDataWarning>,
}

/// Per-day totals for the history view
#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub date: String,
    pub meal_count: i64,
    pub nutrition: Nutrition,
}

impl MealEntry {
    /// Create from a database row.
    ///
    /// Numeric columns are read loosely: a value SQLite kept as text is
    /// parsed, and anything unusable becomes zero with a warning.
    fn from_row(
        row: &Row,
        warnings: &mut Vec<PartialDataWarning>,
    ) -> rusqlite::Result<Option<Self>> {
        let id: i64 = row.get("id")?;
        let label = format!("meal_entry {}", id);

        let raw_date: String = row.get("date")?;
        let date = match parse_date(&raw_date) {
            Ok(d) => d,
            Err(_) => {
                warnings.push(PartialDataWarning::new(&label, "date", Some(raw_date)));
                return Ok(None);
            }
        };

        let mut number = |column: &str| -> rusqlite::Result<f64> {
            let value: SqlValue = row.get(column)?;
            Ok(match coerce_sql_number(&value) {
                Some(v) if v >= 0.0 => v,
                _ => {
                    warnings.push(PartialDataWarning::new(&label, column, Some(format!("{:?}", value))));
                    0.0
                }
            })
        };

        let nutrition = Nutrition {
            calories: number("calories")?,
            protein: number("protein")?,
            carbs: number("carbs")?,
            fat: number("fat")?,
        };
        let amount_grams = number("amount_grams")?;

        let meal_type: String = row.get("meal_type")?;

        Ok(Some(Self {
            id,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            brand: row.get("brand")?,
            food_id: row.get("food_id")?,
            meal_type: MealType::from_str(&meal_type),
            date,
            amount_grams,
            nutrition,
            created_at: row.get("created_at")?,
        }))
    }

    fn query(conn: &Connection, sql: &str, params: &[&dyn rusqlite::ToSql]) -> DbResult<LoadedMeals> {
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;

        let mut loaded = LoadedMeals::default();
        while let Some(row) = rows.next()? {
            if let Some(entry) = Self::from_row(row, &mut loaded.warnings)? {
                loaded.entries.push(entry);
            }
        }
        Ok(loaded)
    }

    /// Create a new meal entry
    pub fn create(conn: &Connection, user_id: &str, data: &MealEntryCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO meal_entries (
                user_id, name, brand, food_id, meal_type, date, amount_grams,
                calories, protein, carbs, fat
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                user_id,
                data.name,
                data.brand,
                data.food_id,
                data.meal_type.as_str(),
                format_date(data.date),
                data.amount_grams,
                data.nutrition.calories,
                data.nutrition.protein,
                data.nutrition.carbs,
                data.nutrition.fat,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, user_id, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a meal entry by ID, scoped to its owner
    pub fn get_by_id(conn: &Connection, user_id: &str, id: i64) -> DbResult<Option<Self>> {
        let loaded = Self::query(
            conn,
            "SELECT * FROM meal_entries WHERE id = ?1 AND user_id = ?2",
            &[&id, &user_id],
        )?;
        Ok(loaded.entries.into_iter().next())
    }

    /// List a user's entries, optionally for one day, in logged order
    pub fn list(conn: &Connection, user_id: &str, date: Option<NaiveDate>) -> DbResult<LoadedMeals> {
        match date {
            Some(date) => Self::query(
                conn,
                "SELECT * FROM meal_entries WHERE user_id = ?1 AND date = ?2 ORDER BY id",
                &[&user_id, &format_date(date)],
            ),
            None => Self::query(
                conn,
                "SELECT * FROM meal_entries WHERE user_id = ?1 ORDER BY date, id",
                &[&user_id],
            ),
        }
    }

    /// Delete a meal entry
    pub fn delete(conn: &Connection, user_id: &str, id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM meal_entries WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(rows > 0)
    }

    /// Delete all of a user's entries, or only one day's
    pub fn clear(conn: &Connection, user_id: &str, date: Option<NaiveDate>) -> DbResult<usize> {
        let rows = match date {
            Some(date) => conn.execute(
                "DELETE FROM meal_entries WHERE user_id = ?1 AND date = ?2",
                params![user_id, format_date(date)],
            )?,
            None => conn.execute("DELETE FROM meal_entries WHERE user_id = ?1", [user_id])?,
        };
        Ok(rows)
    }

    /// Per-day totals, newest day first.
    ///
    /// Rows go through the same loose reading as `list`, so a day's totals
    /// match its daily summary even for hand-edited rows.
    pub fn day_summaries(
        conn: &Connection,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<DaySummary>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT date
            FROM meal_entries
            WHERE user_id = ?1
            ORDER BY date DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )?;
        let dates = stmt
            .query_map(params![user_id, limit, offset], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut days = Vec::with_capacity(dates.len());
        for date in dates {
            let loaded = Self::query(
                conn,
                "SELECT * FROM meal_entries WHERE user_id = ?1 AND date = ?2 ORDER BY id",
                &[&user_id, &date],
            )?;
            if !loaded.warnings.is_empty() {
                tracing::debug!(%date, warnings = loaded.warnings.len(), "Coerced malformed meal values");
            }
            if loaded.entries.is_empty() {
                continue;
            }
            days.push(DaySummary {
                date,
                meal_count: loaded.entries.len() as i64,
                nutrition: loaded.entries.iter().map(|e| &e.nutrition).sum::<Nutrition>().rounded(),
            });
        }

        Ok(days)
    }

    /// Number of distinct days with at least one entry
    pub fn count_days(conn: &Connection, user_id: &str) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT date) FROM meal_entries WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
