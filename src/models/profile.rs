//! User profile model
//!
//! Body parameters and the goals derived from them, one row per user.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::nutrition::{BodyMetrics, Goals};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Some(Sex::Male),
            "female" | "f" => Some(Sex::Female),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Low,
    Moderate,
    High,
    /// Anything unrecognized; the goal equals plain BMR
    Unspecified,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Low => "low",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::High => "high",
            ActivityLevel::Unspecified => "unspecified",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" => ActivityLevel::Low,
            "moderate" => ActivityLevel::Moderate,
            "high" => ActivityLevel::High,
            _ => ActivityLevel::Unspecified,
        }
    }

    /// Multiplier applied to BMR
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Low => 1.2,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::High => 1.725,
            ActivityLevel::Unspecified => 1.0,
        }
    }
}

/// A user's profile. Body fields are optional so partial updates can be
/// stored before setup is complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub username: Option<String>,
    pub sex: Option<Sex>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub age_years: Option<u32>,
    pub activity_level: Option<ActivityLevel>,
    pub daily_calories: Option<i64>,
    pub daily_water_ml: Option<i64>,
    /// Mirror of the last daily summary, for display only
    pub remaining_calories: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields to merge into a profile; `None` leaves the stored value alone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub sex: Option<Sex>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub age_years: Option<u32>,
    pub activity_level: Option<ActivityLevel>,
}

impl UserProfile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let sex: Option<String> = row.get("sex")?;
        let activity: Option<String> = row.get("activity_level")?;
        Ok(Self {
            user_id: row.get("user_id")?,
            username: row.get("username")?,
            sex: sex.as_deref().and_then(Sex::from_str),
            height_cm: row.get("height_cm")?,
            weight_kg: row.get("weight_kg")?,
            age_years: row.get("age_years")?,
            activity_level: activity.as_deref().map(ActivityLevel::from_str),
            daily_calories: row.get("daily_calories")?,
            daily_water_ml: row.get("daily_water_ml")?,
            remaining_calories: row.get("remaining_calories")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Everything the goal calculator needs, if the profile is complete
    pub fn goal_inputs(&self) -> Option<(BodyMetrics, Sex, ActivityLevel)> {
        let metrics = BodyMetrics::new(self.weight_kg?, self.height_cm?, self.age_years?).ok()?;
        Some((metrics, self.sex?, self.activity_level?))
    }

    /// Get the profile for a user
    pub fn get(conn: &Connection, user_id: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM profiles WHERE user_id = ?1")?;

        let result = stmt.query_row([user_id], Self::from_row);
        match result {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Merge fields into the user's profile, creating it if needed.
    ///
    /// Last write wins per field.
    pub fn upsert(conn: &Connection, user_id: &str, data: &ProfileUpdate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO profiles (user_id, username, sex, height_cm, weight_kg, age_years, activity_level)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(user_id) DO UPDATE SET
                username = COALESCE(excluded.username, profiles.username),
                sex = COALESCE(excluded.sex, profiles.sex),
                height_cm = COALESCE(excluded.height_cm, profiles.height_cm),
                weight_kg = COALESCE(excluded.weight_kg, profiles.weight_kg),
                age_years = COALESCE(excluded.age_years, profiles.age_years),
                activity_level = COALESCE(excluded.activity_level, profiles.activity_level),
                updated_at = datetime('now')
            "#,
            params![
                user_id,
                data.username,
                data.sex.map(|s| s.as_str()),
                data.height_cm,
                data.weight_kg,
                data.age_years,
                data.activity_level.map(|a| a.as_str()),
            ],
        )?;

        Self::get(conn, user_id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Store (or clear) the derived goals
    pub fn set_goals(conn: &Connection, user_id: &str, goals: Option<&Goals>) -> DbResult<()> {
        conn.execute(
            r#"
            UPDATE profiles SET
                daily_calories = ?1,
                daily_water_ml = ?2,
                updated_at = datetime('now')
            WHERE user_id = ?3
            "#,
            params![
                goals.map(|g| g.daily_calories),
                goals.map(|g| g.daily_water_ml),
                user_id,
            ],
        )?;
        Ok(())
    }

    /// Mirror the latest remaining-calories figure for display
    pub fn set_remaining_calories(conn: &Connection, user_id: &str, remaining: Option<i64>) -> DbResult<()> {
        conn.execute(
            "UPDATE profiles SET remaining_calories = ?1 WHERE user_id = ?2",
            params![remaining, user_id],
        )?;
        Ok(())
    }
}
