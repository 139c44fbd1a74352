//! Profile and Goal MCP Tools
//!
//! Tools for setting up the user's body profile and reading the daily goals
//! derived from it.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::{Database, DbResult};
use crate::models::{ActivityLevel, ProfileUpdate, Sex, UserProfile};
use crate::nutrition::normalize::require_positive;
use crate::nutrition::{calculate_goals, BodyMetrics, Goals, DEFAULT_DAILY_CALORIES, DEFAULT_DAILY_WATER_ML};

/// Input for setup_profile; every body field is required
#[derive(Debug, Clone)]
pub struct ProfileSetup {
    pub username: Option<String>,
    pub sex: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age_years: u32,
    pub activity_level: String,
}

/// Input for update_profile; absent fields keep their stored value
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub sex: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub age_years: Option<u32>,
    pub activity_level: Option<String>,
}

/// Profile together with the goals derived from it
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: UserProfile,
    /// `None` until sex, height, weight, age and activity level are all set
    pub goals: Option<Goals>,
}

/// Daily targets and where they came from
#[derive(Debug, Clone, Serialize)]
pub struct GoalsResponse {
    pub daily_calories: i64,
    pub daily_water_ml: i64,
    pub bmr: Option<f64>,
    /// One of the `GOAL_SOURCE_*` values
    pub source: &'static str,
}

/// Goals computed from a complete profile
pub const GOAL_SOURCE_PROFILE: &str = "profile";
/// No profile exists; default goals apply
pub const GOAL_SOURCE_DEFAULT: &str = "default";
/// A profile exists but lacks fields needed for goals; defaults apply
/// except that remaining calories are unknown
pub const GOAL_SOURCE_INCOMPLETE: &str = "incomplete_profile";

impl GoalsResponse {
    pub fn defaults() -> Self {
        Self {
            daily_calories: DEFAULT_DAILY_CALORIES,
            daily_water_ml: DEFAULT_DAILY_WATER_ML,
            bmr: None,
            source: GOAL_SOURCE_DEFAULT,
        }
    }
}

fn parse_sex(raw: &str) -> Result<Sex, String> {
    Sex::from_str(raw).ok_or_else(|| format!("Invalid input: sex must be 'male' or 'female', got '{}'", raw))
}

fn parse_activity(raw: &str) -> ActivityLevel {
    let level = ActivityLevel::from_str(raw);
    if level == ActivityLevel::Unspecified {
        tracing::warn!(activity_level = raw, "Unrecognized activity level, goal will equal BMR");
    }
    level
}

fn goals_for(profile: &UserProfile) -> Option<Goals> {
    profile
        .goal_inputs()
        .map(|(metrics, sex, activity)| calculate_goals(&metrics, sex, activity))
}

/// Goals for a user, falling back to the defaults when there is no profile
/// or the profile has no stored goals yet
pub fn resolve_goals(conn: &Connection, user_id: &str) -> DbResult<GoalsResponse> {
    let profile = match UserProfile::get(conn, user_id)? {
        Some(p) => p,
        None => {
            tracing::debug!(user_id, "No profile, using default goals");
            return Ok(GoalsResponse::defaults());
        }
    };

    match (profile.daily_calories, profile.daily_water_ml) {
        (Some(daily_calories), Some(daily_water_ml)) => Ok(GoalsResponse {
            daily_calories,
            daily_water_ml,
            bmr: goals_for(&profile).map(|g| g.bmr),
            source: GOAL_SOURCE_PROFILE,
        }),
        _ => Ok(GoalsResponse {
            source: GOAL_SOURCE_INCOMPLETE,
            ..GoalsResponse::defaults()
        }),
    }
}

// ============================================================================
// Profile Tools
// ============================================================================

/// Create or replace the body profile and store freshly computed goals
pub fn setup_profile(db: &Database, user_id: &str, setup: ProfileSetup) -> Result<ProfileResponse, String> {
    let sex = parse_sex(&setup.sex)?;
    let activity = parse_activity(&setup.activity_level);
    let metrics = BodyMetrics::new(setup.weight_kg, setup.height_cm, setup.age_years)
        .map_err(|e| e.to_string())?;
    let goals = calculate_goals(&metrics, sex, activity);

    let update = ProfileUpdate {
        username: setup.username.filter(|u| !u.trim().is_empty()),
        sex: Some(sex),
        height_cm: Some(metrics.height_cm),
        weight_kg: Some(metrics.weight_kg),
        age_years: Some(metrics.age_years),
        activity_level: Some(activity),
    };

    let profile = db
        .with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            UserProfile::upsert(&tx, user_id, &update)?;
            UserProfile::set_goals(&tx, user_id, Some(&goals))?;
            let profile = UserProfile::get(&tx, user_id)?;
            tx.commit()?;
            Ok(profile)
        })
        .map_err(|e| format!("Failed to save profile: {}", e))?
        .ok_or_else(|| format!("Profile for '{}' vanished after saving", user_id))?;

    tracing::info!(
        user_id,
        daily_calories = goals.daily_calories,
        daily_water_ml = goals.daily_water_ml,
        "Profile set up"
    );

    Ok(ProfileResponse {
        profile,
        goals: Some(goals),
    })
}

/// Merge changed fields into the profile; goals are recomputed whenever the
/// merged profile is complete
pub fn update_profile(db: &Database, user_id: &str, changes: ProfileChanges) -> Result<ProfileResponse, String> {
    let update = ProfileUpdate {
        username: changes.username.filter(|u| !u.trim().is_empty()),
        sex: changes.sex.as_deref().map(parse_sex).transpose()?,
        height_cm: changes
            .height_cm
            .map(|h| require_positive("height", h))
            .transpose()
            .map_err(|e| e.to_string())?,
        weight_kg: changes
            .weight_kg
            .map(|w| require_positive("weight", w))
            .transpose()
            .map_err(|e| e.to_string())?,
        age_years: match changes.age_years {
            Some(0) => return Err("Invalid input: age must be greater than 0".to_string()),
            other => other,
        },
        activity_level: changes.activity_level.as_deref().map(parse_activity),
    };

    db.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        let merged = UserProfile::upsert(&tx, user_id, &update)?;
        let goals = goals_for(&merged);
        if goals.is_some() {
            UserProfile::set_goals(&tx, user_id, goals.as_ref())?;
        }
        let profile = UserProfile::get(&tx, user_id)?;
        tx.commit()?;
        Ok(profile.map(|profile| ProfileResponse { profile, goals }))
    })
    .map_err(|e| format!("Failed to update profile: {}", e))?
    .ok_or_else(|| format!("Profile for '{}' vanished after saving", user_id))
}

/// Get the profile; a missing profile is an error here
pub fn get_profile(db: &Database, user_id: &str) -> Result<ProfileResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let profile = UserProfile::get(&conn, user_id)
        .map_err(|e| format!("Failed to get profile: {}", e))?
        .ok_or_else(|| format!("Not found: no profile for user '{}'", user_id))?;

    let goals = goals_for(&profile);
    Ok(ProfileResponse { profile, goals })
}

/// Get the daily goals, degrading to the defaults without a profile
pub fn get_goals(db: &Database, user_id: &str) -> Result<GoalsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    resolve_goals(&conn, user_id).map_err(|e| format!("Failed to get goals: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn female_setup() -> ProfileSetup {
        ProfileSetup {
            username: Some("sam".to_string()),
            sex: "female".to_string(),
            height_cm: 165.0,
            weight_kg: 60.0,
            age_years: 25,
            activity_level: "low".to_string(),
        }
    }

    #[test]
    fn test_setup_profile_stores_goals() {
        let db = Database::in_memory().unwrap();
        let response = setup_profile(&db, "u1", female_setup()).unwrap();

        let goals = response.goals.unwrap();
        assert_eq!(goals.daily_calories, 1686);
        assert_eq!(goals.daily_water_ml, 2100);
        assert_eq!(response.profile.daily_calories, Some(1686));

        let stored = get_goals(&db, "u1").unwrap();
        assert_eq!(stored.source, "profile");
        assert_eq!(stored.daily_calories, 1686);
        assert!((stored.bmr.unwrap() - 1405.333).abs() < 1e-6);
    }

    #[test]
    fn test_setup_profile_rejects_bad_input() {
        let db = Database::in_memory().unwrap();

        let bad_sex = ProfileSetup {
            sex: "robot".to_string(),
            ..female_setup()
        };
        assert!(setup_profile(&db, "u1", bad_sex).unwrap_err().contains("sex"));

        let bad_weight = ProfileSetup {
            weight_kg: 0.0,
            ..female_setup()
        };
        assert!(setup_profile(&db, "u1", bad_weight).is_err());

        assert!(get_profile(&db, "u1").is_err());
    }

    #[test]
    fn test_unknown_activity_uses_bmr() {
        let db = Database::in_memory().unwrap();
        let setup = ProfileSetup {
            sex: "male".to_string(),
            height_cm: 175.0,
            weight_kg: 70.0,
            age_years: 30,
            activity_level: "couch".to_string(),
            username: None,
        };
        let goals = setup_profile(&db, "u1", setup).unwrap().goals.unwrap();
        assert_eq!(goals.daily_calories, 1696);
    }

    #[test]
    fn test_update_profile_recomputes_goals() {
        let db = Database::in_memory().unwrap();
        setup_profile(&db, "u1", female_setup()).unwrap();

        let response = update_profile(
            &db,
            "u1",
            ProfileChanges {
                activity_level: Some("moderate".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        // 1405.333 × 1.55
        assert_eq!(response.goals.unwrap().daily_calories, 2178);
        assert_eq!(response.profile.daily_calories, Some(2178));
        assert_eq!(response.profile.weight_kg, Some(60.0));
    }

    #[test]
    fn test_partial_profile_has_no_goals() {
        let db = Database::in_memory().unwrap();
        let response = update_profile(
            &db,
            "u1",
            ProfileChanges {
                weight_kg: Some(80.0),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(response.goals.is_none());
        let goals = get_goals(&db, "u1").unwrap();
        assert_eq!(goals.source, GOAL_SOURCE_INCOMPLETE);
        assert_eq!(goals.daily_water_ml, 2000);
    }

    #[test]
    fn test_update_profile_validates_fields() {
        let db = Database::in_memory().unwrap();
        let err = update_profile(
            &db,
            "u1",
            ProfileChanges {
                age_years: Some(0),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.contains("age"));
    }

    #[test]
    fn test_goals_default_without_profile() {
        let db = Database::in_memory().unwrap();
        let goals = get_goals(&db, "nobody").unwrap();
        assert_eq!(goals.daily_calories, 2000);
        assert_eq!(goals.daily_water_ml, 2000);
        assert_eq!(goals.source, "default");
        assert!(goals.bmr.is_none());
    }
}
