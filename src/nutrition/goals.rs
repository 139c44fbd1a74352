//! Daily goal calculator
//!
//! Harris-Benedict BMR scaled by an activity multiplier gives the daily
//! calorie goal; body weight × 35 ml gives the daily water goal.

use serde::Serialize;

use super::normalize::{parse_positive, parse_positive_int, require_positive};
use crate::error::{NutritionError, NutritionResult};
use crate::models::{ActivityLevel, Sex};

/// Water goal per kilogram of body weight
pub const WATER_ML_PER_KG: f64 = 35.0;

/// Calorie goal used when no profile exists
pub const DEFAULT_DAILY_CALORIES: i64 = 2000;
/// Water goal used when no profile exists
pub const DEFAULT_DAILY_WATER_ML: i64 = 2000;

/// Validated body measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodyMetrics {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age_years: u32,
}

impl BodyMetrics {
    pub fn new(weight_kg: f64, height_cm: f64, age_years: u32) -> NutritionResult<Self> {
        if age_years == 0 {
            return Err(NutritionError::invalid("age must be greater than 0"));
        }
        Ok(Self {
            weight_kg: require_positive("weight", weight_kg)?,
            height_cm: require_positive("height", height_cm)?,
            age_years,
        })
    }

    /// Parse form input; every field is read from its own argument
    pub fn parse(weight: &str, height: &str, age: &str) -> NutritionResult<Self> {
        Ok(Self {
            weight_kg: parse_positive("weight", weight)?,
            height_cm: parse_positive("height", height)?,
            age_years: parse_positive_int("age", age)?,
        })
    }
}

/// Computed daily targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Goals {
    /// Unrounded basal metabolic rate, kcal/day
    pub bmr: f64,
    pub daily_calories: i64,
    pub daily_water_ml: i64,
}

/// Harris-Benedict basal metabolic rate
pub fn basal_metabolic_rate(metrics: &BodyMetrics, sex: Sex) -> f64 {
    let w = metrics.weight_kg;
    let h = metrics.height_cm;
    let a = metrics.age_years as f64;
    match sex {
        Sex::Male => 88.362 + 13.397 * w + 4.799 * h - 5.677 * a,
        Sex::Female => 447.593 + 9.247 * w + 3.098 * h - 4.330 * a,
    }
}

pub fn daily_water_ml(weight_kg: f64) -> i64 {
    (weight_kg * WATER_ML_PER_KG).round() as i64
}

/// Derive the daily calorie and water goals for a profile.
///
/// The equation can go negative for extreme inputs (very old, very light);
/// the calorie goal is clamped at zero.
pub fn calculate_goals(metrics: &BodyMetrics, sex: Sex, activity: ActivityLevel) -> Goals {
    let bmr = basal_metabolic_rate(metrics, sex);
    let daily_calories = (bmr * activity.multiplier()).round().max(0.0) as i64;

    Goals {
        bmr,
        daily_calories,
        daily_water_ml: daily_water_ml(metrics.weight_kg),
    }
}
