//! Nutrition calculation module
//!
//! Pure computations: goals, daily aggregation, the water counter, and the
//! normalization steps that produce their typed inputs.

pub mod aggregate;
pub mod dates;
pub mod goals;
pub mod normalize;
pub mod serving;
pub mod water;

pub use aggregate::{aggregate_day, DerivedDailyTotals, MacroSplit, MealGroup};
pub use dates::{date_or_today, format_date, normalize_date, parse_date, today};
pub use goals::{
    basal_metabolic_rate, calculate_goals, BodyMetrics, Goals, DEFAULT_DAILY_CALORIES,
    DEFAULT_DAILY_WATER_ML,
};
pub use normalize::{normalize_legacy_meals, NormalizedMeals};
pub use serving::{scale_serving, serving_size_grams};
pub use water::{WaterCounter, WaterProgress, WaterState, MAX_WATER_ADD_ML, WATER_STEP_ML};
