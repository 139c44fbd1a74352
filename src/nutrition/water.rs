//! Daily water counter
//!
//! A counter belongs to exactly one calendar day. Reading it on a later day
//! resets it to zero first; increments only ever add.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{NutritionError, NutritionResult};

/// One glass, the quick-add step
pub const WATER_STEP_ML: i64 = 250;

/// Largest single addition accepted, in ml
pub const MAX_WATER_ADD_ML: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterState {
    /// Counter reflects `today`
    Fresh,
    /// Counter belongs to an earlier (or later) day
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterCounter {
    pub amount_ml: i64,
    pub day: NaiveDate,
}

impl WaterCounter {
    pub fn new(day: NaiveDate) -> Self {
        Self { amount_ml: 0, day }
    }

    pub fn state(&self, today: NaiveDate) -> WaterState {
        if self.day == today {
            WaterState::Fresh
        } else {
            WaterState::Stale
        }
    }

    /// Reset a stale counter to zero for `today`.
    ///
    /// Returns true when a reset happened (the caller should persist it).
    /// A counter that is already fresh is left untouched.
    pub fn ensure_fresh(&mut self, today: NaiveDate) -> bool {
        match self.state(today) {
            WaterState::Fresh => false,
            WaterState::Stale => {
                tracing::debug!(stored_day = %self.day, %today, "Resetting stale water counter");
                *self = Self::new(today);
                true
            }
        }
    }

    /// Add `amount_ml` to today's total, resetting a stale counter first
    pub fn increment(&mut self, amount_ml: f64, today: NaiveDate) -> NutritionResult<i64> {
        let amount = validate_amount(amount_ml)?;
        let base = if self.state(today) == WaterState::Fresh { self.amount_ml } else { 0 };
        let total = base
            .checked_add(amount)
            .ok_or_else(|| NutritionError::invalid("water total is out of range"))?;
        self.ensure_fresh(today);
        self.amount_ml = total;
        Ok(total)
    }
}

fn validate_amount(amount_ml: f64) -> NutritionResult<i64> {
    if !amount_ml.is_finite() || amount_ml <= 0.0 {
        return Err(NutritionError::invalid(format!(
            "water amount must be a positive number of ml, got {}",
            amount_ml
        )));
    }
    let rounded = amount_ml.round();
    if rounded < 1.0 {
        return Err(NutritionError::invalid("water amount must be at least 1 ml"));
    }
    if rounded > MAX_WATER_ADD_ML as f64 {
        return Err(NutritionError::invalid(format!(
            "water amount must be at most {} ml per add, got {}",
            MAX_WATER_ADD_ML, amount_ml
        )));
    }
    Ok(rounded as i64)
}

/// Consumption against the daily water goal
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaterProgress {
    pub day: NaiveDate,
    pub consumed_ml: i64,
    pub goal_ml: i64,
    pub remaining_ml: i64,
    pub percent_of_goal: f64,
}

impl WaterProgress {
    pub fn new(counter: &WaterCounter, goal_ml: i64) -> Self {
        let percent_of_goal = if goal_ml > 0 {
            ((counter.amount_ml as f64 / goal_ml as f64) * 1000.0).round() / 10.0
        } else {
            0.0
        };
        Self {
            day: counter.day,
            consumed_ml: counter.amount_ml,
            goal_ml,
            remaining_ml: (goal_ml - counter.amount_ml).max(0),
            percent_of_goal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_ensure_fresh_same_day_is_noop() {
        let mut counter = WaterCounter { amount_ml: 750, day: day(3) };
        assert!(!counter.ensure_fresh(day(3)));
        assert!(!counter.ensure_fresh(day(3)));
        assert_eq!(counter.amount_ml, 750);
    }

    #[test]
    fn test_stale_counter_resets_before_increment() {
        let mut counter = WaterCounter { amount_ml: 1750, day: day(2) };
        assert_eq!(counter.state(day(3)), WaterState::Stale);

        let total = counter.increment(WATER_STEP_ML as f64, day(3)).unwrap();
        assert_eq!(total, 250);
        assert_eq!(counter.day, day(3));
        assert_eq!(counter.state(day(3)), WaterState::Fresh);
    }

    #[test]
    fn test_increment_accumulates() {
        let mut counter = WaterCounter::new(day(3));
        counter.increment(250.0, day(3)).unwrap();
        counter.increment(250.0, day(3)).unwrap();
        assert_eq!(counter.increment(330.0, day(3)).unwrap(), 830);
    }

    #[test]
    fn test_rejects_invalid_amounts() {
        let mut counter = WaterCounter { amount_ml: 500, day: day(3) };
        assert!(matches!(
            counter.increment(-250.0, day(3)),
            Err(NutritionError::InvalidInput(_))
        ));
        assert!(counter.increment(0.0, day(3)).is_err());
        assert!(counter.increment(f64::NAN, day(3)).is_err());
        assert!(counter.increment(0.2, day(3)).is_err());
        assert_eq!(counter.amount_ml, 500);
    }

    #[test]
    fn test_rejects_oversized_amounts() {
        let mut counter = WaterCounter { amount_ml: 250, day: day(3) };
        assert!(matches!(
            counter.increment(1e30, day(3)),
            Err(NutritionError::InvalidInput(_))
        ));
        assert!(counter.increment((MAX_WATER_ADD_ML + 1) as f64, day(3)).is_err());
        assert_eq!(counter.amount_ml, 250);

        assert_eq!(counter.increment(MAX_WATER_ADD_ML as f64, day(3)).unwrap(), 10_250);
    }

    #[test]
    fn test_total_overflow_is_rejected() {
        let mut counter = WaterCounter { amount_ml: i64::MAX - 100, day: day(3) };
        assert!(matches!(
            counter.increment(250.0, day(3)),
            Err(NutritionError::InvalidInput(_))
        ));
        assert_eq!(counter.amount_ml, i64::MAX - 100);
    }

    #[test]
    fn test_rejected_increment_does_not_reset_stale_counter() {
        let mut counter = WaterCounter { amount_ml: 500, day: day(2) };
        assert!(counter.increment(-1.0, day(3)).is_err());
        assert_eq!(counter.day, day(2));
    }

    #[test]
    fn test_progress() {
        let counter = WaterCounter { amount_ml: 1225, day: day(3) };
        let progress = WaterProgress::new(&counter, 2450);
        assert_eq!(progress.remaining_ml, 1225);
        assert_eq!(progress.percent_of_goal, 50.0);

        let over = WaterProgress::new(&WaterCounter { amount_ml: 3000, day: day(3) }, 2450);
        assert_eq!(over.remaining_ml, 0);
    }
}
