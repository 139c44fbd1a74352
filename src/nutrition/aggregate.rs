//! Daily meal aggregation
//!
//! Pure reduction of a snapshot of meal entries into the day's totals,
//! per-meal groups, macro split and remaining calories. Callers pass the
//! finalized meal set for the day; nothing here is cached between calls.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{MealEntry, MealType, Nutrition};

/// Share reported for each macro when no macro grams were logged.
/// Only meant to draw a non-empty chart.
pub const NEUTRAL_MACRO_PCT: f64 = 33.3;

/// Percentage of total macro grams contributed by each macronutrient
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroSplit {
    pub protein_pct: f64,
    pub carbs_pct: f64,
    pub fat_pct: f64,
    /// True when the split is the neutral default rather than a real ratio
    pub placeholder: bool,
}

impl MacroSplit {
    pub fn neutral() -> Self {
        Self {
            protein_pct: NEUTRAL_MACRO_PCT,
            carbs_pct: NEUTRAL_MACRO_PCT,
            fat_pct: NEUTRAL_MACRO_PCT,
            placeholder: true,
        }
    }

    pub fn from_totals(totals: &Nutrition) -> Self {
        let total = totals.macro_grams();
        if !total.is_finite() || total <= 0.0 {
            return Self::neutral();
        }
        Self {
            protein_pct: round1(totals.protein / total * 100.0),
            carbs_pct: round1(totals.carbs / total * 100.0),
            fat_pct: round1(totals.fat / total * 100.0),
            placeholder: false,
        }
    }
}

/// Entries of one meal type, in logged order
#[derive(Debug, Clone, Serialize)]
pub struct MealGroup {
    pub meal_type: MealType,
    pub entries: Vec<MealEntry>,
    pub totals: Nutrition,
}

/// Everything the daily view shows, derived fresh on each call
#[derive(Debug, Clone, Serialize)]
pub struct DerivedDailyTotals {
    pub date: NaiveDate,
    pub totals: Nutrition,
    pub meal_count: usize,
    /// Ordered by first appearance of each meal type
    pub groups: Vec<MealGroup>,
    pub macro_split: MacroSplit,
    pub daily_calories: Option<i64>,
    /// `None` when there is no calorie goal; never negative
    pub remaining_calories: Option<f64>,
}

/// Aggregate the entries logged on `day`.
///
/// Entries from other days are ignored, so the full meal log can be passed.
pub fn aggregate_day(
    entries: &[MealEntry],
    day: NaiveDate,
    daily_calories: Option<i64>,
) -> DerivedDailyTotals {
    let todays: Vec<&MealEntry> = entries.iter().filter(|e| e.date == day).collect();

    let totals: Nutrition = todays.iter().map(|e| &e.nutrition).sum();

    DerivedDailyTotals {
        date: day,
        totals,
        meal_count: todays.len(),
        groups: group_by_meal_type(&todays),
        macro_split: MacroSplit::from_totals(&totals),
        daily_calories,
        remaining_calories: daily_calories.map(|goal| remaining_calories(goal, totals.calories)),
    }
}

/// `goal − consumed`, floored at zero
pub fn remaining_calories(goal: i64, consumed: f64) -> f64 {
    (goal as f64 - consumed).max(0.0)
}

fn group_by_meal_type(entries: &[&MealEntry]) -> Vec<MealGroup> {
    let mut groups: Vec<MealGroup> = Vec::new();

    for entry in entries {
        match groups.iter_mut().find(|g| g.meal_type == entry.meal_type) {
            Some(group) => {
                group.totals = group.totals + entry.nutrition;
                group.entries.push((*entry).clone());
            }
            None => groups.push(MealGroup {
                meal_type: entry.meal_type,
                entries: vec![(*entry).clone()],
                totals: entry.nutrition,
            }),
        }
    }

    groups
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn entry(id: i64, meal_type: MealType, date: NaiveDate, n: Nutrition) -> MealEntry {
        MealEntry {
            id,
            user_id: "u".to_string(),
            name: format!("food {}", id),
            brand: None,
            food_id: None,
            meal_type,
            date,
            amount_grams: 100.0,
            nutrition: n,
            created_at: String::new(),
        }
    }

    fn kcal(calories: f64) -> Nutrition {
        Nutrition {
            calories,
            ..Nutrition::zero()
        }
    }

    fn macros(calories: f64, protein: f64, carbs: f64, fat: f64) -> Nutrition {
        Nutrition {
            calories,
            protein,
            carbs,
            fat,
        }
    }

    #[test]
    fn test_remaining_calories_scenario() {
        let entries = vec![
            entry(1, MealType::Lunch, day(1), kcal(300.0)),
            entry(2, MealType::Dinner, day(1), kcal(450.0)),
        ];
        let totals = aggregate_day(&entries, day(1), Some(1686));
        assert_eq!(totals.meal_count, 2);
        assert!((totals.totals.calories - 750.0).abs() < 1e-9);
        assert_eq!(totals.remaining_calories, Some(936.0));
    }

    #[test]
    fn test_remaining_never_negative() {
        let entries = vec![entry(1, MealType::Dinner, day(1), kcal(2500.0))];
        let totals = aggregate_day(&entries, day(1), Some(2000));
        assert_eq!(totals.remaining_calories, Some(0.0));
    }

    #[test]
    fn test_missing_goal_leaves_remaining_unknown() {
        let entries = vec![entry(1, MealType::Dinner, day(1), kcal(500.0))];
        let totals = aggregate_day(&entries, day(1), None);
        assert_eq!(totals.remaining_calories, None);
        assert!((totals.totals.calories - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_filters_other_days() {
        let entries = vec![
            entry(1, MealType::Breakfast, day(1), kcal(100.0)),
            entry(2, MealType::Breakfast, day(2), kcal(900.0)),
        ];
        let totals = aggregate_day(&entries, day(2), Some(2000));
        assert_eq!(totals.meal_count, 1);
        assert!((totals.totals.calories - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_macro_split() {
        let entries = vec![entry(1, MealType::Lunch, day(1), macros(500.0, 30.0, 50.0, 20.0))];
        let split = aggregate_day(&entries, day(1), None).macro_split;
        assert!(!split.placeholder);
        assert_eq!(split.protein_pct, 30.0);
        assert_eq!(split.carbs_pct, 50.0);
        assert_eq!(split.fat_pct, 20.0);
    }

    #[test]
    fn test_macro_split_rounds_to_one_decimal() {
        let split = MacroSplit::from_totals(&macros(0.0, 1.0, 1.0, 1.0));
        assert_eq!(split.protein_pct, 33.3);
        assert_eq!(split.carbs_pct, 33.3);
        assert!(!split.placeholder);
    }

    #[test]
    fn test_zero_macros_use_neutral_split() {
        let entries = vec![entry(1, MealType::Snack, day(1), kcal(50.0))];
        let split = aggregate_day(&entries, day(1), None).macro_split;
        assert!(split.placeholder);
        assert_eq!(split, MacroSplit::neutral());
        assert!(split.protein_pct.is_finite());

        let empty = aggregate_day(&[], day(1), Some(2000));
        assert_eq!(empty.macro_split, MacroSplit::neutral());
        assert_eq!(empty.remaining_calories, Some(2000.0));
    }

    #[test]
    fn test_overflowing_macro_total_uses_neutral_split() {
        let entries = vec![
            entry(1, MealType::Snack, day(1), macros(100.0, 1e308, 0.0, 0.0)),
            entry(2, MealType::Snack, day(1), macros(100.0, 1e308, 0.0, 0.0)),
        ];
        let split = aggregate_day(&entries, day(1), None).macro_split;
        assert_eq!(split, MacroSplit::neutral());
        assert!(!split.protein_pct.is_nan());
    }

    #[test]
    fn test_groups_keep_first_occurrence_order() {
        let entries = vec![
            entry(1, MealType::Dinner, day(1), kcal(1.0)),
            entry(2, MealType::Breakfast, day(1), kcal(2.0)),
            entry(3, MealType::Dinner, day(1), kcal(3.0)),
            entry(4, MealType::Other, day(1), kcal(4.0)),
        ];
        let groups = aggregate_day(&entries, day(1), None).groups;
        let order: Vec<MealType> = groups.iter().map(|g| g.meal_type).collect();
        assert_eq!(order, vec![MealType::Dinner, MealType::Breakfast, MealType::Other]);
        assert_eq!(groups[0].entries.len(), 2);
        assert!((groups[0].totals.calories - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let entries = vec![
            entry(1, MealType::Lunch, day(1), macros(310.2, 12.1, 40.7, 9.9)),
            entry(2, MealType::Snack, day(1), macros(95.0, 0.5, 25.0, 0.3)),
        ];
        let a = aggregate_day(&entries, day(1), Some(1800));
        let b = aggregate_day(&entries, day(1), Some(1800));
        assert_eq!(a.totals, b.totals);
        assert_eq!(a.macro_split, b.macro_split);
        assert_eq!(a.remaining_calories, b.remaining_calories);
    }

    #[test]
    fn test_removing_entry_removes_its_contribution() {
        let removed = entry(2, MealType::Snack, day(1), macros(95.0, 0.5, 25.0, 0.3));
        let all = vec![
            entry(1, MealType::Lunch, day(1), macros(310.2, 12.1, 40.7, 9.9)),
            removed.clone(),
            entry(3, MealType::Dinner, day(1), macros(640.0, 45.0, 60.0, 22.5)),
        ];
        let rest: Vec<MealEntry> = all.iter().filter(|e| e.id != removed.id).cloned().collect();

        let diff = aggregate_day(&all, day(1), None).totals - aggregate_day(&rest, day(1), None).totals;
        assert!((diff.calories - removed.nutrition.calories).abs() < 1e-9);
        assert!((diff.protein - removed.nutrition.protein).abs() < 1e-9);
        assert!((diff.carbs - removed.nutrition.carbs).abs() < 1e-9);
        assert!((diff.fat - removed.nutrition.fat).abs() < 1e-9);
    }
}
