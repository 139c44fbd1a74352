//! Shared nutrition data structure
//!
//! Used by meal entries, food search servings and daily totals.

use serde::{Deserialize, Serialize};

/// Energy and macronutrient values
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64, // kcal
    pub protein: f64,  // grams
    pub carbs: f64,    // grams
    pub fat: f64,      // grams
}

impl Nutrition {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Scale nutrition values by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            calories: self.calories * multiplier,
            protein: self.protein * multiplier,
            carbs: self.carbs * multiplier,
            fat: self.fat * multiplier,
        }
    }

    /// Total macronutrient grams (protein + carbs + fat)
    pub fn macro_grams(&self) -> f64 {
        self.protein + self.carbs + self.fat
    }

    /// Round every value to two decimals for storage and display
    pub fn rounded(&self) -> Self {
        fn r2(v: f64) -> f64 {
            (v * 100.0).round() / 100.0
        }
        Self {
            calories: r2(self.calories),
            protein: r2(self.protein),
            carbs: r2(self.carbs),
            fat: r2(self.fat),
        }
    }
}

impl std::ops::Add for Nutrition {
    type Output = Nutrition;

    fn add(self, other: Nutrition) -> Nutrition {
        Nutrition {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            carbs: self.carbs + other.carbs,
            fat: self.fat + other.fat,
        }
    }
}

impl std::ops::Sub for Nutrition {
    type Output = Nutrition;

    fn sub(self, other: Nutrition) -> Nutrition {
        self + other.scale(-1.0)
    }
}

impl std::ops::Mul<f64> for Nutrition {
    type Output = Nutrition;

    fn mul(self, multiplier: f64) -> Nutrition {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for Nutrition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrition::zero(), |acc, n| acc + n)
    }
}

impl<'a> std::iter::Sum<&'a Nutrition> for Nutrition {
    fn sum<I: Iterator<Item = &'a Nutrition>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
