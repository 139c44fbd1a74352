//! Serving scaling
//!
//! Food databases report nutrition per serving; a logged meal stores it
//! scaled to the grams actually eaten.

use crate::error::{NutritionError, NutritionResult};
use crate::models::Nutrition;

/// Serving size assumed when the provider reports none
pub const DEFAULT_SERVING_GRAMS: f64 = 100.0;

/// Grams per milligram
pub const G_PER_MG: f64 = 0.001;
/// Grams per kilogram
pub const G_PER_KG: f64 = 1000.0;
/// Grams per ounce
pub const G_PER_OZ: f64 = 28.3495;
/// Grams per pound
pub const G_PER_LB: f64 = 453.592;

/// Conversion factor to grams for a serving unit.
///
/// Millilitres count as grams; food databases report liquid servings in ml
/// and nothing better is known without a density.
pub fn grams_per_unit(unit: &str) -> Option<f64> {
    match unit.trim().to_lowercase().as_str() {
        "g" | "gram" | "grams" => Some(1.0),
        "mg" | "milligram" | "milligrams" => Some(G_PER_MG),
        "kg" | "kilogram" | "kilograms" => Some(G_PER_KG),
        "oz" | "ounce" | "ounces" => Some(G_PER_OZ),
        "lb" | "lbs" | "pound" | "pounds" => Some(G_PER_LB),
        "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => Some(1.0),
        _ => None,
    }
}

/// Serving size in grams, falling back to [`DEFAULT_SERVING_GRAMS`]
pub fn serving_size_grams(amount: Option<f64>, unit: Option<&str>) -> f64 {
    let grams = match (amount, unit) {
        (Some(a), Some(u)) => grams_per_unit(u).map(|factor| a * factor),
        (Some(a), None) => Some(a),
        _ => None,
    };

    match grams {
        Some(g) if g.is_finite() && g > 0.0 => g,
        _ => {
            tracing::debug!(?amount, ?unit, "Unusable serving size, assuming 100 g");
            DEFAULT_SERVING_GRAMS
        }
    }
}

/// `per_serving × (amount_grams / serving_size_grams)`
pub fn scale_serving(
    per_serving: &Nutrition,
    serving_size_grams: f64,
    amount_grams: f64,
) -> NutritionResult<Nutrition> {
    if !amount_grams.is_finite() || amount_grams <= 0.0 {
        return Err(NutritionError::invalid(format!(
            "amount must be a positive number of grams, got {}",
            amount_grams
        )));
    }
    if !serving_size_grams.is_finite() || serving_size_grams <= 0.0 {
        return Err(NutritionError::invalid(format!(
            "serving size must be positive, got {}",
            serving_size_grams
        )));
    }

    Ok(per_serving.scale(amount_grams / serving_size_grams).rounded())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn per_100g() -> Nutrition {
        Nutrition {
            calories: 165.0,
            protein: 31.0,
            carbs: 0.0,
            fat: 3.6,
        }
    }

    #[test]
    fn test_scale_serving() {
        let scaled = scale_serving(&per_100g(), 100.0, 150.0).unwrap();
        assert!((scaled.calories - 247.5).abs() < 0.001);
        assert!((scaled.protein - 46.5).abs() < 0.001);
        assert!((scaled.fat - 5.4).abs() < 0.001);
    }

    #[test]
    fn test_scale_rejects_bad_amounts() {
        assert!(scale_serving(&per_100g(), 100.0, 0.0).is_err());
        assert!(scale_serving(&per_100g(), 100.0, -5.0).is_err());
        assert!(scale_serving(&per_100g(), 0.0, 50.0).is_err());
        assert!(scale_serving(&per_100g(), 100.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_grams_per_unit() {
        assert_eq!(grams_per_unit("g"), Some(1.0));
        assert_eq!(grams_per_unit(" OZ "), Some(G_PER_OZ));
        assert_eq!(grams_per_unit("ml"), Some(1.0));
        assert_eq!(grams_per_unit("cup"), None);
    }

    #[test]
    fn test_serving_size_grams() {
        assert_eq!(serving_size_grams(Some(30.0), Some("g")), 30.0);
        assert!((serving_size_grams(Some(1.0), Some("oz")) - G_PER_OZ).abs() < 1e-9);
        assert_eq!(serving_size_grams(Some(2.0), Some("cup")), DEFAULT_SERVING_GRAMS);
        assert_eq!(serving_size_grams(None, None), DEFAULT_SERVING_GRAMS);
        assert_eq!(serving_size_grams(Some(0.0), Some("g")), DEFAULT_SERVING_GRAMS);
    }
}
