//! Food Search MCP Tools
//!
//! Thin wrappers over the configured food search provider. These block on
//! network I/O; the server runs them off the async worker threads.

use serde::Serialize;

use crate::food_search::{FoodDetails, FoodSearchError, FoodSearchPage, FoodSearchProvider};
use crate::models::Nutrition;

/// Response for search_foods
#[derive(Debug, Serialize)]
pub struct SearchFoodsResponse {
    pub query: String,
    #[serde(flatten)]
    pub results: FoodSearchPage,
    pub has_more: bool,
}

/// Response for get_food_details
#[derive(Debug, Serialize)]
pub struct FoodDetailsResponse {
    #[serde(flatten)]
    pub food: FoodDetails,
    /// Nutrition for `amount_grams`, when an amount was given
    pub scaled: Option<ScaledNutrition>,
}

#[derive(Debug, Serialize)]
pub struct ScaledNutrition {
    pub amount_grams: f64,
    pub nutrition: Nutrition,
}

fn require_provider(provider: Option<&dyn FoodSearchProvider>) -> Result<&dyn FoodSearchProvider, String> {
    provider.ok_or_else(|| FoodSearchError::NotConfigured.to_string())
}

/// Search the food database by text
pub fn search_foods(
    provider: Option<&dyn FoodSearchProvider>,
    query: &str,
    page: Option<u32>,
) -> Result<SearchFoodsResponse, String> {
    let provider = require_provider(provider)?;
    let results = provider
        .search(query, page.unwrap_or(0))
        .map_err(|e| format!("Food search failed: {}", e))?;

    Ok(SearchFoodsResponse {
        query: query.trim().to_string(),
        has_more: results.has_more(),
        results,
    })
}

/// Reference serving for one food, optionally scaled to an amount
pub fn get_food_details(
    provider: Option<&dyn FoodSearchProvider>,
    food_id: &str,
    amount_grams: Option<f64>,
) -> Result<FoodDetailsResponse, String> {
    let provider = require_provider(provider)?;
    let food = provider
        .get_details(food_id)
        .map_err(|e| format!("Failed to get food details: {}", e))?;

    let scaled = match amount_grams {
        Some(amount_grams) => Some(ScaledNutrition {
            amount_grams,
            nutrition: food.scale_to(amount_grams).map_err(|e| e.to_string())?,
        }),
        None => None,
    };

    Ok(FoodDetailsResponse { food, scaled })
}
