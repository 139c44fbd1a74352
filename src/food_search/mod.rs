//! Food search
//!
//! Third-party food databases behind one trait. The host only ever needs
//! text search (paginated) and per-food serving details; serving scaling
//! turns those details into a meal entry.

mod fatsecret;
mod fixture;

pub use fatsecret::FatSecretClient;
pub use fixture::StaticFoodProvider;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::NutritionResult;
use crate::models::Nutrition;
use crate::nutrition::scale_serving;

#[derive(Debug, Error)]
pub enum FoodSearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Food API error: {0}")]
    Api(String),

    #[error("Food not found: {0}")]
    NotFound(String),

    #[error("Unexpected response: {0}")]
    Parse(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Food search is not configured (set FATSECRET_CLIENT_ID and FATSECRET_CLIENT_SECRET)")]
    NotConfigured,
}

pub type FoodSearchResult<T> = Result<T, FoodSearchError>;

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodCandidate {
    pub food_id: String,
    pub name: String,
    pub brand: Option<String>,
    /// Provider's one-line nutrition summary, e.g. "Per 100g - Calories: 165kcal | ..."
    pub description: Option<String>,
}

/// One page of search results
#[derive(Debug, Clone, Serialize)]
pub struct FoodSearchPage {
    pub foods: Vec<FoodCandidate>,
    /// Zero-based page number
    pub page: u32,
    pub max_results: u32,
    pub total_results: u32,
}

impl FoodSearchPage {
    pub fn has_more(&self) -> bool {
        (self.page as u64 + 1) * (self.max_results as u64) < self.total_results as u64
    }
}

/// Nutrition for one reference serving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodServing {
    pub description: String,
    pub size_grams: f64,
    pub nutrition: Nutrition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodDetails {
    pub food_id: String,
    pub name: String,
    /// "Generic" for unbranded foods
    pub brand: String,
    pub serving: FoodServing,
}

impl FoodDetails {
    /// Nutrition for `amount_grams` of this food
    pub fn scale_to(&self, amount_grams: f64) -> NutritionResult<Nutrition> {
        scale_serving(&self.serving.nutrition, self.serving.size_grams, amount_grams)
    }
}

/// A food database
pub trait FoodSearchProvider: Send + Sync {
    /// Search by free text; `page` is zero-based
    fn search(&self, text: &str, page: u32) -> FoodSearchResult<FoodSearchPage>;

    fn get_details(&self, food_id: &str) -> FoodSearchResult<FoodDetails>;
}

pub(crate) fn validate_query(text: &str) -> FoodSearchResult<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(FoodSearchError::InvalidQuery("search text is empty".to_string()));
    }
    Ok(trimmed)
}
