//! In-memory food provider for tests and offline use

use super::{
    validate_query, FoodCandidate, FoodDetails, FoodSearchError, FoodSearchPage, FoodSearchProvider,
    FoodSearchResult, FoodServing,
};
use crate::models::Nutrition;

pub struct StaticFoodProvider {
    foods: Vec<FoodDetails>,
    page_size: u32,
}

impl StaticFoodProvider {
    pub fn new(foods: Vec<FoodDetails>, page_size: u32) -> Self {
        Self {
            foods,
            page_size: page_size.max(1),
        }
    }

    /// A handful of common foods, per 100 g
    pub fn with_sample_foods() -> Self {
        let food = |id: &str, name: &str, calories: f64, protein: f64, carbs: f64, fat: f64| FoodDetails {
            food_id: id.to_string(),
            name: name.to_string(),
            brand: "Generic".to_string(),
            serving: FoodServing {
                description: "100 g".to_string(),
                size_grams: 100.0,
                nutrition: Nutrition {
                    calories,
                    protein,
                    carbs,
                    fat,
                },
            },
        };

        Self::new(
            vec![
                food("1001", "Chicken Breast", 165.0, 31.0, 0.0, 3.6),
                food("1002", "White Rice, cooked", 130.0, 2.7, 28.2, 0.3),
                food("1003", "Banana", 89.0, 1.1, 22.8, 0.3),
                food("1004", "Oatmeal, cooked", 71.0, 2.5, 12.0, 1.5),
                food("1005", "Whole Milk", 61.0, 3.2, 4.8, 3.3),
                food("1006", "Chicken Thigh", 209.0, 26.0, 0.0, 10.9),
            ],
            crate::config::DEFAULT_SEARCH_PAGE_SIZE,
        )
    }
}

impl FoodSearchProvider for StaticFoodProvider {
    fn search(&self, text: &str, page: u32) -> FoodSearchResult<FoodSearchPage> {
        let needle = validate_query(text)?.to_lowercase();

        let matches: Vec<FoodCandidate> = self
            .foods
            .iter()
            .filter(|f| f.name.to_lowercase().contains(&needle))
            .map(|f| FoodCandidate {
                food_id: f.food_id.clone(),
                name: f.name.clone(),
                brand: Some(f.brand.clone()).filter(|b| b != "Generic"),
                description: Some(format!(
                    "Per {} - Calories: {}kcal",
                    f.serving.description, f.serving.nutrition.calories
                )),
            })
            .collect();

        let total_results = matches.len() as u32;
        let start = (page as usize).saturating_mul(self.page_size as usize);
        let foods = matches
            .into_iter()
            .skip(start)
            .take(self.page_size as usize)
            .collect();

        Ok(FoodSearchPage {
            foods,
            page,
            max_results: self.page_size,
            total_results,
        })
    }

    fn get_details(&self, food_id: &str) -> FoodSearchResult<FoodDetails> {
        self.foods
            .iter()
            .find(|f| f.food_id == food_id.trim())
            .cloned()
            .ok_or_else(|| FoodSearchError::NotFound(food_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_is_case_insensitive() {
        let provider = StaticFoodProvider::with_sample_foods();
        let page = provider.search("CHICKEN", 0).unwrap();
        assert_eq!(page.total_results, 2);
        assert_eq!(page.foods[0].name, "Chicken Breast");
        assert_eq!(page.foods[0].brand, None);
    }

    #[test]
    fn test_search_paginates() {
        let provider = StaticFoodProvider {
            page_size: 1,
            ..StaticFoodProvider::with_sample_foods()
        };
        let first = provider.search("chicken", 0).unwrap();
        let second = provider.search("chicken", 1).unwrap();
        let past_end = provider.search("chicken", 5).unwrap();

        assert_eq!(first.foods[0].food_id, "1001");
        assert_eq!(second.foods[0].food_id, "1006");
        assert!(first.has_more());
        assert!(!second.has_more());
        assert!(past_end.foods.is_empty());
    }

    #[test]
    fn test_empty_query_rejected() {
        let provider = StaticFoodProvider::with_sample_foods();
        assert!(matches!(
            provider.search("   ", 0),
            Err(FoodSearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_get_details() {
        let provider = StaticFoodProvider::with_sample_foods();
        assert_eq!(provider.get_details("1003").unwrap().name, "Banana");
        assert!(matches!(
            provider.get_details("nope"),
            Err(FoodSearchError::NotFound(_))
        ));
    }
}
