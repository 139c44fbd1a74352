//! Data models
//!
//! Rust structs representing database entities.

mod meal_entry;
mod nutrition;
mod profile;
mod water;

pub use meal_entry::{DaySummary, LoadedMeals, MealEntry, MealEntryCreate, MealType};
pub use nutrition::Nutrition;
pub use profile::{ActivityLevel, ProfileUpdate, Sex, UserProfile};
pub use water::WaterStore;
