//! Nutrilog MCP Server Implementation
//!
//! Implements the MCP server with all Nutrilog tools.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::db::Database;
use crate::food_search::{FatSecretClient, FoodSearchError, FoodSearchProvider};
use crate::tools::food_search;
use crate::tools::meals::{self, LogFoodRequest, ManualMeal};
use crate::tools::profile::{self, ProfileChanges, ProfileSetup};
use crate::tools::status::{StatusTracker, NUTRILOG_INSTRUCTIONS};
use crate::tools::water;

/// Nutrilog MCP Service
#[derive(Clone)]
pub struct NutrilogService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    /// Identity every tool call is scoped to
    user_id: Arc<str>,
    food_search: Option<Arc<dyn FoodSearchProvider>>,
    tool_router: ToolRouter<NutrilogService>,
}

impl NutrilogService {
    pub fn new(config: &Config, database: Database) -> Self {
        let food_search: Option<Arc<dyn FoodSearchProvider>> = match &config.fatsecret {
            Some(credentials) => Some(Arc::new(FatSecretClient::new(
                credentials.clone(),
                config.search_page_size,
            ))),
            None => {
                tracing::info!("FatSecret credentials not set, food search disabled");
                None
            }
        };
        Self::with_provider(config, database, food_search)
    }

    /// Build the service around an explicit food search provider
    pub fn with_provider(
        config: &Config,
        database: Database,
        food_search: Option<Arc<dyn FoodSearchProvider>>,
    ) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(
                config.database_path.clone(),
                config.user_id.clone(),
                food_search.is_some(),
            ))),
            database,
            user_id: Arc::from(config.user_id.as_str()),
            food_search,
            tool_router: Self::tool_router(),
        }
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn blocking_task_error(e: tokio::task::JoinError) -> McpError {
    McpError::internal_error(format!("Background task failed: {}", e), None)
}

// ============================================================================
// Profile Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetupProfileParams {
    /// "male" or "female"
    pub sex: String,
    /// Height in centimetres
    pub height_cm: f64,
    /// Weight in kilograms
    pub weight_kg: f64,
    /// Age in whole years
    pub age_years: u32,
    /// low, moderate, or high
    pub activity_level: String,
    /// Display name
    pub username: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateProfileParams {
    pub sex: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub age_years: Option<u32>,
    pub activity_level: Option<String>,
    pub username: Option<String>,
}

// ============================================================================
// Food Search Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFoodsParams {
    /// Free text, e.g. "greek yogurt"
    pub query: String,
    /// Zero-based page number (default 0)
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetFoodDetailsParams {
    pub food_id: String,
    /// Also return nutrition scaled to this many grams
    pub amount_grams: Option<f64>,
}

// ============================================================================
// Meal Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogFoodParams {
    /// Food id from search_foods
    pub food_id: String,
    /// Grams eaten
    pub amount_grams: f64,
    /// breakfast, lunch, dinner, or snack
    pub meal_type: Option<String>,
    /// Date (YYYY-MM-DD, D.M.YYYY, or M/D/YYYY); defaults to today
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogMealParams {
    pub name: String,
    pub brand: Option<String>,
    /// breakfast, lunch, dinner, or snack
    pub meal_type: Option<String>,
    /// Date (YYYY-MM-DD, D.M.YYYY, or M/D/YYYY); defaults to today
    pub date: Option<String>,
    /// Grams eaten (default 100)
    pub amount_grams: Option<f64>,
    pub calories: f64,
    /// Grams of protein
    #[serde(default)]
    pub protein: f64,
    /// Grams of carbohydrate
    #[serde(default)]
    pub carbs: f64,
    /// Grams of fat
    #[serde(default)]
    pub fat: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteMealEntryParams {
    /// Meal entry ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DateParams {
    /// Date (YYYY-MM-DD, D.M.YYYY, or M/D/YYYY)
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListDaysParams {
    /// Maximum days to return (default 30)
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ImportLegacyMealsParams {
    /// JSON text: [{"date": ..., "meals": [...]}] or a flat array of meals
    pub payload: String,
}

// ============================================================================
// Water Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddWaterParams {
    /// Millilitres to add (default 250, at most 10000)
    pub amount_ml: Option<f64>,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl NutrilogService {
    // --- Status ---

    #[tool(description = "Get the current status of the Nutrilog service including build info, database status, and process information")]
    async fn nutrilog_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.database);
        json_result(&status)
    }

    #[tool(description = "Get instructions for using the Nutrilog tools. Call this at the start of a session or when unsure how to log food, water, or set up the profile.")]
    fn nutrilog_instructions(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(NUTRILOG_INSTRUCTIONS)]))
    }

    // --- Profile ---

    #[tool(description = "Set up the body profile (sex, height, weight, age, activity level) and compute daily calorie and water goals")]
    fn setup_profile(&self, Parameters(p): Parameters<SetupProfileParams>) -> Result<CallToolResult, McpError> {
        let setup = ProfileSetup {
            username: p.username,
            sex: p.sex,
            height_cm: p.height_cm,
            weight_kg: p.weight_kg,
            age_years: p.age_years,
            activity_level: p.activity_level,
        };
        let result = profile::setup_profile(&self.database, &self.user_id, setup)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update individual profile fields. Goals are recomputed when the profile is complete.")]
    fn update_profile(&self, Parameters(p): Parameters<UpdateProfileParams>) -> Result<CallToolResult, McpError> {
        let changes = ProfileChanges {
            username: p.username,
            sex: p.sex,
            height_cm: p.height_cm,
            weight_kg: p.weight_kg,
            age_years: p.age_years,
            activity_level: p.activity_level,
        };
        let result = profile::update_profile(&self.database, &self.user_id, changes)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get the body profile and its derived goals")]
    fn get_profile(&self) -> Result<CallToolResult, McpError> {
        let result = profile::get_profile(&self.database, &self.user_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get daily calorie and water goals (defaults to 2000 kcal / 2000 ml without a profile)")]
    fn get_goals(&self) -> Result<CallToolResult, McpError> {
        let result = profile::get_goals(&self.database, &self.user_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Food Search ---

    #[tool(description = "Search the FatSecret food database by text. Results are paginated; page is zero-based.")]
    async fn search_foods(&self, Parameters(p): Parameters<SearchFoodsParams>) -> Result<CallToolResult, McpError> {
        let provider = self.food_search.clone();
        let result = tokio::task::spawn_blocking(move || {
            food_search::search_foods(provider.as_deref(), &p.query, p.page)
        })
        .await
        .map_err(blocking_task_error)?
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get the reference serving and nutrition for a food, optionally scaled to an amount in grams")]
    async fn get_food_details(&self, Parameters(p): Parameters<GetFoodDetailsParams>) -> Result<CallToolResult, McpError> {
        let provider = self.food_search.clone();
        let result = tokio::task::spawn_blocking(move || {
            food_search::get_food_details(provider.as_deref(), &p.food_id, p.amount_grams)
        })
        .await
        .map_err(blocking_task_error)?
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Meals ---

    #[tool(description = "Log a food from search_foods. Nutrition is scaled from the food's serving to amount_grams.")]
    async fn log_food(&self, Parameters(p): Parameters<LogFoodParams>) -> Result<CallToolResult, McpError> {
        let provider = self
            .food_search
            .clone()
            .ok_or_else(|| McpError::internal_error(FoodSearchError::NotConfigured.to_string(), None))?;
        let database = self.database.clone();
        let user_id = Arc::clone(&self.user_id);
        let request = LogFoodRequest {
            food_id: p.food_id,
            amount_grams: p.amount_grams,
            meal_type: p.meal_type,
            date: p.date,
        };

        let result = tokio::task::spawn_blocking(move || {
            meals::log_food(&database, &*provider, &user_id, request)
        })
        .await
        .map_err(blocking_task_error)?
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Log a meal with nutrition values entered by hand")]
    fn log_meal(&self, Parameters(p): Parameters<LogMealParams>) -> Result<CallToolResult, McpError> {
        let meal = ManualMeal {
            name: p.name,
            brand: p.brand,
            meal_type: p.meal_type,
            date: p.date,
            amount_grams: p.amount_grams,
            calories: p.calories,
            protein: p.protein,
            carbs: p.carbs,
            fat: p.fat,
        };
        let result = meals::log_meal(&self.database, &self.user_id, meal)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a meal entry by ID")]
    fn delete_meal_entry(&self, Parameters(p): Parameters<DeleteMealEntryParams>) -> Result<CallToolResult, McpError> {
        let result = meals::delete_meal_entry(&self.database, &self.user_id, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List meal entries for a date, or all entries when no date is given")]
    fn list_meals(&self, Parameters(p): Parameters<DateParams>) -> Result<CallToolResult, McpError> {
        let result = meals::list_meals(&self.database, &self.user_id, p.date.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete all meal entries for a date. Without a date, deletes the entire meal log.")]
    fn clear_meals(&self, Parameters(p): Parameters<DateParams>) -> Result<CallToolResult, McpError> {
        let result = meals::clear_meals(&self.database, &self.user_id, p.date.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Daily totals, meals grouped by type, macro split, and remaining calories (defaults to today)")]
    fn get_daily_summary(&self, Parameters(p): Parameters<DateParams>) -> Result<CallToolResult, McpError> {
        let result = meals::get_daily_summary(&self.database, &self.user_id, p.date.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List logged days with totals, newest first, with pagination")]
    fn list_days(&self, Parameters(p): Parameters<ListDaysParams>) -> Result<CallToolResult, McpError> {
        let result = meals::list_days(&self.database, &self.user_id, p.limit, Some(p.offset))
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Import meals from a legacy JSON export. Malformed numeric fields import as 0 and are reported as warnings.")]
    fn import_legacy_meals(&self, Parameters(p): Parameters<ImportLegacyMealsParams>) -> Result<CallToolResult, McpError> {
        let result = meals::import_legacy_meals(&self.database, &self.user_id, &p.payload)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Water ---

    #[tool(description = "Get today's water intake and progress toward the daily goal")]
    fn get_water(&self) -> Result<CallToolResult, McpError> {
        let result = water::get_water(&self.database, &self.user_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Add water to today's intake (default 250 ml)")]
    fn add_water(&self, Parameters(p): Parameters<AddWaterParams>) -> Result<CallToolResult, McpError> {
        let result = water::add_water(&self.database, &self.user_id, p.amount_ml)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for NutrilogService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nutrilog".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Nutrilog".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Nutrilog - daily calorie, macronutrient and water tracking. \
                 IMPORTANT: Call nutrilog_instructions before logging for the first time. \
                 Profile: setup_profile/update_profile/get_profile/get_goals. \
                 Food search: search_foods/get_food_details. \
                 Meals: log_food/log_meal/delete_meal_entry/list_meals/clear_meals. \
                 Summary: get_daily_summary/list_days. \
                 Water: get_water/add_water. \
                 Import: import_legacy_meals. Status: nutrilog_status."
                    .into(),
            ),
        }
    }
}
