//! FatSecret Platform API client
//!
//! OAuth2 client-credentials flow plus the `foods.search` and `food.get`
//! methods of the REST server API. Responses are parsed from loose JSON:
//! numbers arrive as strings, and a list with one element arrives as a bare
//! object.

use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;

use super::{
    validate_query, FoodCandidate, FoodDetails, FoodSearchError, FoodSearchPage, FoodSearchProvider,
    FoodSearchResult, FoodServing,
};
use crate::config::FatSecretCredentials;
use crate::models::Nutrition;
use crate::nutrition::normalize::coerce_number;
use crate::nutrition::serving_size_grams;

pub const TOKEN_URL: &str = "https://oauth.fatsecret.com/connect/token";
pub const API_URL: &str = "https://platform.fatsecret.com/rest/server.api";

/// Tokens are refreshed this long before the server says they expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Blocking FatSecret client. Call from a blocking context.
pub struct FatSecretClient {
    credentials: FatSecretCredentials,
    page_size: u32,
    http: OnceLock<reqwest::blocking::Client>,
    token: Mutex<Option<CachedToken>>,
}

impl FatSecretClient {
    pub fn new(credentials: FatSecretCredentials, page_size: u32) -> Self {
        Self {
            credentials,
            page_size,
            http: OnceLock::new(),
            token: Mutex::new(None),
        }
    }

    // The blocking client owns a runtime of its own, so it is built on first
    // use rather than inside the server's async context.
    fn http(&self) -> &reqwest::blocking::Client {
        self.http.get_or_init(|| {
            reqwest::blocking::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Falling back to default HTTP client");
                    reqwest::blocking::Client::new()
                })
        })
    }

    /// A bearer token, reusing the cached one until it expires
    fn access_token(&self) -> FoodSearchResult<String> {
        let now = Instant::now();
        {
            let cached = self
                .token
                .lock()
                .map_err(|_| FoodSearchError::Auth("token cache poisoned".to_string()))?;
            if let Some(token) = cached.as_ref().filter(|t| t.is_valid(now)) {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!("Requesting FatSecret access token");
        let response = self
            .http()
            .post(TOKEN_URL)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", "basic")])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(FoodSearchError::Auth(format!("{}: {}", status.as_u16(), body)));
        }

        let token: TokenResponse = response.json()?;
        if token.access_token.is_empty() {
            return Err(FoodSearchError::Auth("access token missing from response".to_string()));
        }

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        let cached = CachedToken {
            value: token.access_token,
            expires_at: now + lifetime,
        };
        let value = cached.value.clone();
        if let Ok(mut slot) = self.token.lock() {
            *slot = Some(cached);
        }
        Ok(value)
    }

    fn call(&self, query: &[(&str, &str)]) -> FoodSearchResult<Value> {
        let token = self.access_token()?;
        let response = self
            .http()
            .get(API_URL)
            .bearer_auth(&token)
            .query(query)
            .query(&[("format", "json")])
            .send()?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            // Drop the token so the next call fetches a fresh one
            if let Ok(mut slot) = self.token.lock() {
                *slot = None;
            }
        }
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(FoodSearchError::Api(format!("{}: {}", status.as_u16(), body)));
        }

        Ok(response.json::<Value>()?)
    }
}

impl FoodSearchProvider for FatSecretClient {
    fn search(&self, text: &str, page: u32) -> FoodSearchResult<FoodSearchPage> {
        let text = validate_query(text)?;
        let page_number = page.to_string();
        let max_results = self.page_size.to_string();

        let body = self.call(&[
            ("method", "foods.search"),
            ("search_expression", text),
            ("page_number", &page_number),
            ("max_results", &max_results),
        ])?;

        let result = parse_search_response(&body, page, self.page_size)?;
        tracing::debug!(
            query = text,
            page,
            returned = result.foods.len(),
            total = result.total_results,
            "FatSecret search"
        );
        Ok(result)
    }

    fn get_details(&self, food_id: &str) -> FoodSearchResult<FoodDetails> {
        let food_id = food_id.trim();
        if food_id.is_empty() {
            return Err(FoodSearchError::InvalidQuery("food_id is empty".to_string()));
        }
        let body = self.call(&[("method", "food.get"), ("food_id", food_id)])?;
        parse_food_details(&body, food_id)
    }
}

/// API-level errors come back with HTTP 200 and an `error` object
fn check_api_error(body: &Value) -> FoodSearchResult<()> {
    if let Some(error) = body.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        let code = error.get("code").and_then(coerce_number);
        return Err(match code {
            Some(c) => FoodSearchError::Api(format!("{} (code {})", message, c)),
            None => FoodSearchError::Api(message.to_string()),
        });
    }
    Ok(())
}

/// A field that may hold one object or an array of them
fn one_or_many(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(v @ Value::Object(_)) => vec![v],
        _ => Vec::new(),
    }
}

fn text_field(obj: &Value, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_field(obj: &Value, key: &str) -> Option<f64> {
    obj.get(key).and_then(coerce_number)
}

/// Parse a `foods.search` response body
pub fn parse_search_response(body: &Value, page: u32, page_size: u32) -> FoodSearchResult<FoodSearchPage> {
    check_api_error(body)?;

    let foods = body
        .get("foods")
        .ok_or_else(|| FoodSearchError::Parse("missing 'foods' object".to_string()))?;

    let candidates = one_or_many(foods.get("food"))
        .into_iter()
        .filter_map(|food| {
            let food_id = text_field(food, "food_id")?;
            let name = text_field(food, "food_name")?;
            Some(FoodCandidate {
                food_id,
                name,
                brand: text_field(food, "brand_name"),
                description: text_field(food, "food_description"),
            })
        })
        .collect::<Vec<_>>();

    let total_results = number_field(foods, "total_results")
        .map(|n| n as u32)
        .unwrap_or(candidates.len() as u32);

    Ok(FoodSearchPage {
        page: number_field(foods, "page_number").map(|n| n as u32).unwrap_or(page),
        max_results: number_field(foods, "max_results").map(|n| n as u32).unwrap_or(page_size),
        total_results,
        foods: candidates,
    })
}

/// Parse a `food.get` response body, keeping the first listed serving
pub fn parse_food_details(body: &Value, requested_id: &str) -> FoodSearchResult<FoodDetails> {
    check_api_error(body)?;

    let food = body
        .get("food")
        .ok_or_else(|| FoodSearchError::NotFound(requested_id.to_string()))?;

    let name = text_field(food, "food_name")
        .ok_or_else(|| FoodSearchError::Parse("food has no name".to_string()))?;

    let servings = food.get("servings").and_then(|s| s.get("serving"));
    let serving = one_or_many(servings)
        .into_iter()
        .next()
        .ok_or_else(|| FoodSearchError::Parse(format!("food {} has no servings", requested_id)))?;

    let unit = text_field(serving, "metric_serving_unit");
    let size_grams = serving_size_grams(number_field(serving, "metric_serving_amount"), unit.as_deref());

    Ok(FoodDetails {
        food_id: text_field(food, "food_id").unwrap_or_else(|| requested_id.to_string()),
        name,
        brand: text_field(food, "brand_name").unwrap_or_else(|| "Generic".to_string()),
        serving: FoodServing {
            description: text_field(serving, "serving_description").unwrap_or_else(|| "N/A".to_string()),
            size_grams,
            nutrition: Nutrition {
                calories: number_field(serving, "calories").unwrap_or(0.0),
                protein: number_field(serving, "protein").unwrap_or(0.0),
                carbs: number_field(serving, "carbohydrate").unwrap_or(0.0),
                fat: number_field(serving, "fat").unwrap_or(0.0),
            },
        },
    })
}
