//! Runtime configuration
//!
//! Read once from the environment at startup.

use std::path::PathBuf;

/// Default number of food search results per page
pub const DEFAULT_SEARCH_PAGE_SIZE: u32 = 20;
/// Largest page the food search API will return
pub const MAX_SEARCH_PAGE_SIZE: u32 = 50;

/// Client credentials for the FatSecret Platform API
#[derive(Debug, Clone)]
pub struct FatSecretCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    /// Identity every store operation is scoped to
    pub user_id: String,
    /// `None` disables food search
    pub fatsecret: Option<FatSecretCredentials>,
    pub search_page_size: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("NUTRILOG_DATABASE_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let user_id = lookup("NUTRILOG_USER_ID")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "local".to_string());

        let fatsecret = match (lookup("FATSECRET_CLIENT_ID"), lookup("FATSECRET_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                Some(FatSecretCredentials {
                    client_id,
                    client_secret,
                })
            }
            _ => None,
        };

        let search_page_size = lookup("NUTRILOG_SEARCH_PAGE_SIZE")
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_SEARCH_PAGE_SIZE)
            .clamp(1, MAX_SEARCH_PAGE_SIZE);

        Self {
            database_path,
            user_id,
            fatsecret,
            search_page_size,
        }
    }
}

/// `<project>/data/nutrilog.db`, resolved from the executable location
fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("nutrilog.db");
    path
}
