//! Nutrilog Tools module
//!
//! MCP tool implementations for Nutrilog.

pub mod food_search;
pub mod meals;
pub mod profile;
pub mod status;
pub mod water;
