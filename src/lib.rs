//! Nutrilog Library
//!
//! Core functionality for calorie, macronutrient and water tracking.

pub mod build_info;
pub mod config;
pub mod db;
pub mod error;
pub mod food_search;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
