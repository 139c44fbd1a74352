//! Error types for nutrition computations and stores

use serde::Serialize;
use thiserror::Error;

use crate::db::DbError;

/// Errors raised by goal calculation, normalization and the stores
#[derive(Debug, Error)]
pub enum NutritionError {
    /// A required numeric field is missing, non-numeric, or out of range
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No profile (or other settings document) exists for the user
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl NutritionError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        NutritionError::InvalidInput(msg.into())
    }
}

impl From<rusqlite::Error> for NutritionError {
    fn from(e: rusqlite::Error) -> Self {
        NutritionError::Db(DbError::Sqlite(e))
    }
}

pub type NutritionResult<T> = Result<T, NutritionError>;

/// A single malformed field that was coerced to zero.
///
/// Not an error: the surrounding aggregation or import keeps going.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialDataWarning {
    /// Entry id or position of the record in its batch
    pub record: String,
    pub field: String,
    /// Raw value as received, `None` when the field was absent
    pub raw: Option<String>,
}

impl PartialDataWarning {
    pub fn new(record: impl Into<String>, field: impl Into<String>, raw: Option<String>) -> Self {
        let warning = Self {
            record: record.into(),
            field: field.into(),
            raw,
        };
        tracing::warn!(
            record = %warning.record,
            field = %warning.field,
            raw = ?warning.raw,
            "Malformed nutrition field treated as zero"
        );
        warning
    }
}
