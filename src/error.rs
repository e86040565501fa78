//! Error types for guestlens

use thiserror::Error;

/// Errors that can occur while loading or analyzing conversation data
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to parse CSV: {0}")]
    MalformedCsv(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingRequiredFields(Vec<String>),

    #[error("Row limit exceeded: {rows} rows uploaded, limit is {limit}")]
    RowLimitExceeded { rows: usize, limit: usize },

    #[error("Invalid time of day (expected HH:MM): {0}")]
    InvalidTimeOfDay(String),

    #[error("Export configuration incomplete: {0}")]
    ExportConfigIncomplete(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
