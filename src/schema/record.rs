//! Normalized conversation records
//!
//! The flat ten-field row format every downstream stage operates on. Each field
//! is explicitly optional: a missing source path yields None, never a sentinel
//! value, and `response_timecost` is never coerced to zero.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One normalized conversation row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub user_query: Option<String>,
    pub chatbot_response: Option<String>,
    pub user_language: Option<String>,
    pub hotel_name: Option<String>,
    /// Response latency in seconds; None when missing, negative, or non-numeric
    pub response_timecost: Option<f64>,
    pub user_intent: Option<String>,
    pub room_name: Option<String>,
    pub request_timestamp: Option<NaiveDateTime>,
    pub conversation_id: Option<String>,
    /// Possibly multi-valued (delimiter-separated); split at aggregation time
    pub key_entity: Option<String>,
}

/// Per-upload data-quality counters.
///
/// These are warnings, not errors: affected rows stay in the table and are only
/// excluded from the aggregates that cannot use them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuality {
    /// Rows whose timecost was negative or non-numeric (excluded from risk aggregates)
    pub invalid_timecost_rows: usize,
    /// Rows whose timestamp could not be parsed (excluded from date grouping)
    pub unparseable_timestamp_rows: usize,
}

/// Normalized table with its quality counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizedTable {
    pub records: Vec<NormalizedRecord>,
    pub quality: DataQuality,
}

impl NormalizedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse a request timestamp in the formats the log exporter emits.
///
/// Tried in order:
/// - `"Oct 15, 2025 @ 11:54:40.903"` (the upstream export format, with and
///   without fractional seconds)
/// - `"2024-01-15 08:30:00.123"` / `"2024-01-15 08:30:00"`
/// - RFC 3339
/// - bare date `"2024-01-15"` (midnight)
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.contains('@') {
        let cleaned = trimmed.replace(" @", "");
        let cleaned = cleaned.trim().to_string();
        for format in ["%b %d, %Y %H:%M:%S%.f", "%b %d, %Y %H:%M:%S"] {
            if let Ok(ts) = NaiveDateTime::parse_from_str(&cleaned, format) {
                return Some(ts);
            }
        }
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(ts);
        }
    }

    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(ts.naive_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    None
}

/// Parse a response timecost. Negative and non-numeric values are rejected.
pub fn parse_timecost(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}
