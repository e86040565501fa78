//! Field mapping
//!
//! This module flattens raw uploaded rows into the normalized ten-field schema:
//! - dotted source paths extracted via the tagged-union accessor
//! - timestamps and timecosts parsed with data-quality accounting
//! - required source paths absent from every row reported, not raised

use crate::ingest::RawTable;
use crate::schema::record::{parse_timecost, parse_timestamp};
use crate::schema::value::{get_path, FieldValue};
use crate::schema::{DataQuality, FieldSpec, NormalizedRecord, NormalizedTable, FIELDS};

/// Result of normalizing a raw table
#[derive(Debug, Clone)]
pub struct MappingOutcome {
    pub table: NormalizedTable,
    /// Required source paths absent from every row; the caller decides rejection
    pub missing_required: Vec<&'static str>,
}

/// Mapper from raw uploaded rows to normalized records
pub struct FieldMapper;

impl FieldMapper {
    /// Normalize a raw table. Pure transform: no row cap, no rejection.
    pub fn normalize(raw: &RawTable) -> MappingOutcome {
        let mut records = Vec::with_capacity(raw.rows.len());
        let mut quality = DataQuality::default();
        let mut seen = [false; FIELDS.len()];

        for row in &raw.rows {
            let mut record = NormalizedRecord::default();

            for (idx, spec) in FIELDS.iter().enumerate() {
                let value = lookup(row, spec);
                if value.is_some() {
                    seen[idx] = true;
                }
                assign(&mut record, spec.name, value, &mut quality);
            }

            records.push(record);
        }

        let missing_required = FIELDS
            .iter()
            .enumerate()
            .filter(|(idx, spec)| spec.required && !seen[*idx])
            .map(|(_, spec)| spec.source_path)
            .collect();

        MappingOutcome {
            table: NormalizedTable { records, quality },
            missing_required,
        }
    }
}

fn lookup<'a>(row: &'a FieldValue, spec: &FieldSpec) -> Option<&'a str> {
    get_path(row, spec.source_path)
        .or_else(|| spec.fallback_path.and_then(|path| get_path(row, path)))
        .filter(|s| !s.trim().is_empty())
}

fn assign(
    record: &mut NormalizedRecord,
    name: &'static str,
    value: Option<&str>,
    quality: &mut DataQuality,
) {
    match name {
        "user_query" => record.user_query = value.map(str::to_string),
        "chatbot_response" => record.chatbot_response = value.map(str::to_string),
        "user_language" => record.user_language = value.map(str::to_string),
        "hotel_name" => record.hotel_name = value.map(str::to_string),
        "response_timecost" => {
            if let Some(raw) = value {
                record.response_timecost = parse_timecost(raw);
                if record.response_timecost.is_none() {
                    quality.invalid_timecost_rows += 1;
                }
            }
        }
        "user_intent" => record.user_intent = value.map(str::to_string),
        "room_name" => record.room_name = value.map(str::to_string),
        "request_timestamp" => {
            if let Some(raw) = value {
                record.request_timestamp = parse_timestamp(raw);
                if record.request_timestamp.is_none() {
                    quality.unparseable_timestamp_rows += 1;
                }
            }
        }
        "conversation_id" => record.conversation_id = value.map(str::to_string),
        "key_entity" => record.key_entity = value.map(str::to_string),
        _ => {}
    }
}
