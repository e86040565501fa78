//! Source schema for uploaded conversation logs
//!
//! Uploads are CSV exports whose header row uses nested-path column names.
//! This module defines the ten recognized source paths, their flat normalized
//! names, and the rejection policy for absent paths.

pub mod record;
pub mod value;

pub use record::{DataQuality, NormalizedRecord, NormalizedTable};
pub use value::{get_path, FieldValue};

/// Maximum number of data rows accepted per upload
pub const MAX_ROWS: usize = 10_000;

/// One recognized source field and its mapping into the normalized schema
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Dotted source path in the uploaded table
    pub source_path: &'static str,
    /// Secondary path consulted per row when the primary yields nothing
    pub fallback_path: Option<&'static str>,
    /// Flat column name in the normalized schema
    pub name: &'static str,
    /// Whether an upload is rejected when this field is absent from every row
    pub required: bool,
}

/// The ten recognized source fields.
///
/// `key_entity` is the only field exempt from rejection: it feeds a single
/// aggregate and uploads without it remain analyzable.
pub const FIELDS: [FieldSpec; 10] = [
    FieldSpec {
        source_path: "final_output.metadata.queryText",
        fallback_path: None,
        name: "user_query",
        required: true,
    },
    FieldSpec {
        source_path: "final_output.res",
        fallback_path: None,
        name: "chatbot_response",
        required: true,
    },
    FieldSpec {
        source_path: "performance.metadata.language_code",
        fallback_path: None,
        name: "user_language",
        required: true,
    },
    FieldSpec {
        source_path: "final_output.metadata.hotelName",
        fallback_path: None,
        name: "hotel_name",
        required: true,
    },
    FieldSpec {
        source_path: "performance.service_info.total.timecost",
        fallback_path: None,
        name: "response_timecost",
        required: true,
    },
    FieldSpec {
        source_path: "final_output.intent_name_en",
        fallback_path: Some("final_output.intent_name"),
        name: "user_intent",
        required: true,
    },
    FieldSpec {
        source_path: "final_output.metadata.roomName",
        fallback_path: None,
        name: "room_name",
        required: true,
    },
    FieldSpec {
        source_path: "time",
        fallback_path: None,
        name: "request_timestamp",
        required: true,
    },
    FieldSpec {
        source_path: "final_output.metadata.conversation_id",
        fallback_path: None,
        name: "conversation_id",
        required: true,
    },
    FieldSpec {
        source_path: "final_output.key_entity",
        fallback_path: None,
        name: "key_entity",
        required: false,
    },
];
