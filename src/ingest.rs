//! CSV ingestion
//!
//! Reads an uploaded CSV export into a raw table of loosely-typed rows, then
//! hands it to the field mapper. The row cap and the required-field rejection
//! policy are both enforced here, before any analysis sees the data.

use crate::error::AnalysisError;
use crate::mapper::FieldMapper;
use crate::schema::value::FieldValue;
use crate::schema::{NormalizedTable, MAX_ROWS};
use std::io::Read;

/// Raw uploaded table: the source header plus one loosely-typed row per record
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<FieldValue>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read a CSV upload into a raw table.
///
/// Header cells are dotted source paths; each row becomes a nested mapping so
/// that dotted-path lookup works uniformly. Cells containing a JSON object or
/// array are decoded into nested values; empty cells become explicit nulls.
///
/// Fails with `MalformedCsv` on unparsable input and `RowLimitExceeded` when
/// the upload holds more than [`MAX_ROWS`] data rows. Neither failure retains
/// a partial table.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable, AnalysisError> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let header: Vec<String> = csv_reader
        .headers()
        .map_err(|e| AnalysisError::MalformedCsv(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    let mut row_count = 0usize;

    for result in csv_reader.records() {
        let record = result.map_err(|e| AnalysisError::MalformedCsv(e.to_string()))?;
        row_count += 1;

        // Past the cap we keep counting so the error can report the real size,
        // but stop materializing rows.
        if row_count > MAX_ROWS {
            continue;
        }

        let mut row = FieldValue::empty_mapping();
        for (path, cell) in header.iter().zip(record.iter()) {
            row.insert_path(path, parse_cell(cell));
        }
        rows.push(row);
    }

    if row_count > MAX_ROWS {
        return Err(AnalysisError::RowLimitExceeded {
            rows: row_count,
            limit: MAX_ROWS,
        });
    }

    Ok(RawTable { header, rows })
}

/// Read and normalize an upload in one step.
///
/// Applies the rejection policy: any required source path absent from every
/// row rejects the upload with the specific missing field names.
pub fn load_table<R: Read>(reader: R) -> Result<NormalizedTable, AnalysisError> {
    let raw = read_csv(reader)?;
    let outcome = FieldMapper::normalize(&raw);

    if !outcome.missing_required.is_empty() {
        return Err(AnalysisError::MissingRequiredFields(
            outcome
                .missing_required
                .iter()
                .map(|s| s.to_string())
                .collect(),
        ));
    }

    Ok(outcome.table)
}

fn parse_cell(cell: &str) -> FieldValue {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return FieldValue::Null;
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
            return FieldValue::from_json(&json);
        }
    }

    FieldValue::Scalar(trimmed.to_string())
}
