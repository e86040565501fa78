//! Analysis session state
//!
//! One loaded upload plus the operator's current filters, held as plain
//! immutable state. Changing filters builds a new session value; every view
//! (aggregates, ranges, report) is recomputed from the filtered records on
//! demand. There is no cache to invalidate and no mutation to race.

use crate::error::AnalysisError;
use crate::filter::FilterSet;
use crate::ingest::{read_csv, RawTable};
use crate::mapper::FieldMapper;
use crate::pipeline::{compute_aggregates, export_report, Aggregates};
use crate::report::{suggest_filename, ReportConfig};
use crate::schema::record::DataQuality;
use crate::schema::{NormalizedRecord, NormalizedTable, FIELDS};
use crate::segment::{segment, StayConfig, StayPeriod};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::io::Read;

/// A loaded upload with the operator's current filter state
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    raw: RawTable,
    table: NormalizedTable,
    /// Optional source paths absent from every row (informational, not fatal)
    missing_fields: Vec<&'static str>,
    filters: FilterSet,
}

impl AnalysisSession {
    /// Load and normalize a CSV upload into a fresh session.
    ///
    /// Applies the full rejection policy: malformed CSV, the row cap, and
    /// required source paths absent from every row all fail the load.
    pub fn load<R: Read>(reader: R) -> Result<AnalysisSession, AnalysisError> {
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

        let missing_fields = FIELDS
            .iter()
            .filter(|spec| !spec.required)
            .filter(|spec| {
                outcome
                    .table
                    .records
                    .iter()
                    .all(|r| column(r, spec.name).is_none())
            })
            .map(|spec| spec.source_path)
            .collect();

        Ok(AnalysisSession {
            raw,
            table: outcome.table,
            missing_fields,
            filters: FilterSet::default(),
        })
    }

    /// New session with replaced filters; the loaded data is shared unchanged.
    pub fn with_filters(&self, filters: FilterSet) -> AnalysisSession {
        AnalysisSession {
            raw: self.raw.clone(),
            table: self.table.clone(),
            missing_fields: self.missing_fields.clone(),
            filters,
        }
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn missing_fields(&self) -> &[&'static str] {
        &self.missing_fields
    }

    pub fn quality(&self) -> DataQuality {
        self.table.quality
    }

    /// Total rows in the upload, before filtering
    pub fn total_rows(&self) -> usize {
        self.table.len()
    }

    /// Current filtered view.
    ///
    /// Zero matching rows is a valid state; downstream views render empty.
    pub fn filtered(&self) -> NormalizedTable {
        self.filters.apply(&self.table)
    }

    /// Sorted distinct non-null values of one normalized column, over the
    /// full upload. Used to populate filter choices; unknown column names
    /// yield an empty list.
    pub fn unique_values(&self, column_name: &str) -> Vec<String> {
        self.table
            .records
            .iter()
            .filter_map(|r| column(r, column_name))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Calendar-date span of the upload's parseable timestamps.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self
            .table
            .records
            .iter()
            .filter_map(|r| r.request_timestamp)
            .map(|ts| ts.date());
        let first = dates.next()?;
        let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some((min, max))
    }

    /// Min/max of the upload's valid response timecosts.
    pub fn timecost_range(&self) -> Option<(f64, f64)> {
        let mut timecosts = self.table.records.iter().filter_map(|r| r.response_timecost);
        let first = timecosts.next()?;
        let (min, max) = timecosts.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
        Some((min, max))
    }

    /// All chart-ready aggregates over the current filtered view.
    pub fn aggregates(&self) -> Aggregates {
        compute_aggregates(&self.filtered().records)
    }

    /// Stay periods over the current filtered view.
    pub fn stay_periods(&self, stay: &StayConfig) -> Vec<StayPeriod> {
        segment(&self.filtered().records, stay)
    }

    /// Render the stay-period report over the current filtered view.
    ///
    /// Returns the report text together with the suggested filename.
    pub fn export_report(
        &self,
        stay: Option<&StayConfig>,
        config: &ReportConfig,
    ) -> Result<(String, String), AnalysisError> {
        let records = self.filtered().records;
        let content = export_report(&records, stay, config)?;
        let periods = stay.map(|s| segment(&records, s)).unwrap_or_default();
        let filename = suggest_filename(&periods, config.export_date);
        Ok((content, filename))
    }
}

fn column<'a>(record: &'a NormalizedRecord, name: &str) -> Option<&'a str> {
    match name {
        "user_query" => record.user_query.as_deref(),
        "chatbot_response" => record.chatbot_response.as_deref(),
        "user_language" => record.user_language.as_deref(),
        "hotel_name" => record.hotel_name.as_deref(),
        "user_intent" => record.user_intent.as_deref(),
        "room_name" => record.room_name.as_deref(),
        "conversation_id" => record.conversation_id.as_deref(),
        "key_entity" => record.key_entity.as_deref(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "final_output.metadata.queryText,final_output.res,\
performance.metadata.language_code,final_output.metadata.hotelName,\
performance.service_info.total.timecost,final_output.intent_name_en,\
final_output.metadata.roomName,time,final_output.metadata.conversation_id,\
final_output.key_entity";

    fn csv_with_rows(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    fn sample_csv() -> String {
        csv_with_rows(&[
            "wifi密碼？,密碼在卡片上。,zh-TW,Grand Palace,2.1,Wifi,R101,2024-01-15 18:00:00,c1,wifi",
            "游泳池幾點開？,早上六點。,zh-TW,Grand Palace,9.4,Facility,R102,2024-01-16 09:30:00,c2,游泳池",
            "breakfast time?,From 7am.,en-US,Seaside Inn,4.0,Dining,R201,2024-01-17 08:00:00,c3,早餐",
        ])
    }

    #[test]
    fn test_load_and_unique_values() {
        let session = AnalysisSession::load(sample_csv().as_bytes()).unwrap();
        assert_eq!(session.total_rows(), 3);
        assert!(session.missing_fields().is_empty());
        assert_eq!(
            session.unique_values("hotel_name"),
            vec!["Grand Palace".to_string(), "Seaside Inn".to_string()]
        );
        assert!(session.unique_values("no_such_column").is_empty());
    }

    #[test]
    fn test_ranges() {
        let session = AnalysisSession::load(sample_csv().as_bytes()).unwrap();
        let (start, end) = session.date_range().unwrap();
        assert_eq!(start.to_string(), "2024-01-15");
        assert_eq!(end.to_string(), "2024-01-17");

        let (min, max) = session.timecost_range().unwrap();
        assert_eq!(min, 2.1);
        assert_eq!(max, 9.4);
    }

    #[test]
    fn test_filters_produce_new_view_without_mutation() {
        let session = AnalysisSession::load(sample_csv().as_bytes()).unwrap();

        let mut filters = FilterSet::default();
        filters.hotels.insert("Grand Palace".to_string());
        let narrowed = session.with_filters(filters);

        assert_eq!(narrowed.filtered().len(), 2);
        // The source session still sees everything
        assert_eq!(session.filtered().len(), 3);
        assert_eq!(narrowed.total_rows(), 3);
    }

    #[test]
    fn test_zero_match_view_is_valid() {
        let session = AnalysisSession::load(sample_csv().as_bytes()).unwrap();
        let mut filters = FilterSet::default();
        filters.hotels.insert("Nonexistent".to_string());
        let empty = session.with_filters(filters);

        assert!(empty.filtered().is_empty());
        assert_eq!(empty.aggregates().summary.total_conversations, 0);

        let config = ReportConfig::new("2024-02-01".parse().unwrap());
        let stay = StayConfig::parse("14:00", "11:00").unwrap();
        let (content, filename) = empty.export_report(Some(&stay), &config).unwrap();
        assert!(content.contains("No conversations matched the current filters."));
        assert_eq!(filename, "combined_conversation_report_2024-02-01.txt");
    }

    #[test]
    fn test_absent_optional_column_is_reported_not_fatal() {
        // No key_entity column at all
        let csv = "final_output.metadata.queryText,final_output.res,\
performance.metadata.language_code,final_output.metadata.hotelName,\
performance.service_info.total.timecost,final_output.intent_name_en,\
final_output.metadata.roomName,time,final_output.metadata.conversation_id\n\
hi,hello,en-US,Grand Palace,1.0,Greeting,R101,2024-01-15 18:00:00,c1";

        let session = AnalysisSession::load(csv.as_bytes()).unwrap();
        assert_eq!(session.missing_fields(), &["final_output.key_entity"]);
        assert!(session.table.records[0].key_entity.is_none());
    }

    #[test]
    fn test_export_without_stay_config_fails() {
        let session = AnalysisSession::load(sample_csv().as_bytes()).unwrap();
        let config = ReportConfig::new("2024-02-01".parse().unwrap());
        let err = session.export_report(None, &config).unwrap_err();
        assert!(matches!(err, AnalysisError::ExportConfigIncomplete(_)));
    }

    #[test]
    fn test_export_report_end_to_end() {
        let session = AnalysisSession::load(sample_csv().as_bytes()).unwrap();
        let mut filters = FilterSet::default();
        filters.hotels.insert("Grand Palace".to_string());
        let session = session.with_filters(filters);

        let stay = StayConfig::parse("14:00", "11:00").unwrap();
        let config = ReportConfig::new("2024-02-01".parse().unwrap());
        let (content, filename) = session.export_report(Some(&stay), &config).unwrap();

        assert!(content.contains("## Guest Experience Report (Grand Palace - R101)"));
        assert!(content.contains("## Guest Experience Report (Grand Palace - R102)"));
        assert!(!content.contains("Seaside Inn"));
        assert_eq!(filename, "Grand Palace_conversation_report_2024-02-01.txt");
    }
}
