//! Pipeline orchestration
//!
//! Public one-shot entry points over the stage modules: normalized records in,
//! chart-ready aggregates or a rendered stay-period report out. Session-style
//! incremental use goes through `AnalysisSession` instead.

use crate::aggregate::{self, SummaryMetrics, DEFAULT_TOP_ENTITIES};
use crate::error::AnalysisError;
use crate::report::{format_report, ReportConfig};
use crate::risk::RiskTier;
use crate::schema::NormalizedRecord;
use crate::segment::{segment, StayConfig};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bundle of every chart-ready aggregate over one set of records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregates {
    pub summary: SummaryMetrics,
    pub intent_distribution: Vec<(String, usize)>,
    pub daily_risk: Vec<(NaiveDate, BTreeMap<RiskTier, usize>)>,
    pub top_entities: Vec<(String, usize)>,
}

/// Compute all aggregates in one pass over the given records.
pub fn compute_aggregates(records: &[NormalizedRecord]) -> Aggregates {
    Aggregates {
        summary: aggregate::summary_metrics(records),
        intent_distribution: aggregate::intent_distribution(records),
        daily_risk: aggregate::daily_risk_accumulation(records),
        top_entities: aggregate::top_entities(records, DEFAULT_TOP_ENTITIES),
    }
}

/// Segment records into stay periods and render the plain-text report.
///
/// The stay configuration is mandatory for export; a missing one is the
/// operator error `ExportConfigIncomplete`, not a default window.
pub fn export_report(
    records: &[NormalizedRecord],
    stay: Option<&StayConfig>,
    config: &ReportConfig,
) -> Result<String, AnalysisError> {
    let stay = stay.ok_or_else(|| {
        AnalysisError::ExportConfigIncomplete(
            "check-in and check-out times are required for export".to_string(),
        )
    })?;
    let periods = segment(records, stay);
    Ok(format_report(&periods, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use pretty_assertions::assert_eq;

    fn record(ts: &str, timecost: f64, intent: &str) -> NormalizedRecord {
        NormalizedRecord {
            request_timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").ok(),
            response_timecost: Some(timecost),
            user_intent: Some(intent.to_string()),
            hotel_name: Some("Grand Palace".to_string()),
            room_name: Some("R101".to_string()),
            user_query: Some("wifi密碼是什麼？".to_string()),
            chatbot_response: Some("密碼在床頭卡片上。".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_aggregates_bundle_is_consistent() {
        let records = vec![
            record("2024-01-15 18:00:00", 2.0, "Greeting"),
            record("2024-01-15 19:00:00", 9.0, "Complaint"),
        ];

        let aggregates = compute_aggregates(&records);
        assert_eq!(aggregates.summary.total_conversations, 2);
        assert_eq!(aggregates.summary.high_risk_count, 1);
        assert_eq!(aggregates.intent_distribution.len(), 2);
        assert_eq!(aggregates.daily_risk.len(), 1);
    }

    #[test]
    fn test_export_requires_stay_config() {
        let records = vec![record("2024-01-15 18:00:00", 2.0, "Greeting")];
        let config = ReportConfig::new("2024-02-01".parse().unwrap());

        let err = export_report(&records, None, &config).unwrap_err();
        assert!(matches!(err, AnalysisError::ExportConfigIncomplete(_)));
    }

    #[test]
    fn test_export_is_byte_identical_across_runs() {
        let records = vec![
            record("2024-01-15 18:00:00", 2.0, "Greeting"),
            record("2024-01-15 19:00:00", 9.0, "Complaint"),
        ];
        let stay = StayConfig::parse("14:00", "11:00").unwrap();
        let config = ReportConfig::new("2024-02-01".parse().unwrap());

        let first = export_report(&records, Some(&stay), &config).unwrap();
        let second = export_report(&records, Some(&stay), &config).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("## Guest Experience Report (Grand Palace - R101)"));
    }
}
