//! Plain-text report formatting
//!
//! Renders segmented stay periods into the exportable UTF-8 text report.
//! Formatting is deterministic: the export date is injected through
//! `ReportConfig`, never read from the wall clock, so identical inputs always
//! produce byte-identical output. Source-language text (queries, responses,
//! entities) is carried through verbatim.

use crate::aggregate;
use crate::risk::RiskTier;
use crate::segment::StayPeriod;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Report rendering parameters.
///
/// `utc_offset_minutes` is a fixed display shift applied to every rendered
/// timestamp and stay boundary. Segmentation always runs in the data's native
/// timezone; only the displayed values move.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReportConfig {
    pub export_date: NaiveDate,
    pub utc_offset_minutes: Option<i32>,
}

impl ReportConfig {
    pub fn new(export_date: NaiveDate) -> ReportConfig {
        ReportConfig {
            export_date,
            utc_offset_minutes: None,
        }
    }
}

const RULE_WIDTH: usize = 80;
const UNKNOWN: &str = "Unknown";

/// Render the full report over the given stay periods.
pub fn format_report(periods: &[StayPeriod], config: &ReportConfig) -> String {
    let mut out = String::new();

    let offset_note = match config.utc_offset_minutes {
        Some(minutes) => format!(" ({})", offset_label(minutes)),
        None => String::new(),
    };

    let _ = writeln!(out, "Guest Conversation Analysis Report");
    let _ = writeln!(out, "Export date: {}{}", config.export_date, offset_note);
    let _ = writeln!(out, "Total stay periods: {}", periods.len());
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    out.push('\n');

    if periods.is_empty() {
        let _ = writeln!(out, "No conversations matched the current filters.");
        return out;
    }

    for period in periods {
        render_period(&mut out, period, config);
    }

    out
}

fn render_period(out: &mut String, period: &StayPeriod, config: &ReportConfig) {
    let hotel = period.hotel_name.as_deref().unwrap_or(UNKNOWN);
    let room = period.room_name.as_deref().unwrap_or(UNKNOWN);
    let start = shifted(period.start, config);
    let end = shifted(period.end, config);

    let _ = writeln!(out, "## Guest Experience Report ({hotel} - {room})");
    let _ = writeln!(
        out,
        "### Stay window: {} ~ {}",
        start.format("%Y-%m-%d %H:%M"),
        end.format("%Y-%m-%d %H:%M")
    );
    out.push('\n');

    for record in &period.records {
        let ts = record
            .request_timestamp
            .map(|t| shifted(t, config).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let id = record.conversation_id.as_deref().unwrap_or("N/A");
        let query = record.user_query.as_deref().unwrap_or("");
        let response = record.chatbot_response.as_deref().unwrap_or("");
        let timecost = match record.response_timecost {
            Some(t) => format!("{t:.2}s"),
            None => "N/A".to_string(),
        };
        let risk = RiskTier::classify_opt(record.response_timecost)
            .map(|tier| tier.label())
            .map(str::to_string)
            .unwrap_or_else(|| "unclassified".to_string());
        let intent = record.user_intent.as_deref().unwrap_or(UNKNOWN);

        let _ = writeln!(out, "[{ts}], (ID: {id})");
        let _ = writeln!(out, "user: {query}");
        let _ = writeln!(out, "chatbot: {response} (response time: {timecost})");
        let _ = writeln!(out, "risk: {risk} | intent: {intent}");
        out.push('\n');
    }

    render_period_summary(out, period);

    let _ = writeln!(out, "---");
    out.push('\n');
}

fn render_period_summary(out: &mut String, period: &StayPeriod) {
    let intents = aggregate::intent_distribution(&period.records);
    if !intents.is_empty() {
        let _ = writeln!(out, "Intent distribution:");
        for (intent, count) in &intents {
            let _ = writeln!(out, "  {intent}: {count}");
        }
    }

    let tiers = aggregate::risk_tier_counts(&period.records);
    if !tiers.is_empty() {
        let _ = writeln!(out, "Risk tiers:");
        for tier in RiskTier::all() {
            if let Some(count) = tiers.get(&tier) {
                let _ = writeln!(out, "  {}: {}", tier.label(), count);
            }
        }
    }
    if !intents.is_empty() || !tiers.is_empty() {
        out.push('\n');
    }
}

fn shifted(ts: NaiveDateTime, config: &ReportConfig) -> NaiveDateTime {
    match config.utc_offset_minutes {
        Some(minutes) => ts + Duration::minutes(i64::from(minutes)),
        None => ts,
    }
}

fn offset_label(minutes: i32) -> String {
    let sign = if minutes < 0 { '-' } else { '+' };
    let abs = minutes.unsigned_abs();
    format!("UTC{}{:02}:{:02}", sign, abs / 60, abs % 60)
}

/// Suggest an export filename for the rendered report.
///
/// Exports covering a single hotel are prefixed with that hotel's name;
/// anything else gets the combined prefix.
pub fn suggest_filename(periods: &[StayPeriod], export_date: NaiveDate) -> String {
    let mut hotels = periods
        .iter()
        .filter_map(|p| p.hotel_name.as_deref())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter();

    match (hotels.next(), hotels.next()) {
        (Some(hotel), None) => format!("{hotel}_conversation_report_{export_date}.txt"),
        _ => format!("combined_conversation_report_{export_date}.txt"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NormalizedRecord;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn period() -> StayPeriod {
        StayPeriod {
            hotel_name: Some("Grand Palace".to_string()),
            room_name: Some("R101".to_string()),
            start: datetime("2024-01-15 14:00:00"),
            end: datetime("2024-01-16 11:00:00"),
            records: vec![NormalizedRecord {
                conversation_id: Some("conv-42".to_string()),
                user_query: Some("游泳池開到幾點？".to_string()),
                chatbot_response: Some("游泳池開放至晚上十點。".to_string()),
                response_timecost: Some(3.2),
                user_intent: Some("Frequently asked question".to_string()),
                request_timestamp: Some(datetime("2024-01-15 18:05:00")),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_report_layout() {
        let config = ReportConfig::new(date("2024-02-01"));
        let report = format_report(&[period()], &config);

        assert!(report.starts_with("Guest Conversation Analysis Report\n"));
        assert!(report.contains("Export date: 2024-02-01\n"));
        assert!(report.contains("Total stay periods: 1\n"));
        assert!(report.contains("## Guest Experience Report (Grand Palace - R101)\n"));
        assert!(report.contains("### Stay window: 2024-01-15 14:00 ~ 2024-01-16 11:00\n"));
        assert!(report.contains("[2024-01-15 18:05:00], (ID: conv-42)\n"));
        assert!(report.contains("user: 游泳池開到幾點？\n"));
        assert!(report.contains("chatbot: 游泳池開放至晚上十點。 (response time: 3.20s)\n"));
        assert!(report.contains("risk: Low (3-5s) | intent: Frequently asked question\n"));
        assert!(report.contains("Intent distribution:\n  Frequently asked question: 1\n"));
        assert!(report.contains("Risk tiers:\n  Low (3-5s): 1\n"));
    }

    #[test]
    fn test_missing_values_render_as_placeholders() {
        let mut p = period();
        p.records[0].conversation_id = None;
        p.records[0].response_timecost = None;
        p.records[0].user_intent = None;
        p.hotel_name = None;

        let report = format_report(&[p], &ReportConfig::new(date("2024-02-01")));
        assert!(report.contains("(ID: N/A)"));
        assert!(report.contains("(response time: N/A)"));
        assert!(report.contains("risk: unclassified | intent: Unknown"));
        assert!(report.contains("## Guest Experience Report (Unknown - R101)"));
    }

    #[test]
    fn test_empty_periods_render_no_data_body() {
        let report = format_report(&[], &ReportConfig::new(date("2024-02-01")));
        assert!(report.contains("Total stay periods: 0"));
        assert!(report.contains("No conversations matched the current filters."));
    }

    #[test]
    fn test_output_is_deterministic() {
        let config = ReportConfig::new(date("2024-02-01"));
        let periods = [period(), period()];
        assert_eq!(
            format_report(&periods, &config),
            format_report(&periods, &config)
        );
    }

    #[test]
    fn test_utc_offset_shifts_display_only() {
        let config = ReportConfig {
            export_date: date("2024-02-01"),
            utc_offset_minutes: Some(480),
        };
        let report = format_report(&[period()], &config);

        assert!(report.contains("Export date: 2024-02-01 (UTC+08:00)"));
        // 18:05 + 8h
        assert!(report.contains("[2024-01-16 02:05:00], (ID: conv-42)"));
        assert!(report.contains("### Stay window: 2024-01-15 22:00 ~ 2024-01-16 19:00"));
    }

    #[test]
    fn test_negative_offset_label() {
        let config = ReportConfig {
            export_date: date("2024-02-01"),
            utc_offset_minutes: Some(-330),
        };
        let report = format_report(&[], &config);
        assert!(report.contains("(UTC-05:30)"));
    }

    #[test]
    fn test_filename_single_vs_combined() {
        let single = [period()];
        assert_eq!(
            suggest_filename(&single, date("2024-02-01")),
            "Grand Palace_conversation_report_2024-02-01.txt"
        );

        let mut other = period();
        other.hotel_name = Some("Seaside Inn".to_string());
        let mixed = [period(), other];
        assert_eq!(
            suggest_filename(&mixed, date("2024-02-01")),
            "combined_conversation_report_2024-02-01.txt"
        );

        assert_eq!(
            suggest_filename(&[], date("2024-02-01")),
            "combined_conversation_report_2024-02-01.txt"
        );
    }
}
