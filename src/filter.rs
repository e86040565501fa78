//! Operator filters
//!
//! A filter set is a plain struct of optional criteria; every bound is
//! inclusive and an empty categorical set means "no filter". Application is a
//! pure function over the normalized table, recomputed on every interaction.

use crate::risk::RiskTier;
use crate::schema::{NormalizedRecord, NormalizedTable};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Operator-supplied filter criteria
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSet {
    /// Inclusive calendar-date range on `request_timestamp`
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Inclusive response-time range in seconds
    pub min_timecost: Option<f64>,
    pub max_timecost: Option<f64>,
    /// Allowed values; empty set = no filter
    pub hotels: BTreeSet<String>,
    pub rooms: BTreeSet<String>,
    pub intents: BTreeSet<String>,
    pub languages: BTreeSet<String>,
    pub risk_tiers: BTreeSet<RiskTier>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.min_timecost.is_none()
            && self.max_timecost.is_none()
            && self.hotels.is_empty()
            && self.rooms.is_empty()
            && self.intents.is_empty()
            && self.languages.is_empty()
            && self.risk_tiers.is_empty()
    }

    /// Apply the filters, producing a new table with the same quality counters.
    pub fn apply(&self, table: &NormalizedTable) -> NormalizedTable {
        NormalizedTable {
            records: table
                .records
                .iter()
                .filter(|r| self.matches(r))
                .cloned()
                .collect(),
            quality: table.quality,
        }
    }

    fn matches(&self, record: &NormalizedRecord) -> bool {
        if self.start_date.is_some() || self.end_date.is_some() {
            let Some(ts) = record.request_timestamp else {
                return false;
            };
            let date = ts.date();
            if let Some(start) = self.start_date {
                if date < start {
                    return false;
                }
            }
            if let Some(end) = self.end_date {
                if date > end {
                    return false;
                }
            }
        }

        if self.min_timecost.is_some() || self.max_timecost.is_some() {
            let Some(timecost) = record.response_timecost else {
                return false;
            };
            if let Some(min) = self.min_timecost {
                if timecost < min {
                    return false;
                }
            }
            if let Some(max) = self.max_timecost {
                if timecost > max {
                    return false;
                }
            }
        }

        if !allowed(&self.hotels, record.hotel_name.as_deref()) {
            return false;
        }
        if !allowed(&self.rooms, record.room_name.as_deref()) {
            return false;
        }
        if !allowed(&self.intents, record.user_intent.as_deref()) {
            return false;
        }
        if !allowed(&self.languages, record.user_language.as_deref()) {
            return false;
        }

        if !self.risk_tiers.is_empty() {
            match RiskTier::classify_opt(record.response_timecost) {
                Some(tier) if self.risk_tiers.contains(&tier) => {}
                _ => return false,
            }
        }

        true
    }
}

fn allowed(set: &BTreeSet<String>, value: Option<&str>) -> bool {
    if set.is_empty() {
        return true;
    }
    value.is_some_and(|v| set.contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use pretty_assertions::assert_eq;

    fn record(ts: &str, timecost: f64, hotel: &str, intent: &str) -> NormalizedRecord {
        NormalizedRecord {
            request_timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").ok(),
            response_timecost: Some(timecost),
            hotel_name: Some(hotel.to_string()),
            user_intent: Some(intent.to_string()),
            ..Default::default()
        }
    }

    fn table() -> NormalizedTable {
        NormalizedTable {
            records: vec![
                record("2024-01-15 08:00:00", 1.0, "Grand Palace", "Greeting"),
                record("2024-01-16 12:00:00", 4.0, "Grand Palace", "Room service"),
                record("2024-01-17 23:59:59", 9.0, "Seaside Inn", "Complaint"),
            ],
            quality: Default::default(),
        }
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filters = FilterSet::default();
        assert!(filters.is_empty());
        assert_eq!(filters.apply(&table()).len(), 3);
    }

    #[test]
    fn test_date_range_is_end_inclusive() {
        let filters = FilterSet {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 16),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 17),
            ..Default::default()
        };
        let filtered = filters.apply(&table());
        assert_eq!(filtered.len(), 2);
        // The 23:59:59 row on the end date is included
        assert_eq!(
            filtered.records[1].hotel_name.as_deref(),
            Some("Seaside Inn")
        );
    }

    #[test]
    fn test_timecost_range_inclusive() {
        let filters = FilterSet {
            min_timecost: Some(4.0),
            max_timecost: Some(9.0),
            ..Default::default()
        };
        assert_eq!(filters.apply(&table()).len(), 2);
    }

    #[test]
    fn test_categorical_and_risk_filters() {
        let mut filters = FilterSet::default();
        filters.hotels.insert("Grand Palace".to_string());
        filters.risk_tiers.insert(RiskTier::Low);

        let filtered = filters.apply(&table());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.records[0].response_timecost, Some(4.0));
    }

    #[test]
    fn test_null_fields_excluded_by_active_filters() {
        let mut t = table();
        t.records.push(NormalizedRecord::default()); // all nulls

        let filters = FilterSet {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        assert_eq!(filters.apply(&t).len(), 3);
    }

    #[test]
    fn test_zero_match_filter_is_not_an_error() {
        let mut filters = FilterSet::default();
        filters.hotels.insert("Nonexistent".to_string());
        let filtered = filters.apply(&table());
        assert!(filtered.is_empty());
    }
}
