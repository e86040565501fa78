//! Chart-ready aggregates
//!
//! Pure counting functions over the (filtered) normalized records. With uploads
//! capped at 10,000 rows nothing here is incremental or cached; every filter
//! change recomputes from scratch.

use crate::risk::RiskTier;
use crate::schema::NormalizedRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Default cut-off for the key-entity ranking
pub const DEFAULT_TOP_ENTITIES: usize = 20;

/// Delimiters separating multiple entities inside one `key_entity` value
const ENTITY_DELIMITERS: [char; 4] = ['、', ',', ';', '/'];

/// Placeholder the upstream extractor emits when no entity was found
const NO_ENTITY_MARKER: &str = "不存在實體";

/// Dashboard summary strip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_conversations: usize,
    /// Mean of valid timecosts; None when no row has one
    pub avg_response_time: Option<f64>,
    pub total_hotels: usize,
    pub total_rooms: usize,
    pub high_risk_count: usize,
    pub high_risk_percentage: f64,
}

/// Count rows per intent, descending count then ascending intent name.
///
/// Rows with a null intent are skipped, so the counts sum to the number of
/// rows with a non-null `user_intent`.
pub fn intent_distribution(records: &[NormalizedRecord]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        if let Some(intent) = record.user_intent.as_deref() {
            *counts.entry(intent).or_insert(0) += 1;
        }
    }
    sorted_counts(counts)
}

/// Count classified rows per calendar date and risk tier, ascending by date.
///
/// Dates with zero classified rows are omitted; rows with a null timestamp or
/// an unclassifiable timecost are excluded.
pub fn daily_risk_accumulation(
    records: &[NormalizedRecord],
) -> Vec<(NaiveDate, BTreeMap<RiskTier, usize>)> {
    let mut by_date: BTreeMap<NaiveDate, BTreeMap<RiskTier, usize>> = BTreeMap::new();

    for record in records {
        let (Some(ts), Some(tier)) = (
            record.request_timestamp,
            RiskTier::classify_opt(record.response_timecost),
        ) else {
            continue;
        };
        *by_date
            .entry(ts.date())
            .or_default()
            .entry(tier)
            .or_insert(0) += 1;
    }

    by_date.into_iter().collect()
}

/// Count rows per risk tier over the given records.
pub fn risk_tier_counts(records: &[NormalizedRecord]) -> BTreeMap<RiskTier, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        if let Some(tier) = RiskTier::classify_opt(record.response_timecost) {
            *counts.entry(tier).or_insert(0) += 1;
        }
    }
    counts
}

/// Rank individual key entities by frequency, truncated to the top `n`.
///
/// Multi-valued cells are split on the known delimiters and each entity is
/// counted on its own; empty fragments and the no-entity placeholder are
/// dropped. Ties break by ascending entity name.
pub fn top_entities(records: &[NormalizedRecord], n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let Some(raw) = record.key_entity.as_deref() else {
            continue;
        };
        for entity in raw.split(&ENTITY_DELIMITERS[..]) {
            let entity = entity.trim();
            if entity.is_empty() || entity == NO_ENTITY_MARKER {
                continue;
            }
            *counts.entry(entity).or_insert(0) += 1;
        }
    }

    let mut ranked = sorted_counts(counts);
    ranked.truncate(n);
    ranked
}

/// Compute the dashboard summary strip over the given records.
pub fn summary_metrics(records: &[NormalizedRecord]) -> SummaryMetrics {
    let total = records.len();
    if total == 0 {
        return SummaryMetrics::default();
    }

    let timecosts: Vec<f64> = records
        .iter()
        .filter_map(|r| r.response_timecost)
        .collect();
    let avg_response_time = if timecosts.is_empty() {
        None
    } else {
        Some(timecosts.iter().sum::<f64>() / timecosts.len() as f64)
    };

    let total_hotels = distinct(records, |r| r.hotel_name.as_deref());
    let total_rooms = distinct(records, |r| r.room_name.as_deref());

    let high_risk_count = records
        .iter()
        .filter(|r| RiskTier::classify_opt(r.response_timecost) == Some(RiskTier::High))
        .count();

    SummaryMetrics {
        total_conversations: total,
        avg_response_time,
        total_hotels,
        total_rooms,
        high_risk_count,
        high_risk_percentage: high_risk_count as f64 / total as f64 * 100.0,
    }
}

fn distinct<'a, F>(records: &'a [NormalizedRecord], pick: F) -> usize
where
    F: Fn(&'a NormalizedRecord) -> Option<&'a str>,
{
    records
        .iter()
        .filter_map(pick)
        .collect::<std::collections::BTreeSet<_>>()
        .len()
}

fn sorted_counts(counts: HashMap<&str, usize>) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}
