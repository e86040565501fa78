//! Stay-period segmentation
//!
//! Groups conversations into inferred guest-stay intervals per room, using the
//! property's configured check-in/check-out times. This is a documented
//! heuristic: stays are reconstructed from timestamps alone, with no booking
//! data, so the boundaries are a best-effort inference rather than ground
//! truth. The policy is explicit and configurable, never a hidden constant.
//!
//! Boundary policy: the first conversation of a prospective stay anchors a
//! [check-in, check-out) window. A conversation at or after the configured
//! check-in time anchors the window to its own date, an earlier one to the
//! previous date (the guest checked in yesterday). When check-out is at or
//! before check-in (the normal overnight case) the window closes the next day.
//! Conversations inside the window join the stay; the first one outside it
//! closes the stay and anchors the next.

use crate::error::AnalysisError;
use crate::schema::NormalizedRecord;
use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configured check-in/check-out times-of-day.
///
/// Both are required before a report can be exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayConfig {
    pub checkin: NaiveTime,
    pub checkout: NaiveTime,
}

impl StayConfig {
    /// Parse from "HH:MM" strings (the operator-facing format).
    pub fn parse(checkin: &str, checkout: &str) -> Result<StayConfig, AnalysisError> {
        Ok(StayConfig {
            checkin: parse_time_of_day(checkin)?,
            checkout: parse_time_of_day(checkout)?,
        })
    }
}

fn parse_time_of_day(raw: &str) -> Result<NaiveTime, AnalysisError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| AnalysisError::InvalidTimeOfDay(raw.to_string()))
}

/// One inferred guest stay with its conversations in chronological order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StayPeriod {
    pub hotel_name: Option<String>,
    pub room_name: Option<String>,
    /// Inferred check-in datetime
    pub start: NaiveDateTime,
    /// Inferred check-out datetime (exclusive)
    pub end: NaiveDateTime,
    pub records: Vec<NormalizedRecord>,
}

/// Segment records into stay periods.
///
/// Rows are grouped by (hotel, room) and walked in timestamp order; rows
/// without a parseable timestamp cannot be placed in a stay and are skipped.
/// Output is ordered by room name ascending, then hotel name, then start.
pub fn segment(records: &[NormalizedRecord], config: &StayConfig) -> Vec<StayPeriod> {
    type RoomKey = (Option<String>, Option<String>);
    let mut by_room: BTreeMap<RoomKey, Vec<&NormalizedRecord>> = BTreeMap::new();

    for record in records {
        if record.request_timestamp.is_none() {
            continue;
        }
        let key = (record.room_name.clone(), record.hotel_name.clone());
        by_room.entry(key).or_default().push(record);
    }

    let mut periods = Vec::new();

    for ((room, hotel), mut rows) in by_room {
        rows.sort_by_key(|r| r.request_timestamp);

        let mut current: Option<StayPeriod> = None;
        for row in rows {
            let Some(ts) = row.request_timestamp else {
                continue;
            };

            match current.as_mut() {
                Some(period) if period.start <= ts && ts < period.end => {
                    period.records.push(row.clone());
                }
                _ => {
                    if let Some(done) = current.take() {
                        periods.push(done);
                    }
                    let (start, end) = stay_boundaries(ts, config);
                    current = Some(StayPeriod {
                        hotel_name: hotel.clone(),
                        room_name: room.clone(),
                        start,
                        end,
                        records: vec![row.clone()],
                    });
                }
            }
        }
        if let Some(done) = current.take() {
            periods.push(done);
        }
    }

    periods
}

/// Derive the [check-in, check-out) window anchored on one conversation.
fn stay_boundaries(ts: NaiveDateTime, config: &StayConfig) -> (NaiveDateTime, NaiveDateTime) {
    let checkin_date = if ts.time() >= config.checkin {
        ts.date()
    } else {
        ts.date() - Duration::days(1)
    };
    let start = checkin_date.and_time(config.checkin);

    let checkout_date = if config.checkout <= config.checkin {
        checkin_date + Duration::days(1)
    } else {
        checkin_date
    };
    let end = checkout_date.and_time(config.checkout);

    (start, end)
}
