//! Response-time risk classification
//!
//! Buckets response latency into ordered risk tiers by fixed thresholds.
//! Lower bounds are inclusive: exactly 3.0s is Low, exactly 8.0s is High.

use serde::{Deserialize, Serialize};

/// Risk tier derived from response latency
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Safe,
    Low,
    Medium,
    High,
}

/// Tier thresholds in seconds: [3.0, 5.0) Low, [5.0, 8.0) Medium, >= 8.0 High
pub const TIER_BOUNDS_SECS: [f64; 3] = [3.0, 5.0, 8.0];

impl RiskTier {
    /// Classify a non-negative response timecost in seconds.
    pub fn classify(timecost: f64) -> RiskTier {
        if timecost < TIER_BOUNDS_SECS[0] {
            RiskTier::Safe
        } else if timecost < TIER_BOUNDS_SECS[1] {
            RiskTier::Low
        } else if timecost < TIER_BOUNDS_SECS[2] {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }

    /// Classify an optional timecost.
    ///
    /// None and negative values are data-quality defects: the row is excluded
    /// from risk aggregates but retained everywhere else.
    pub fn classify_opt(timecost: Option<f64>) -> Option<RiskTier> {
        match timecost {
            Some(t) if t.is_finite() && t >= 0.0 => Some(RiskTier::classify(t)),
            _ => None,
        }
    }

    /// All tiers in ascending severity, for stable chart/report ordering
    pub fn all() -> [RiskTier; 4] {
        [RiskTier::Safe, RiskTier::Low, RiskTier::Medium, RiskTier::High]
    }

    /// Display label carrying the bucket range
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Safe => "Safe (<3s)",
            RiskTier::Low => "Low (3-5s)",
            RiskTier::Medium => "Medium (5-8s)",
            RiskTier::High => "High (>=8s)",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Safe => "safe",
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }
}

impl std::str::FromStr for RiskTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "safe" => Ok(RiskTier::Safe),
            "low" => Ok(RiskTier::Low),
            "medium" => Ok(RiskTier::Medium),
            "high" => Ok(RiskTier::High),
            other => Err(format!("unknown risk tier: {other}")),
        }
    }
}
