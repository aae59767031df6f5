//! Cost Explorer `GetCostAndUsage` wire models.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Metric name for unblended cost.
pub const UNBLENDED_COST: &str = "UnblendedCost";

/// Time bucket granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    #[default]
    Daily,
    Monthly,
    Hourly,
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "DAILY"),
            Self::Monthly => write!(f, "MONTHLY"),
            Self::Hourly => write!(f, "HOURLY"),
        }
    }
}

/// Date window; `start` inclusive, `end` exclusive. Serialized as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DateInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// `GetCostAndUsage` input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CostAndUsageRequest {
    pub time_period: DateInterval,
    pub granularity: Granularity,
    pub metrics: Vec<String>,
}

impl CostAndUsageRequest {
    /// Daily unblended cost for the day before `now`.
    ///
    /// The window is `[(now - 1 day).date, now.date)`.
    #[must_use]
    pub fn previous_day(now: NaiveDateTime) -> Self {
        Self {
            time_period: DateInterval {
                start: (now - Duration::days(1)).date(),
                end: now.date(),
            },
            granularity: Granularity::Daily,
            metrics: vec![UNBLENDED_COST.to_string()],
        }
    }
}

/// A single metric value. Amounts stay strings to keep full precision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricValue {
    pub amount: Option<String>,
    pub unit: Option<String>,
}

/// Costs for one time bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultByTime {
    pub time_period: Option<DateInterval>,
    #[serde(default)]
    pub total: HashMap<String, MetricValue>,
    #[serde(default)]
    pub estimated: bool,
}

/// `GetCostAndUsage` output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CostAndUsageResponse {
    #[serde(default)]
    pub results_by_time: Vec<ResultByTime>,
    pub next_page_token: Option<String>,
}
