// Core data structures for trendlens

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default observation year
pub const DEFAULT_YEAR: i32 = 2023;

/// Default geography (ISO 3166-1 alpha-2)
pub const DEFAULT_REGION: &str = "US";

/// One logical trend request: a keyword over one calendar year in one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendQuery {
    pub keyword: String,
    pub year: i32,
    pub region: String,
}

impl TrendQuery {
    pub fn new(keyword: impl Into<String>, year: i32, region: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into().trim().to_string(),
            year,
            region: region.into().trim().to_uppercase(),
        }
    }

    /// Provider timeframe covering the whole year, e.g. `2023-01-01 2023-12-31`
    pub fn timeframe(&self) -> String {
        format!("{0}-01-01 {0}-12-31", self.year)
    }
}

/// A single week of search interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub week_start: NaiveDate,
    pub value: u32,
}

impl TrendPoint {
    pub fn new(week_start: NaiveDate, value: u32) -> Self {
        Self { week_start, value }
    }
}

/// Weekly interest series for one keyword
///
/// Points are strictly increasing by week. Weeks the provider reported
/// without data are absent rather than interpolated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub query: TrendQuery,
    points: Vec<TrendPoint>,
}

impl TrendSeries {
    /// Build a series, sorting by week and dropping repeated weeks (first wins)
    pub fn new(query: TrendQuery, mut points: Vec<TrendPoint>) -> Self {
        points.sort_by_key(|p| p.week_start);
        points.dedup_by_key(|p| p.week_start);
        Self { query, points }
    }

    pub fn keyword(&self) -> &str {
        &self.query.keyword
    }

    pub fn points(&self) -> &[TrendPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Weeks missing between consecutive points
    pub fn gaps(&self) -> Vec<(NaiveDate, NaiveDate)> {
        self.points
            .windows(2)
            .filter(|w| w[1].week_start - w[0].week_start != Duration::weeks(1))
            .map(|w| (w[0].week_start, w[1].week_start))
            .collect()
    }
}

/// Direction of a week-over-week change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Spike,
    Drop,
}

impl Direction {
    /// Classify a non-zero change fraction
    pub fn from_change(percent_change: f64) -> Self {
        if percent_change > 0.0 {
            Self::Spike
        } else {
            Self::Drop
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spike => "spike",
            Self::Drop => "drop",
        }
    }

    /// Past-tense verb for prose ("interest spiked")
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Spike => "spiked",
            Self::Drop => "dropped",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A week whose interest moved at least the threshold fraction from the prior week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub week_start: NaiveDate,
    pub previous_value: u32,
    pub current_value: u32,
    /// Change as a fraction of the previous value (0.35 = +35%)
    pub percent_change: f64,
    pub direction: Direction,
}

impl Anomaly {
    /// Change fraction between two consecutive values, `None` from a zero baseline
    pub fn change_between(previous_value: u32, current_value: u32) -> Option<f64> {
        if previous_value == 0 {
            return None;
        }
        let prev = f64::from(previous_value);
        Some((f64::from(current_value) - prev) / prev)
    }

    /// Recompute the change fraction from the stored values
    pub fn recompute_change(&self) -> Option<f64> {
        Self::change_between(self.previous_value, self.current_value)
    }

    /// Identity of this anomaly for the given keyword
    pub fn identity(&self, keyword: &str) -> AnomalyIdentity {
        AnomalyIdentity::new(keyword, self.week_start, self.direction)
    }
}

/// Stable key `(keyword, week, direction)` used to deduplicate explanation work
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnomalyIdentity {
    pub keyword: String,
    pub week_start: NaiveDate,
    pub direction: Direction,
}

impl AnomalyIdentity {
    pub fn new(keyword: &str, week_start: NaiveDate, direction: Direction) -> Self {
        Self {
            keyword: normalize_keyword(keyword),
            week_start,
            direction,
        }
    }
}

impl fmt::Display for AnomalyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}#{}",
            self.keyword,
            self.week_start.format("%Y-%m-%d"),
            self.direction
        )
    }
}

/// Normalize a keyword for identity comparison
pub fn normalize_keyword(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

/// Where an explanation's text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationSource {
    Live,
    Demo,
    Error,
}

impl ExplanationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Demo => "demo",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ExplanationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explanation text for one anomaly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub identity: AnomalyIdentity,
    pub text: String,
    pub source: ExplanationSource,
    /// Failure message when `source` is `Error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Explanation {
    pub fn new(identity: AnomalyIdentity, text: impl Into<String>, source: ExplanationSource) -> Self {
        Self {
            identity,
            text: text.into(),
            source,
            error: None,
        }
    }

    /// Fallback explanation carrying the failure that caused it
    pub fn failed(identity: AnomalyIdentity, text: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            identity,
            text: text.into(),
            source: ExplanationSource::Error,
            error: Some(error.into()),
        }
    }
}

/// Which explanation provider a pipeline is running with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ProviderStatus {
    Live { model: String },
    Demo { reason: String },
}

impl ProviderStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live { .. })
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live { model } => write!(f, "live ({model})"),
            Self::Demo { reason } => write!(f, "demo ({reason})"),
        }
    }
}

/// An anomaly paired with its explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedAnomaly {
    pub anomaly: Anomaly,
    pub explanation: Explanation,
}

/// Result of one analysis run, consumed by the display layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub series: TrendSeries,
    pub anomalies: Vec<AnalyzedAnomaly>,
    pub provider: ProviderStatus,
    pub threshold: f64,
}

impl AnalysisReport {
    /// Number of explanations that fell back after a provider failure
    pub fn failed_explanations(&self) -> usize {
        self.anomalies
            .iter()
            .filter(|a| a.explanation.source == ExplanationSource::Error)
            .count()
    }
}
