//! Wire format of the trend provider
//!
//! A series is retrieved in two steps. The explore endpoint describes the
//! widgets available for a comparison; the `TIMESERIES` widget carries a token
//! and a request object which are then sent to the multiline endpoint to get
//! the weekly timeline. Both responses start with an anti-JSON-hijacking
//! prefix (`)]}'` or `)]}',`) that must be stripped.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::{TrendPoint, TrendQuery};
use crate::utils::error::FetchError;

/// Widget id of the interest-over-time chart
pub const TIMESERIES_WIDGET: &str = "TIMESERIES";

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    widgets: Vec<ExploreWidget>,
}

#[derive(Debug, Deserialize)]
struct ExploreWidget {
    id: String,
    #[serde(default)]
    token: String,
    #[serde(default)]
    request: Value,
}

/// Token and request needed to fetch the interest-over-time timeline
#[derive(Debug, Clone, PartialEq)]
pub struct TimeseriesWidget {
    pub token: String,
    pub request: Value,
}

#[derive(Debug, Deserialize)]
struct MultilineResponse {
    default: MultilineData,
}

#[derive(Debug, Deserialize)]
struct MultilineData {
    #[serde(default, rename = "timelineData")]
    timeline_data: Vec<TimelineEntry>,
}

#[derive(Debug, Deserialize)]
struct TimelineEntry {
    time: String,
    #[serde(default)]
    value: Vec<u32>,
    #[serde(default, rename = "hasData")]
    has_data: Vec<bool>,
}

/// Body of the explore `req` parameter for a single-keyword comparison
pub fn explore_request(query: &TrendQuery) -> Value {
    json!({
        "comparisonItem": [{
            "keyword": query.keyword,
            "time": query.timeframe(),
            "geo": query.region,
        }],
        "category": 0,
        "property": "",
    })
}

/// Strip the anti-hijacking prefix and return the JSON payload
fn strip_prefix(body: &str) -> Result<&str, FetchError> {
    body.find('{')
        .map(|start| &body[start..])
        .ok_or_else(|| FetchError::Decode("response has no JSON payload".to_string()))
}

/// Find the interest-over-time widget in an explore response
pub fn parse_explore(body: &str) -> Result<TimeseriesWidget, FetchError> {
    let response: ExploreResponse = serde_json::from_str(strip_prefix(body)?)
        .map_err(|e| FetchError::Decode(format!("explore response: {e}")))?;

    response
        .widgets
        .into_iter()
        .find(|w| w.id == TIMESERIES_WIDGET)
        .map(|w| TimeseriesWidget {
            token: w.token,
            request: w.request,
        })
        .ok_or_else(|| FetchError::Decode("explore response has no TIMESERIES widget".to_string()))
}

/// Parse a multiline timeline into weekly points
///
/// Weeks flagged without data are left out so the gap stays visible.
pub fn parse_timeline(body: &str) -> Result<Vec<TrendPoint>, FetchError> {
    let response: MultilineResponse = serde_json::from_str(strip_prefix(body)?)
        .map_err(|e| FetchError::Decode(format!("timeline response: {e}")))?;

    let mut points = Vec::with_capacity(response.default.timeline_data.len());
    for entry in response.default.timeline_data {
        if !entry.has_data.first().copied().unwrap_or(true) {
            continue;
        }
        let Some(&value) = entry.value.first() else {
            continue;
        };
        points.push(TrendPoint::new(parse_week(&entry.time)?, value));
    }

    Ok(points)
}

/// Convert a unix-seconds timestamp string into the week's start date (UTC)
fn parse_week(time: &str) -> Result<NaiveDate, FetchError> {
    time.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.date_naive())
        .ok_or_else(|| FetchError::Decode(format!("invalid timeline timestamp: {time}")))
}
