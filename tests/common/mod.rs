//! Common test utilities

#![allow(dead_code)]

use serde_json::json;
use trendlens::config::TrendsConfig;
use trendlens::llm::LlmConfig;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Unix time of 2023-01-01 00:00 UTC (a Sunday)
pub const FIRST_WEEK: i64 = 1_672_531_200;

const WEEK_SECS: i64 = 7 * 24 * 60 * 60;

pub const EXPLORE_PATH: &str = "/trends/api/explore";
pub const MULTILINE_PATH: &str = "/trends/api/widgetdata/multiline";
pub const CHAT_PATH: &str = "/v1/chat/completions";

/// Trend config pointed at a mock server with millisecond backoff
pub fn fast_trends_config(base_url: &str) -> TrendsConfig {
    TrendsConfig {
        base_url: base_url.to_string(),
        requests_per_minute: 6000,
        max_attempts: 3,
        base_delay_ms: 1,
        max_delay_ms: 5,
        jitter_ms: 0,
        request_timeout_secs: 5,
        ..Default::default()
    }
}

/// LLM config pointed at a mock server
pub fn mock_llm_config(base_url: &str) -> LlmConfig {
    LlmConfig {
        endpoint: base_url.to_string(),
        timeout_secs: 5,
        ..Default::default()
    }
}

/// Explore response advertising a TIMESERIES widget
pub fn explore_body() -> String {
    let body = json!({
        "widgets": [
            {"id": "GEO_MAP", "token": "geo-token", "request": {"resolution": "REGION"}},
            {"id": "TIMESERIES", "token": "ts-token", "request": {"time": "2023-01-01 2023-12-31", "resolution": "WEEK"}}
        ]
    });
    format!(")]}}'\n{body}")
}

/// Multiline response with one entry per week; `None` marks a week without data
pub fn timeline_body(values: &[Option<u32>]) -> String {
    let entries: Vec<_> = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            json!({
                "time": (FIRST_WEEK + i as i64 * WEEK_SECS).to_string(),
                "value": [value.unwrap_or(0)],
                "hasData": [value.is_some()],
            })
        })
        .collect();
    let body = json!({"default": {"timelineData": entries, "averages": []}});
    format!(")]}}',\n{body}")
}

/// Timeline body for a dense series
pub fn dense_timeline(values: &[u32]) -> String {
    let values: Vec<_> = values.iter().copied().map(Some).collect();
    timeline_body(&values)
}

/// Mount both trend endpoints answering with `values`
pub async fn mount_trends(server: &MockServer, values: &[u32]) {
    Mock::given(method("GET"))
        .and(path(EXPLORE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(explore_body()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(MULTILINE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(dense_timeline(values)))
        .mount(server)
        .await;
}

/// Chat completion response with a single assistant message
pub fn chat_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}
