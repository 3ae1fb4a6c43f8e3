//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;
pub mod retry;

use chrono::NaiveDate;

/// Format a change fraction as a signed percentage, e.g. `+35.0%`
pub fn format_pct(fraction: f64) -> String {
    if !fraction.is_finite() {
        return String::from("n/a");
    }
    format!("{:+.1}%", fraction * 100.0)
}

/// Render a `YYYY-MM-DD YYYY-MM-DD` timeframe as `January 01, 2023 - December 31, 2023`
///
/// Returns the input unchanged when it cannot be parsed.
pub fn format_timeframe_display(timeframe: &str) -> String {
    let parsed = timeframe.split_once(' ').and_then(|(start, end)| {
        let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").ok()?;
        let end = NaiveDate::parse_from_str(end, "%Y-%m-%d").ok()?;
        Some((start, end))
    });

    match parsed {
        Some((start, end)) => format!(
            "{} - {}",
            start.format("%B %d, %Y"),
            end.format("%B %d, %Y")
        ),
        None => timeframe.to_string(),
    }
}

/// Display name for a two-letter region code, falling back to the code itself
pub fn region_display_name(code: &str) -> String {
    let name = match code.to_uppercase().as_str() {
        "US" => "the United States",
        "GB" => "the United Kingdom",
        "CA" => "Canada",
        "AU" => "Australia",
        "DE" => "Germany",
        "FR" => "France",
        "JP" => "Japan",
        "KR" => "South Korea",
        "IN" => "India",
        "BR" => "Brazil",
        "MX" => "Mexico",
        "ES" => "Spain",
        "IT" => "Italy",
        "NL" => "the Netherlands",
        "" => "worldwide",
        _ => return code.to_string(),
    };
    name.to_string()
}

/// Truncate text to a maximum number of characters
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
