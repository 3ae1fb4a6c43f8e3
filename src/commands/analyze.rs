use anyhow::{Context, Result};
use std::path::PathBuf;

use trendlens::analytics::AnomalyDetector;
use trendlens::config::Config;
use trendlens::error::TrendlensErrorTrait;
use trendlens::llm::Credential;
use trendlens::models::{AnalysisReport, Direction};
use trendlens::pipeline::Pipeline;
use trendlens::utils::{format_pct, format_timeframe_display, region_display_name};

/// Parameters of one `analyze` invocation
pub struct AnalyzeParams {
    pub keyword: String,
    pub year: Option<i32>,
    pub region: Option<String>,
    pub threshold: Option<f64>,
    pub api_key: Option<String>,
    pub config: Option<PathBuf>,
    pub json: bool,
}

pub async fn analyze(params: AnalyzeParams) -> Result<()> {
    // Flags override file and environment; validate once they are applied
    let mut config = Config::load(params.config.as_deref())?;
    if let Some(year) = params.year {
        config.trends.year = year;
    }
    if let Some(region) = &params.region {
        config.trends.region = region.trim().to_uppercase();
    }
    if let Some(threshold) = params.threshold {
        config.detection.threshold = threshold;
    }
    if let Err(e) = config.validate() {
        eprintln!("{}: {}", e.category().description(), e.guidance());
        return Err(e.into());
    }

    let credential = Credential::from_input_or_env(params.api_key.as_deref());
    let pipeline = Pipeline::from_config(&config, credential)
        .context("Failed to build analysis pipeline")?;

    let report = match pipeline.run(&params.keyword).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}: {}", e.category().description(), e.guidance());
            return Err(e.into());
        }
    };

    if params.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &AnalysisReport) {
    let query = &report.series.query;
    println!("Keyword: \"{}\"", query.keyword);
    println!(
        "Time period: {} | Region: {}",
        format_timeframe_display(&query.timeframe()),
        region_display_name(&query.region)
    );
    println!("Explanations: {}", report.provider);
    println!("================================");

    for point in report.series.points() {
        let marker = report
            .anomalies
            .iter()
            .find(|a| a.anomaly.week_start == point.week_start)
            .map(|a| match a.anomaly.direction {
                Direction::Spike => "  ▲",
                Direction::Drop => "  ▼",
            })
            .unwrap_or("");
        println!("{}  {:>3}{marker}", point.week_start, point.value);
    }

    let gaps = report.series.gaps();
    if !gaps.is_empty() {
        println!("\n{} gap(s) in the series; comparisons across them were skipped.", gaps.len());
    }

    println!("\nAnomalies (±{:.0}% WoW)", report.threshold * 100.0);
    if report.anomalies.is_empty() {
        println!("No anomalies detected.");
        return;
    }

    let anomalies: Vec<_> = report.anomalies.iter().map(|a| a.anomaly.clone()).collect();
    let summary = AnomalyDetector::summary(&anomalies);
    println!(
        "{} spike(s), {} drop(s), {} explanation failure(s)",
        summary.spikes,
        summary.drops,
        report.failed_explanations()
    );

    for item in &report.anomalies {
        let anomaly = &item.anomaly;
        println!(
            "\n{} • {} • WoW: {} ({} → {})",
            anomaly.week_start,
            anomaly.direction.verb(),
            format_pct(anomaly.percent_change),
            anomaly.previous_value,
            anomaly.current_value
        );
        println!("  [{}] {}", item.explanation.source, item.explanation.text);
        if let Some(error) = &item.explanation.error {
            println!("  (live explanation failed: {error})");
        }
    }
}
