use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trendlens::config::LoggingConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "trendlens",
    version,
    about = "Flag sharp week-over-week changes in search interest and explain them",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to TRENDLENS_LOG_FORMAT or text
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one keyword's weekly search interest
    Analyze {
        /// Keyword or phrase, e.g. "electric cars"
        keyword: String,

        /// Observation year
        #[arg(short, long)]
        year: Option<i32>,

        /// Two-letter region code
        #[arg(short, long)]
        region: Option<String>,

        /// Week-over-week change fraction that flags an anomaly
        #[arg(short, long)]
        threshold: Option<f64>,

        /// API key for live explanations (falls back to OPENAI_API_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Initialize tracing/logging
    let mut logging = LoggingConfig::from_env();
    if let Some(format) = cli.log_format.take() {
        logging.format = format;
    }
    setup_tracing(&logging, cli.verbose)?;

    match cli.command {
        Commands::Analyze {
            keyword,
            year,
            region,
            threshold,
            api_key,
            config,
            json,
        } => {
            tracing::info!(
                keyword = %keyword,
                year = ?year,
                region = ?region,
                threshold = ?threshold,
                "Starting analyze command"
            );
            commands::analyze(commands::AnalyzeParams {
                keyword,
                year,
                region,
                threshold,
                api_key,
                config,
                json,
            })
            .await?;
        }
    }

    Ok(())
}

/// Log filter: `--verbose`, then `RUST_LOG`, then the configured level
fn build_filter(logging: &LoggingConfig, verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("trendlens=debug,info");
    }
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("trendlens={},warn", logging.level)))
        .unwrap_or_else(|_| EnvFilter::new("trendlens=info,warn"))
}

fn setup_tracing(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let env_filter = build_filter(logging, verbose);

    match logging.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
