//! metric-expr CLI
//!
//! Command-line interface for evaluating metric expressions:
//! - Evaluate a JSON expression tree against the configured query service
//! - Inspect how a literal is typed
//! - Generate a default config file
//!
//! # Configuration
//!
//! Settings are read from the first config file found (see
//! [`Config::load_default`]) and overridden by `METRIC_EXPR_*` environment
//! variables. `RUST_LOG` takes precedence over the configured log level.

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use metric_expr::config::{generate_default_config, Config, LoggingConfig};
use metric_expr::datasource::{HttpDataSource, IntervalRequest};
use metric_expr::expression::Literal;
use metric_expr::pipeline::ExpressionEvaluator;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "metric-expr")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Evaluate arithmetic expressions over time-series metrics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate an expression tree
    Eval {
        /// JSON expression file, or "-" for stdin
        #[arg(short, long, default_value = "-")]
        expr: String,
        /// Interval start: Unix milliseconds or RFC 3339
        #[arg(long)]
        start: Option<String>,
        /// Interval end: Unix milliseconds or RFC 3339 (default: now)
        #[arg(long)]
        end: Option<String>,
        /// Interval length when no start is given (e.g. 1h, 7d)
        #[arg(short, long)]
        last: Option<String>,
        /// Number of buckets
        #[arg(short, long)]
        buckets: Option<u32>,
        /// Query service URL
        #[arg(long)]
        url: Option<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show how a literal is typed
    Literal {
        /// Literal text (e.g. 5Mi, 90%, -1d)
        text: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_logging(&config.logging);

    match cli.command {
        Commands::Eval {
            expr,
            start,
            end,
            last,
            buckets,
            url,
            format,
        } => {
            let mut config = config;
            if let Some(url) = url {
                config.datasource.url = url;
            }
            let bucket_count = buckets.unwrap_or(config.query.bucket_count);
            let range = last.unwrap_or_else(|| config.query.default_range.clone());
            let interval = build_interval(start.as_deref(), end.as_deref(), &range, bucket_count)?;

            let json = read_expression(&expr)?;
            let data_source = Arc::new(HttpDataSource::new(&config.datasource)?);
            let evaluator = ExpressionEvaluator::with_config(data_source, &config);

            tracing::info!(
                url = %config.datasource.url,
                start = interval.start,
                end = interval.end,
                buckets = interval.bucket_count,
                "Evaluating expression"
            );
            let result = evaluator.evaluate_json(&json, &interval).await?;

            match format {
                OutputFormat::Table => print!("{}", result.table()),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(result.table())?)
                }
            }
        }

        Commands::Literal { text } => {
            let literal = Literal::parse(&text)?;
            println!("{:<8} {}", "text:", literal.text);
            println!("{:<8} {:?}", "kind:", literal.kind);
            println!("{:<8} {}", "type:", literal.value.column_type());
            println!("{:<8} {}", "value:", literal.value);
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("metric_expr={}", config.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn read_expression(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read expression from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read {}", source))
    }
}

fn build_interval(
    start: Option<&str>,
    end: Option<&str>,
    range: &str,
    bucket_count: u32,
) -> anyhow::Result<IntervalRequest> {
    let end = match end {
        Some(s) => parse_time(s)?,
        None => Utc::now().timestamp_millis(),
    };
    let start = match start {
        Some(s) => parse_time(s)?,
        None => {
            let secs = Literal::parse(range)?
                .duration_secs()
                .filter(|s| *s > 0)
                .ok_or_else(|| anyhow!("range must be a positive duration, got '{}'", range))?;
            end - secs * 1000
        }
    };

    IntervalRequest::try_new(start, end, bucket_count)
        .ok_or_else(|| anyhow!("interval start {} is not before end {}", start, end))
}

fn parse_time(s: &str) -> anyhow::Result<i64> {
    if let Ok(ms) = s.parse::<i64>() {
        return Ok(ms);
    }
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Ok(dt.timestamp_millis()),
        Err(e) => bail!("invalid timestamp '{}': {}", s, e),
    }
}
