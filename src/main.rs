//! research-pulse - concurrent scholarly-literature aggregation CLI
//!
//! ## Usage
//! ```bash
//! research-pulse "CRISPR gene editing" --sources all --depth default
//! ```

use chrono::{Local, NaiveDate};
use clap::Parser;
use research_pulse::config::{Depth, PipelineConfig, Source, SourceSet};
use research_pulse::error::PipelineError;
use research_pulse::schema::TopicQuery;
use research_pulse::{pipeline, transport::Transport, Result};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Concurrent scholarly-literature aggregation pipeline.
#[derive(Parser)]
#[command(name = "research-pulse")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Topic to search for
    topic: String,

    /// Which sources to query: all, preprints, or a single source name
    #[arg(
        long,
        default_value = "all",
        value_parser = [
            "all", "preprints", "arxiv", "biorxiv", "medrxiv", "pubmed",
            "huggingface", "openalex", "semanticscholar",
        ],
    )]
    sources: String,

    /// Result depth, governing per-source caps
    #[arg(long, default_value = "default", value_parser = ["quick", "default", "deep"])]
    depth: String,

    /// Start of the date range (YYYY-MM-DD); defaults to 90 days before today
    #[arg(long)]
    from: Option<String>,

    /// End of the date range (YYYY-MM-DD); defaults to today
    #[arg(long)]
    to: Option<String>,

    /// Optional path to a `.env`-style config file
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn parse_source_set(s: &str) -> SourceSet {
    match s {
        "all" => SourceSet::All,
        "preprints" => SourceSet::Preprints,
        "arxiv" => SourceSet::Single(Source::Arxiv),
        "biorxiv" => SourceSet::Single(Source::Biorxiv),
        "medrxiv" => SourceSet::Single(Source::Medrxiv),
        "pubmed" => SourceSet::Single(Source::Pubmed),
        "huggingface" => SourceSet::Single(Source::HuggingFace),
        "openalex" => SourceSet::Single(Source::OpenAlex),
        "semanticscholar" => SourceSet::Single(Source::SemanticScholar),
        _ => SourceSet::All,
    }
}

fn parse_depth(s: &str) -> Depth {
    match s {
        "quick" => Depth::Quick,
        "deep" => Depth::Deep,
        _ => Depth::Default,
    }
}

fn parse_cli_date(s: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| PipelineError::Config(format!("invalid {field} date {s:?}, expected YYYY-MM-DD")))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    fmt().with_env_filter(filter).with_target(true).with_thread_ids(false).init();

    let today = Local::now().date_naive();
    let from_date = match cli.from {
        Some(s) => parse_cli_date(&s, "--from")?,
        None => today - chrono::Duration::days(90),
    };
    let to_date = match cli.to {
        Some(s) => parse_cli_date(&s, "--to")?,
        None => today,
    };

    let config_path = cli.config.or_else(PipelineConfig::default_config_path);
    let mut config = PipelineConfig::from_env(config_path);
    config.debug = config.debug || cli.debug;

    let transport = Transport::new(&config)?;

    let query = TopicQuery {
        topic: cli.topic,
        from_date,
        to_date,
        depth: parse_depth(&cli.depth),
    };
    let source_set = parse_source_set(&cli.sources);

    let result_set = pipeline::run(query, source_set, &transport, &config, today).await?;

    let json = serde_json::to_string_pretty(&result_set)?;
    println!("{json}");

    Ok(())
}
