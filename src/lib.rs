//! # research-pulse
//!
//! Concurrent scholarly-literature aggregation pipeline.
//!
//! ## Modules
//!
//! - [`adapters`] - per-source search adapters (arXiv, bioRxiv/medRxiv,
//!   PubMed, Hugging Face, OpenAlex, Semantic Scholar)
//! - [`pipeline`] - fans a topic query out across sources and reduces
//!   the results into a [`schema::ResultSet`]
//! - [`schema`] - wire/domain types shared across adapters
//! - [`relevance`] - keyword relevance scoring
//! - [`scoring`] - composite score weighting recency/relevance/engagement
//! - [`dates`] - date-range filtering and confidence tagging
//! - [`engagement`] - per-source engagement-to-score mapping
//! - [`dedupe`] - DOI and title-similarity deduplication
//! - [`cache`] - report caching
//! - [`transport`] - shared HTTP client with retry
//! - [`config`] - pipeline configuration and source selection
//! - [`error`] - custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use research_pulse::{config, pipeline, schema, transport};
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> research_pulse::Result<()> {
//!     let config = config::PipelineConfig::default();
//!     let transport = transport::Transport::new(&config)?;
//!     let query = schema::TopicQuery {
//!         topic: "CRISPR gene editing".to_string(),
//!         from_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
//!         to_date: NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
//!         depth: config::Depth::Quick,
//!     };
//!     let today = chrono::Utc::now().date_naive();
//!     let results = pipeline::run(query, config::SourceSet::All, &transport, &config, today).await?;
//!     println!("Found results across {} sources", results.per_source_items.len());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cache;
pub mod config;
pub mod dates;
pub mod dedupe;
pub mod engagement;
pub mod error;
pub mod pipeline;
pub mod relevance;
pub mod schema;
pub mod scoring;
pub mod transport;

pub use error::{PipelineError, Result};
