//! Pipeline configuration.
//!
//! Per spec §9: "a few module-level constants (rate limits, depth caps,
//! source priority) — pass as an immutable config struct rather than
//! process-wide state." `PipelineConfig` is built once (from the
//! environment, an optional `.env`-style file, or explicit overrides) and
//! threaded through every adapter and the coordinator by reference.

use std::path::PathBuf;
use std::time::Duration;

/// Depth level governing per-source result caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    Quick,
    Default,
    Deep,
}

impl Default for Depth {
    fn default() -> Self {
        Depth::Default
    }
}

/// Which sources a query should fan out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Arxiv,
    Biorxiv,
    Medrxiv,
    Pubmed,
    HuggingFace,
    OpenAlex,
    SemanticScholar,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Arxiv => "arxiv",
            Source::Biorxiv => "biorxiv",
            Source::Medrxiv => "medrxiv",
            Source::Pubmed => "pubmed",
            Source::HuggingFace => "huggingface",
            Source::OpenAlex => "openalex",
            Source::SemanticScholar => "semanticscholar",
        }
    }

    /// Source priority for dedup: lower wins. §4.8.
    pub fn priority(&self) -> u8 {
        match self {
            Source::Pubmed => 0,
            Source::OpenAlex => 1,
            Source::SemanticScholar => 1,
            Source::Biorxiv => 2,
            Source::Medrxiv => 3,
            Source::Arxiv => 4,
            Source::HuggingFace => 5,
        }
    }
}

/// A named group of sources, resolved by the pipeline coordinator (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSet {
    All,
    Preprints,
    Single(Source),
}

impl SourceSet {
    /// Resolve into the concrete list of sources to query.
    pub fn resolve(&self) -> Vec<Source> {
        match self {
            SourceSet::All => vec![
                Source::OpenAlex,
                Source::SemanticScholar,
                Source::Arxiv,
                Source::Pubmed,
                Source::HuggingFace,
            ],
            SourceSet::Preprints => vec![Source::OpenAlex, Source::Arxiv],
            SourceSet::Single(s) => vec![*s],
        }
    }
}

/// Immutable configuration shared across the whole pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Optional NCBI API key: lifts PubMed rate from 3/s to 10/s.
    pub ncbi_api_key: Option<String>,
    /// Optional Semantic Scholar API key: unlocks a higher quota.
    pub s2_api_key: Option<String>,
    /// Contact address used in OpenAlex's "polite pool" `mailto` parameter.
    pub contact_email: String,
    /// Enables verbose request logging.
    pub debug: bool,
    /// Default per-request timeout.
    pub default_timeout: Duration,
    /// Timeout for arXiv and PubMed EFetch, which return larger XML bodies.
    pub long_timeout: Duration,
    /// Size of the coordinator's worker pool over active sources, and of
    /// bioRxiv's nested page-fetch pool.
    pub worker_pool_size: usize,
    /// User-Agent sent on every outbound request.
    pub user_agent: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            ncbi_api_key: None,
            s2_api_key: None,
            contact_email: "research-pulse@users.noreply.github.com".to_string(),
            debug: false,
            default_timeout: Duration::from_secs(30),
            long_timeout: Duration::from_secs(60),
            worker_pool_size: 5,
            user_agent: "research-pulse/0.1 (+https://github.com/research-pulse)".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Build configuration from the process environment, falling back to a
    /// `.env`-style file at `config_path` if present (mirrors the original
    /// skill's `~/.config/<app>/.env` convention).
    pub fn from_env(config_path: Option<PathBuf>) -> Self {
        if let Some(path) = config_path {
            let _ = dotenvy::from_path(&path);
        }

        let mut cfg = PipelineConfig::default();
        cfg.ncbi_api_key = std::env::var("NCBI_API_KEY").ok().filter(|s| !s.is_empty());
        cfg.s2_api_key = std::env::var("S2_API_KEY").ok().filter(|s| !s.is_empty());
        cfg.debug = std::env::var("RESEARCH_PULSE_DEBUG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        cfg
    }

    /// Default config-file location: `~/.config/research-pulse/.env`.
    pub fn default_config_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join(".config").join("research-pulse").join(".env"))
    }
}
