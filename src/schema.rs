//! Canonical schema (C4) and result set (C10).
//!
//! `Item` is modeled as a tagged variant (sum type) rather than a base
//! struct with dynamic dispatch, per the design notes: every item shares a
//! common header and carries exactly one source-specific payload.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{Depth, Source};

/// `{ topic, from_date, to_date, depth }`. §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicQuery {
    pub topic: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub depth: Depth,
}

impl TopicQuery {
    pub fn depth_cap(&self, source: Source) -> usize {
        use Depth::*;
        use Source::*;
        match (source, self.depth) {
            (Arxiv, Quick) => 30,
            (Arxiv, Default) => 100,
            (Arxiv, Deep) => 200,
            (Biorxiv, Quick) | (Medrxiv, Quick) => 20,
            (Biorxiv, Default) | (Medrxiv, Default) => 50,
            (Biorxiv, Deep) | (Medrxiv, Deep) => 200,
            (Pubmed, Quick) => 30,
            (Pubmed, Default) => 100,
            (Pubmed, Deep) => 200,
            (HuggingFace, Quick) => 20,
            (HuggingFace, Default) => 50,
            (HuggingFace, Deep) => 100,
            (OpenAlex, Quick) => 30,
            (OpenAlex, Default) => 100,
            (OpenAlex, Deep) => 200,
            (SemanticScholar, Quick) => 30,
            (SemanticScholar, Default) => 100,
            (SemanticScholar, Deep) => 200,
        }
    }
}

/// How confident the adapter is in the item's parsed `date`. §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateConfidence {
    High,
    Medium,
    Low,
}

impl Default for DateConfidence {
    fn default() -> Self {
        DateConfidence::Low
    }
}

/// Optional academic-signal sub-record attached to any item. §3.
///
/// All fields are optional; absence means "unknown", not "zero" — callers
/// must not coerce a missing field to a default before checking `is_some`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Engagement {
    pub published_doi: Option<String>,
    pub published_journal: Option<String>,
    pub venue: Option<String>,
    pub citation_count: Option<u64>,
    pub downloads: Option<u64>,
    pub likes: Option<u64>,
    pub author_count: Option<u32>,
}

/// `{ relevance, recency, engagement }`, each 0-100. §3.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SubScores {
    pub relevance: u32,
    pub recency: u32,
    pub engagement: u32,
}

/// Fields shared by every item, regardless of source. §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemHeader {
    /// Globally unique after dedup: `"<source>:<native_id>"`.
    pub id: String,
    pub title: String,
    pub url: String,
    pub date: Option<NaiveDate>,
    pub date_confidence: DateConfidence,
    /// `[0, 1]`.
    pub relevance: f64,
    pub why_relevant: String,
    pub subs: SubScores,
    /// `[0, 100]`.
    pub score: i32,
    pub engagement: Option<Engagement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivPayload {
    pub arxiv_id: String,
    pub categories: Vec<String>,
    pub primary_category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreprintServer {
    Biorxiv,
    Medrxiv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiorxivPayload {
    pub preprint_doi: Option<String>,
    pub category: String,
    pub source: PreprintServer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubmedPayload {
    pub pmid: String,
    pub journal: String,
    pub doi: Option<String>,
    pub mesh_terms: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HuggingFaceItemType {
    Model,
    Dataset,
    Paper,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFacePayload {
    pub hf_id: String,
    pub item_type: HuggingFaceItemType,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAlexPayload {
    pub openalex_id: String,
    pub doi: Option<String>,
    pub source_name: String,
    pub work_type: String,
    pub primary_topic_name: Option<String>,
    pub primary_topic_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticScholarPayload {
    pub paper_id: String,
    pub doi: Option<String>,
    pub venue: String,
    pub publication_types: Vec<String>,
}

/// Tagged-variant item: a common header plus exactly one source payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source")]
pub enum Item {
    #[serde(rename = "arxiv")]
    Arxiv {
        #[serde(flatten)]
        header: ItemHeader,
        #[serde(flatten)]
        payload: ArxivPayload,
    },
    #[serde(rename = "biorxiv")]
    Biorxiv {
        #[serde(flatten)]
        header: ItemHeader,
        #[serde(flatten)]
        payload: BiorxivPayload,
    },
    #[serde(rename = "pubmed")]
    Pubmed {
        #[serde(flatten)]
        header: ItemHeader,
        #[serde(flatten)]
        payload: PubmedPayload,
    },
    #[serde(rename = "huggingface")]
    HuggingFace {
        #[serde(flatten)]
        header: ItemHeader,
        #[serde(flatten)]
        payload: HuggingFacePayload,
    },
    #[serde(rename = "openalex")]
    OpenAlex {
        #[serde(flatten)]
        header: ItemHeader,
        #[serde(flatten)]
        payload: OpenAlexPayload,
    },
    #[serde(rename = "semanticscholar")]
    SemanticScholar {
        #[serde(flatten)]
        header: ItemHeader,
        #[serde(flatten)]
        payload: SemanticScholarPayload,
    },
}

impl Item {
    pub fn header(&self) -> &ItemHeader {
        match self {
            Item::Arxiv { header, .. }
            | Item::Biorxiv { header, .. }
            | Item::Pubmed { header, .. }
            | Item::HuggingFace { header, .. }
            | Item::OpenAlex { header, .. }
            | Item::SemanticScholar { header, .. } => header,
        }
    }

    pub fn header_mut(&mut self) -> &mut ItemHeader {
        match self {
            Item::Arxiv { header, .. }
            | Item::Biorxiv { header, .. }
            | Item::Pubmed { header, .. }
            | Item::HuggingFace { header, .. }
            | Item::OpenAlex { header, .. }
            | Item::SemanticScholar { header, .. } => header,
        }
    }

    /// The canonical source tag this item belongs to, for dedup priority
    /// and for grouping into `ResultSet::per_source_items`.
    pub fn source(&self) -> Source {
        match self {
            Item::Arxiv { .. } => Source::Arxiv,
            Item::Biorxiv { payload, .. } => match payload.source {
                PreprintServer::Biorxiv => Source::Biorxiv,
                PreprintServer::Medrxiv => Source::Medrxiv,
            },
            Item::Pubmed { .. } => Source::Pubmed,
            Item::HuggingFace { .. } => Source::HuggingFace,
            Item::OpenAlex { .. } => Source::OpenAlex,
            Item::SemanticScholar { .. } => Source::SemanticScholar,
        }
    }

    /// Every DOI this item carries, lowercased and trimmed, used as a
    /// cross-source dedup key (§4.8).
    pub fn doi_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        match self {
            Item::Biorxiv { payload, .. } => {
                if let Some(doi) = &payload.preprint_doi {
                    keys.push(doi.clone());
                }
            }
            Item::Pubmed { payload, .. } => {
                if let Some(doi) = &payload.doi {
                    keys.push(doi.clone());
                }
            }
            Item::OpenAlex { payload, .. } => {
                if let Some(doi) = &payload.doi {
                    keys.push(doi.clone());
                }
            }
            Item::SemanticScholar { payload, .. } => {
                if let Some(doi) = &payload.doi {
                    keys.push(doi.clone());
                }
            }
            Item::Arxiv { .. } | Item::HuggingFace { .. } => {}
        }
        if let Some(eng) = &self.header().engagement {
            if let Some(doi) = &eng.published_doi {
                keys.push(doi.clone());
            }
        }
        keys.into_iter()
            .map(|d| d.to_lowercase().trim().to_string())
            .filter(|d| !d.is_empty())
            .collect()
    }
}

/// `{ topic, range_from, range_to, generated_at, mode, per_source_items,
/// per_source_error, from_cache, cache_age_hours }`. §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSet {
    pub topic: String,
    pub range_from: NaiveDate,
    pub range_to: NaiveDate,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub mode: Depth,
    pub per_source_items: BTreeMap<String, Vec<Item>>,
    pub per_source_error: BTreeMap<String, Option<String>>,
    pub from_cache: bool,
    pub cache_age_hours: Option<f64>,
}
