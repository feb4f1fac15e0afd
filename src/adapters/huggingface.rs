//! Hugging Face Hub adapter.
//!
//! Three independent subresources are queried concurrently: models and
//! datasets support server-side search (`sort=likes&direction=-1`),
//! while daily papers has no search parameter and is filtered locally.
//! Grounded on `huggingface.py`'s `_search_models`/`_search_datasets`/
//! `_search_papers` split; date is `lastModified || createdAt` per the
//! same source.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::adapters::{AdapterOutcome, SourceAdapter};
use crate::config::{PipelineConfig, Source};
use crate::error::Result;
use crate::relevance::compute_keyword_relevance;
use crate::schema::{
    DateConfidence, Engagement, HuggingFaceItemType, HuggingFacePayload, Item, ItemHeader,
    SubScores, TopicQuery,
};
use crate::transport::Transport;

const API_BASE: &str = "https://huggingface.co/api";

pub struct HuggingFaceAdapter;

#[async_trait]
impl SourceAdapter for HuggingFaceAdapter {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    async fn search(
        &self,
        query: &TopicQuery,
        transport: &Transport,
        config: &PipelineConfig,
    ) -> AdapterOutcome {
        let cap = query.depth_cap(Source::HuggingFace);

        let (models, datasets, papers) = tokio::join!(
            fetch_subresource("models", &query.topic, cap, transport, config),
            fetch_subresource("datasets", &query.topic, cap, transport, config),
            fetch_daily_papers(transport, config),
        );

        let mut items = Vec::new();
        let mut errors = Vec::new();

        match models {
            Ok(raw) => extend_with_models(&mut items, raw, &query.topic, HuggingFaceItemType::Model),
            Err(e) => errors.push(format!("models: {e}")),
        }
        match datasets {
            Ok(raw) => extend_with_models(&mut items, raw, &query.topic, HuggingFaceItemType::Dataset),
            Err(e) => errors.push(format!("datasets: {e}")),
        }
        match papers {
            Ok(raw) => extend_with_papers(&mut items, raw, &query.topic),
            Err(e) => errors.push(format!("daily_papers: {e}")),
        }

        items.truncate(cap);

        if errors.is_empty() {
            AdapterOutcome::ok(items)
        } else {
            AdapterOutcome::failed(items, errors.join("; "))
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawModel {
    id: String,
    #[serde(default)]
    likes: u64,
    #[serde(default)]
    downloads: u64,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(rename = "lastModified", default)]
    last_modified: Option<String>,
    #[serde(rename = "createdAt", default)]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDailyPaper {
    paper: PaperInner,
    #[serde(rename = "publishedAt", default)]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaperInner {
    id: String,
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    authors: Vec<serde_json::Value>,
}

async fn fetch_subresource(
    kind: &str,
    topic: &str,
    limit: usize,
    transport: &Transport,
    config: &PipelineConfig,
) -> Result<Vec<RawModel>> {
    let url = format!(
        "{API_BASE}/{kind}?search={}&sort=likes&direction=-1&limit={limit}",
        urlencoding::encode(topic)
    );
    transport.get_json(&url, config.default_timeout).await
}

async fn fetch_daily_papers(transport: &Transport, config: &PipelineConfig) -> Result<Vec<RawDailyPaper>> {
    let url = format!("{API_BASE}/daily_papers");
    transport.get_json(&url, config.default_timeout).await
}

fn extend_with_models(
    items: &mut Vec<Item>,
    raw: Vec<RawModel>,
    topic: &str,
    item_type: HuggingFaceItemType,
) {
    for entry in raw {
        let tag_text = entry.tags.join(" ");
        let (relevance, why_relevant) = compute_keyword_relevance(topic, &entry.id, &tag_text);
        if relevance <= 0.1 {
            continue;
        }
        items.push(model_to_item(entry, item_type, relevance, why_relevant));
    }
}

fn extend_with_papers(items: &mut Vec<Item>, raw: Vec<RawDailyPaper>, topic: &str) {
    for entry in raw {
        let (relevance, why_relevant) =
            compute_keyword_relevance(topic, &entry.paper.title, &entry.paper.summary);
        if relevance <= 0.1 {
            continue;
        }
        items.push(paper_to_item(entry, relevance, why_relevant));
    }
}

fn model_to_item(
    entry: RawModel,
    item_type: HuggingFaceItemType,
    relevance: f64,
    why_relevant: String,
) -> Item {
    let kind_path = match item_type {
        HuggingFaceItemType::Dataset => "datasets/",
        _ => "",
    };
    let kind_tag = match item_type {
        HuggingFaceItemType::Model => "model",
        HuggingFaceItemType::Dataset => "dataset",
        HuggingFaceItemType::Paper => "paper",
    };

    let (date, date_confidence) = entry
        .last_modified
        .as_deref()
        .or(entry.created_at.as_deref())
        .map(parse_hf_date)
        .unwrap_or((None, DateConfidence::Low));

    let header = ItemHeader {
        id: format!("huggingface:{kind_tag}:{}", entry.id),
        title: entry.id.clone(),
        url: format!("https://huggingface.co/{kind_path}{}", entry.id),
        date,
        date_confidence,
        relevance,
        why_relevant,
        subs: SubScores::default(),
        score: 0,
        engagement: Some(Engagement {
            downloads: Some(entry.downloads),
            likes: Some(entry.likes),
            ..Default::default()
        }),
    };

    Item::HuggingFace {
        header,
        payload: HuggingFacePayload {
            hf_id: entry.id,
            item_type,
            tags: entry.tags,
        },
    }
}

fn paper_to_item(entry: RawDailyPaper, relevance: f64, why_relevant: String) -> Item {
    let (date, date_confidence) = entry
        .published_at
        .as_deref()
        .map(parse_hf_date)
        .unwrap_or((None, DateConfidence::Low));
    let author_count = if entry.paper.authors.is_empty() {
        None
    } else {
        Some(entry.paper.authors.len() as u32)
    };

    let header = ItemHeader {
        id: format!("huggingface:paper:{}", entry.paper.id),
        title: entry.paper.title.clone(),
        url: format!("https://huggingface.co/papers/{}", entry.paper.id),
        date,
        date_confidence,
        relevance,
        why_relevant,
        subs: SubScores::default(),
        score: 0,
        engagement: Some(Engagement {
            author_count,
            ..Default::default()
        }),
    };

    Item::HuggingFace {
        header,
        payload: HuggingFacePayload {
            hf_id: entry.paper.id,
            item_type: HuggingFaceItemType::Paper,
            tags: Vec::new(),
        },
    }
}

fn parse_hf_date(s: &str) -> (Option<NaiveDate>, DateConfidence) {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return (Some(dt.date_naive()), DateConfidence::High);
    }
    let date_part = s.split('T').next().unwrap_or(s);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(d) => (Some(d), DateConfidence::Medium),
        Err(_) => (None, DateConfidence::Low),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_to_item_carries_downloads_and_likes() {
        let model = RawModel {
            id: "acme/gene-editor".to_string(),
            likes: 42,
            downloads: 1000,
            tags: vec!["gene-editing".to_string(), "biology".to_string()],
            last_modified: Some("2026-06-01T00:00:00.000Z".to_string()),
            created_at: None,
        };
        let item = model_to_item(model, HuggingFaceItemType::Model, 0.5, "word overlap".to_string());
        assert_eq!(item.header().engagement.as_ref().unwrap().likes, Some(42));
        assert_eq!(item.header().date_confidence, DateConfidence::High);
        assert_eq!(item.header().url, "https://huggingface.co/acme/gene-editor");
    }

    #[test]
    fn dataset_url_includes_datasets_prefix() {
        let model = RawModel {
            id: "acme/genomes".to_string(),
            likes: 0,
            downloads: 0,
            tags: Vec::new(),
            last_modified: None,
            created_at: Some("2026-01-01T00:00:00.000Z".to_string()),
        };
        let item = model_to_item(model, HuggingFaceItemType::Dataset, 0.2, String::new());
        assert_eq!(item.header().url, "https://huggingface.co/datasets/acme/genomes");
    }

    #[test]
    fn paper_filtered_out_below_relevance_threshold() {
        let raw = vec![RawDailyPaper {
            paper: PaperInner {
                id: "1234.5678".to_string(),
                title: "A survey of unrelated birds".to_string(),
                summary: "Birds fly south.".to_string(),
                authors: Vec::new(),
            },
            published_at: Some("2026-06-01T00:00:00.000Z".to_string()),
        }];
        let mut items = Vec::new();
        extend_with_papers(&mut items, raw, "CRISPR gene editing");
        assert!(items.is_empty());
    }

    #[test]
    fn parse_hf_date_falls_back_to_date_only_string() {
        let (date, conf) = parse_hf_date("2026-06-01");
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 6, 1));
        assert_eq!(conf, DateConfidence::Medium);
    }
}
