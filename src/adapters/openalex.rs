//! OpenAlex adapter.
//!
//! Full-text search over `works`, paged sequentially so the rank boost
//! below can track a global rank across page boundaries. Before the
//! main search, a lightweight non-fatal call tries to resolve up to 3
//! topic IDs for the query and OR's them into the filter. Grounded on
//! the teacher's own `src/openalex.rs` (retry loop, abstract
//! reconstruction from the inverted index) reshaped to the per-page
//! relevance-filter-then-early-stop semantics of `openalex.py`.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

use crate::adapters::{AdapterOutcome, SourceAdapter};
use crate::config::{PipelineConfig, Source};
use crate::relevance::compute_keyword_relevance;
use crate::schema::{DateConfidence, Engagement, Item, ItemHeader, OpenAlexPayload, SubScores, TopicQuery};
use crate::transport::Transport;

const API_BASE: &str = "https://api.openalex.org";
const PER_PAGE: usize = 100;
const MAX_PAGES: usize = 5;
const TOPIC_AUGMENT_LIMIT: usize = 3;

pub struct OpenAlexAdapter;

#[async_trait]
impl SourceAdapter for OpenAlexAdapter {
    fn name(&self) -> &'static str {
        "openalex"
    }

    async fn search(
        &self,
        query: &TopicQuery,
        transport: &Transport,
        config: &PipelineConfig,
    ) -> AdapterOutcome {
        let cap = query.depth_cap(Source::OpenAlex);
        let topic_ids = discover_topic_ids(&query.topic, transport, config).await;

        let mut items = Vec::new();
        let pages_needed = MAX_PAGES.min((cap + PER_PAGE - 1) / PER_PAGE.max(1)).max(1);

        for page in 1..=pages_needed {
            let url = build_url(
                &query.topic,
                query.from_date,
                query.to_date,
                page,
                &topic_ids,
                &config.contact_email,
            );
            let response: WorksResponse = match transport.get_json(&url, config.default_timeout).await {
                Ok(r) => r,
                Err(e) => {
                    return AdapterOutcome::failed(items, e.to_string());
                }
            };
            if response.results.is_empty() {
                break;
            }

            for (idx, work) in response.results.into_iter().enumerate() {
                if items.len() >= cap {
                    break;
                }
                let rank = (page - 1) * PER_PAGE + idx;
                if let Some(item) = to_item(work, &query.topic, rank, cap) {
                    items.push(item);
                }
            }
            if items.len() >= cap {
                break;
            }
        }

        AdapterOutcome::ok(items)
    }
}

async fn discover_topic_ids(topic: &str, transport: &Transport, config: &PipelineConfig) -> Vec<String> {
    let url = format!(
        "{API_BASE}/topics?search={}&per_page={TOPIC_AUGMENT_LIMIT}",
        urlencoding::encode(topic)
    );
    match transport.get_json::<TopicsResponse>(&url, config.default_timeout).await {
        Ok(resp) => resp
            .results
            .into_iter()
            .filter_map(|t| t.id)
            .map(|id| local_id(&id))
            .collect(),
        Err(e) => {
            warn!(error = %e, "openalex: topic discovery failed, continuing without it");
            Vec::new()
        }
    }
}

fn build_url(
    topic: &str,
    from: NaiveDate,
    to: NaiveDate,
    page: usize,
    topic_ids: &[String],
    contact_email: &str,
) -> String {
    let mut filter = format!(
        "from_publication_date:{},to_publication_date:{}",
        from.format("%Y-%m-%d"),
        to.format("%Y-%m-%d"),
    );
    if !topic_ids.is_empty() {
        filter.push_str(&format!(",topics.id:{}", topic_ids.join("|")));
    }

    format!(
        "{API_BASE}/works?search={}&filter={}&sort=relevance_score:desc&per_page={PER_PAGE}&page={page}&mailto={}",
        urlencoding::encode(topic),
        urlencoding::encode(&filter),
        urlencoding::encode(contact_email),
    )
}

fn local_id(full_id: &str) -> String {
    full_id.rsplit('/').next().unwrap_or(full_id).to_string()
}

#[derive(Debug, Deserialize)]
struct TopicsResponse {
    #[serde(default)]
    results: Vec<RawTopic>,
}

#[derive(Debug, Deserialize)]
struct RawTopic {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorksResponse {
    #[serde(default)]
    results: Vec<RawWork>,
}

#[derive(Debug, Deserialize)]
struct RawWork {
    id: Option<String>,
    title: Option<String>,
    display_name: Option<String>,
    publication_date: Option<String>,
    doi: Option<String>,
    cited_by_count: Option<u64>,
    #[serde(rename = "abstract_inverted_index")]
    abstract_index: Option<serde_json::Value>,
    authorships: Option<Vec<serde_json::Value>>,
    primary_location: Option<RawLocation>,
    #[serde(rename = "type")]
    work_type: Option<String>,
    primary_topic: Option<RawTopicDetail>,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    source: Option<RawSource>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTopicDetail {
    display_name: Option<String>,
    score: Option<f64>,
}

fn to_item(work: RawWork, topic: &str, rank: usize, max_results: usize) -> Option<Item> {
    let title = work.display_name.or(work.title)?;
    let abstract_text = work
        .abstract_index
        .as_ref()
        .map(reconstruct_abstract)
        .unwrap_or_default();

    let (base_relevance, why_relevant) = compute_keyword_relevance(topic, &title, &abstract_text);
    let boost = rank_boost(rank, max_results);
    let relevance = (base_relevance + boost).clamp(0.0, 1.0);
    if relevance <= 0.1 {
        return None;
    }

    let openalex_id = work.id.map(|id| local_id(&id)).unwrap_or_default();
    let doi = work.doi.map(|d| d.replace("https://doi.org/", ""));
    let (date, date_confidence) = work
        .publication_date
        .as_deref()
        .map(|d| match NaiveDate::parse_from_str(d, "%Y-%m-%d") {
            Ok(date) => (Some(date), DateConfidence::High),
            Err(_) => (None, DateConfidence::Low),
        })
        .unwrap_or((None, DateConfidence::Low));

    let source_name = work
        .primary_location
        .and_then(|l| l.source)
        .and_then(|s| s.display_name)
        .unwrap_or_default();
    let author_count = work.authorships.map(|a| a.len() as u32);

    let header = ItemHeader {
        id: format!("openalex:{openalex_id}"),
        title,
        url: doi
            .as_ref()
            .map(|d| format!("https://doi.org/{d}"))
            .unwrap_or_else(|| format!("https://openalex.org/{openalex_id}")),
        date,
        date_confidence,
        relevance,
        why_relevant,
        subs: SubScores::default(),
        score: 0,
        engagement: Some(Engagement {
            published_doi: doi.clone(),
            published_journal: if source_name.is_empty() { None } else { Some(source_name.clone()) },
            citation_count: work.cited_by_count,
            author_count,
            ..Default::default()
        }),
    };

    Some(Item::OpenAlex {
        header,
        payload: OpenAlexPayload {
            openalex_id,
            doi,
            source_name,
            work_type: work.work_type.unwrap_or_default(),
            primary_topic_name: work.primary_topic.as_ref().and_then(|t| t.display_name.clone()),
            primary_topic_score: work.primary_topic.and_then(|t| t.score),
        },
    })
}

/// `max(0, 0.1 * (1 - rank/max_results))`, preserved verbatim including
/// the per-page discontinuity this produces at page boundaries.
fn rank_boost(rank: usize, max_results: usize) -> f64 {
    if max_results == 0 {
        return 0.0;
    }
    (0.1 * (1.0 - (rank as f64 / max_results as f64))).max(0.0)
}

fn reconstruct_abstract(inverted_index: &serde_json::Value) -> String {
    let Some(obj) = inverted_index.as_object() else {
        return String::new();
    };
    let mut words: Vec<(i64, &str)> = Vec::new();
    for (word, positions) in obj {
        if let Some(pos_array) = positions.as_array() {
            for pos in pos_array {
                if let Some(p) = pos.as_i64() {
                    words.push((p, word.as_str()));
                }
            }
        }
    }
    words.sort_by_key(|(pos, _)| *pos);
    words.iter().map(|(_, w)| *w).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconstructs_abstract_from_inverted_index() {
        let idx: serde_json::Value = serde_json::json!({
            "We": [0],
            "study": [1],
            "CRISPR": [2],
        });
        assert_eq!(reconstruct_abstract(&idx), "We study CRISPR");
    }

    #[test]
    fn rank_boost_decreases_with_rank() {
        let first = rank_boost(0, 100);
        let middle = rank_boost(50, 100);
        let last = rank_boost(99, 100);
        assert!(first > middle);
        assert!(middle > last);
        assert!(last >= 0.0);
    }

    #[test]
    fn rank_boost_never_negative_past_max_results() {
        assert_eq!(rank_boost(150, 100), 0.0);
    }

    #[test]
    fn local_id_strips_host_prefix() {
        assert_eq!(local_id("https://openalex.org/W123456"), "W123456");
        assert_eq!(local_id("https://openalex.org/T456"), "T456");
    }

    #[test]
    fn to_item_drops_below_threshold_even_with_boost() {
        let work = RawWork {
            id: Some("https://openalex.org/W1".to_string()),
            title: Some("Unrelated birds migration study".to_string()),
            display_name: None,
            publication_date: Some("2026-01-01".to_string()),
            doi: None,
            cited_by_count: None,
            abstract_index: None,
            authorships: None,
            primary_location: None,
            work_type: None,
            primary_topic: None,
        };
        let item = to_item(work, "CRISPR gene editing", 99, 100);
        assert!(item.is_none());
    }
}
