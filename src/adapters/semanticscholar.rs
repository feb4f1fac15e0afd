//! Semantic Scholar adapter.
//!
//! Native query search (not the teacher's DOI-batch-lookup flow), up to
//! 3 pages of 100 via `publicationDateOrYear`. Uses the teacher's
//! `src/semanticscholar.rs` for struct/rename idioms and the optional
//! `x-api-key` header, but the search flow itself follows
//! `semanticscholar.py`: a stricter 0.3 relevance cutoff and the same
//! rank boost as OpenAlex.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::adapters::{AdapterOutcome, SourceAdapter};
use crate::config::{PipelineConfig, Source};
use crate::relevance::compute_keyword_relevance;
use crate::schema::{DateConfidence, Engagement, Item, ItemHeader, SemanticScholarPayload, SubScores, TopicQuery};
use crate::transport::{self, Transport};

const API_BASE: &str = "https://api.semanticscholar.org/graph/v1";
const PER_PAGE: usize = 100;
const MAX_PAGES: usize = 3;
const RELEVANCE_THRESHOLD: f64 = 0.3;
const FIELDS: &str = "title,abstract,url,venue,publicationDate,externalIds,citationCount,authors,publicationTypes";

pub struct SemanticScholarAdapter;

#[async_trait]
impl SourceAdapter for SemanticScholarAdapter {
    fn name(&self) -> &'static str {
        "semanticscholar"
    }

    async fn search(
        &self,
        query: &TopicQuery,
        transport: &Transport,
        config: &PipelineConfig,
    ) -> AdapterOutcome {
        let cap = query.depth_cap(Source::SemanticScholar);
        let headers = match &config.s2_api_key {
            Some(key) => transport::single_header("x-api-key", key),
            None => Default::default(),
        };

        let mut items = Vec::new();
        for page in 0..MAX_PAGES {
            if items.len() >= cap {
                break;
            }
            let offset = page * PER_PAGE;
            let url = build_url(&query.topic, query.from_date, query.to_date, offset);

            let response: SearchResponse = match transport
                .get_json_with_headers(&url, headers.clone(), config.default_timeout)
                .await
            {
                Ok(r) => r,
                Err(e) => return AdapterOutcome::failed(items, e.to_string()),
            };
            if response.data.is_empty() {
                break;
            }

            for (idx, paper) in response.data.into_iter().enumerate() {
                if items.len() >= cap {
                    break;
                }
                let rank = offset + idx;
                if let Some(item) = to_item(paper, &query.topic, rank, cap) {
                    items.push(item);
                }
            }
        }

        AdapterOutcome::ok(items)
    }
}

fn build_url(topic: &str, from: NaiveDate, to: NaiveDate, offset: usize) -> String {
    format!(
        "{API_BASE}/paper/search?query={}&publicationDateOrYear={}:{}&limit={PER_PAGE}&offset={offset}&fields={FIELDS}",
        urlencoding::encode(topic),
        from.format("%Y-%m-%d"),
        to.format("%Y-%m-%d"),
    )
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<RawPaper>,
}

#[derive(Debug, Deserialize)]
struct RawPaper {
    #[serde(rename = "paperId")]
    paper_id: Option<String>,
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    url: Option<String>,
    venue: Option<String>,
    #[serde(rename = "publicationDate")]
    publication_date: Option<String>,
    #[serde(rename = "externalIds")]
    external_ids: Option<RawExternalIds>,
    #[serde(rename = "citationCount")]
    citation_count: Option<u64>,
    authors: Option<Vec<serde_json::Value>>,
    #[serde(rename = "publicationTypes")]
    publication_types: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawExternalIds {
    #[serde(rename = "DOI")]
    doi: Option<String>,
}

fn to_item(paper: RawPaper, topic: &str, rank: usize, max_results: usize) -> Option<Item> {
    let title = paper.title?;
    let abstract_text = paper.abstract_text.unwrap_or_default();

    let (base_relevance, why_relevant) = compute_keyword_relevance(topic, &title, &abstract_text);
    let boost = rank_boost(rank, max_results);
    let relevance = (base_relevance + boost).clamp(0.0, 1.0);
    if relevance <= RELEVANCE_THRESHOLD {
        return None;
    }

    let paper_id = paper.paper_id.unwrap_or_default();
    let doi = paper.external_ids.and_then(|ids| ids.doi);
    let (date, date_confidence) = paper
        .publication_date
        .as_deref()
        .map(|d| match NaiveDate::parse_from_str(d, "%Y-%m-%d") {
            Ok(date) => (Some(date), DateConfidence::High),
            Err(_) => (None, DateConfidence::Low),
        })
        .unwrap_or((None, DateConfidence::Low));
    let venue = paper.venue.unwrap_or_default();
    let author_count = paper.authors.map(|a| a.len() as u32);

    let header = ItemHeader {
        id: format!("semanticscholar:{paper_id}"),
        title,
        url: paper
            .url
            .unwrap_or_else(|| format!("https://www.semanticscholar.org/paper/{paper_id}")),
        date,
        date_confidence,
        relevance,
        why_relevant,
        subs: SubScores::default(),
        score: 0,
        engagement: Some(Engagement {
            published_doi: doi.clone(),
            published_journal: if venue.is_empty() { None } else { Some(venue.clone()) },
            citation_count: paper.citation_count,
            author_count,
            ..Default::default()
        }),
    };

    Some(Item::SemanticScholar {
        header,
        payload: SemanticScholarPayload {
            paper_id,
            doi,
            venue,
            publication_types: paper.publication_types.unwrap_or_default(),
        },
    })
}

/// Identical shape to the OpenAlex boost (§4.3): `max(0, 0.1 * (1 -
/// rank/max_results))`, recomputed per page against `max_results` rather
/// than the running total, so it discontinues at page boundaries.
fn rank_boost(rank: usize, max_results: usize) -> f64 {
    if max_results == 0 {
        return 0.0;
    }
    (0.1 * (1.0 - (rank as f64 / max_results as f64))).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_paper() -> RawPaper {
        RawPaper {
            paper_id: Some("abc123".to_string()),
            title: Some("CRISPR gene editing in stem cells".to_string()),
            abstract_text: Some("We apply CRISPR to stem cells.".to_string()),
            url: None,
            venue: Some("Nature Genetics".to_string()),
            publication_date: Some("2026-05-01".to_string()),
            external_ids: Some(RawExternalIds {
                doi: Some("10.1038/abc".to_string()),
            }),
            citation_count: Some(12),
            authors: Some(vec![serde_json::json!({"name": "J. Doe"})]),
            publication_types: Some(vec!["JournalArticle".to_string()]),
        }
    }

    #[test]
    fn to_item_applies_stricter_threshold() {
        let paper = sample_paper();
        let item = to_item(paper, "CRISPR gene editing stem cells", 0, 100).unwrap();
        assert_eq!(item.header().date_confidence, DateConfidence::High);
        assert!(item.header().relevance > RELEVANCE_THRESHOLD);
    }

    #[test]
    fn low_relevance_paper_is_dropped_even_with_full_boost() {
        let mut paper = sample_paper();
        paper.title = Some("Unrelated study of sediment layers".to_string());
        paper.abstract_text = Some("Sediment layers form over millennia.".to_string());
        let item = to_item(paper, "CRISPR gene editing", 0, 100);
        assert!(item.is_none());
    }

    #[test]
    fn rank_boost_matches_openalex_formula() {
        assert!((rank_boost(0, 100) - 0.1).abs() < 1e-9);
        assert_eq!(rank_boost(100, 100), 0.0);
    }
}
