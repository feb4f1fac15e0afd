//! bioRxiv / medRxiv adapter.
//!
//! Both preprint servers share one details API, keyed by a `server`
//! path segment (`"biorxiv"` or `"medrxiv"`), and neither supports
//! server-side keyword search — every page is fetched wholesale and
//! filtered locally. Grounded on `biorxiv.py`: page 0 is fetched
//! sequentially to learn `messages[0].{total, count}`, then the
//! remaining cursors are fanned out over a worker pool (standing in for
//! the original's `ThreadPoolExecutor(5)`), capped at `MAX_PAGES`.

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Deserializer};

use crate::adapters::{AdapterOutcome, SourceAdapter};
use crate::config::{PipelineConfig, Source};
use crate::error::Result;
use crate::relevance::compute_keyword_relevance;
use crate::schema::{BiorxivPayload, DateConfidence, Engagement, Item, ItemHeader, PreprintServer, SubScores, TopicQuery};
use crate::transport::Transport;

const API_BASE: &str = "https://api.biorxiv.org/details";
const MAX_PAGES: usize = 30;

pub struct BiorxivAdapter {
    pub server: PreprintServer,
}

#[async_trait]
impl SourceAdapter for BiorxivAdapter {
    fn name(&self) -> &'static str {
        match self.server {
            PreprintServer::Biorxiv => "biorxiv",
            PreprintServer::Medrxiv => "medrxiv",
        }
    }

    async fn search(
        &self,
        query: &TopicQuery,
        transport: &Transport,
        config: &PipelineConfig,
    ) -> AdapterOutcome {
        let source = match self.server {
            PreprintServer::Biorxiv => Source::Biorxiv,
            PreprintServer::Medrxiv => Source::Medrxiv,
        };
        let cap = query.depth_cap(source);
        let server_name = self.name();

        let first = match fetch_page(server_name, query.from_date, query.to_date, 0, transport, config).await {
            Ok(p) => p,
            Err(e) => return AdapterOutcome::failed(Vec::new(), e.to_string()),
        };

        let mut items = Vec::new();
        collect_relevant(&first.collection, &query.topic, self.server, &mut items, cap);

        if items.len() < cap && first.count > 0 && first.total > first.count {
            let mut cursors = Vec::new();
            let mut cursor = first.count;
            let mut page = 1;
            while cursor < first.total && page < MAX_PAGES {
                cursors.push(cursor);
                cursor += first.count;
                page += 1;
            }

            let mut stream = stream::iter(cursors.into_iter().map(|cursor| {
                fetch_page(server_name, query.from_date, query.to_date, cursor, transport, config)
            }))
            .buffer_unordered(config.worker_pool_size);

            let mut error = None;
            while let Some(result) = stream.next().await {
                match result {
                    Ok(page) => {
                        collect_relevant(&page.collection, &query.topic, self.server, &mut items, cap);
                        if items.len() >= cap {
                            break;
                        }
                    }
                    Err(e) => {
                        error = Some(e.to_string());
                        break;
                    }
                }
            }

            if let Some(e) = error {
                items.truncate(cap);
                return AdapterOutcome::failed(items, e);
            }
        }

        items.truncate(cap);
        AdapterOutcome::ok(items)
    }
}

/// Either a JSON number or a numeric string, as bioRxiv's `messages`
/// block returns `total`/`count` inconsistently across endpoints.
#[derive(Debug, Default, Clone, Copy)]
struct FlexCount(usize);

impl<'de> Deserialize<'de> for FlexCount {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let n = match value {
            serde_json::Value::Number(n) => n.as_u64().unwrap_or(0) as usize,
            serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        };
        Ok(FlexCount(n))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    collection: Vec<RawItem>,
    #[serde(default)]
    messages: Vec<RawMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMessage {
    #[serde(default)]
    total: FlexCount,
    #[serde(default)]
    count: FlexCount,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    doi: String,
    title: String,
    #[serde(default)]
    authors: String,
    date: String,
    #[serde(default)]
    category: String,
    #[serde(rename = "abstract", default)]
    abstract_text: String,
    #[serde(default)]
    published: String,
}

struct Page {
    collection: Vec<RawItem>,
    total: usize,
    count: usize,
}

async fn fetch_page(
    server: &str,
    from: NaiveDate,
    to: NaiveDate,
    cursor: usize,
    transport: &Transport,
    config: &PipelineConfig,
) -> Result<Page> {
    let url = format!(
        "{API_BASE}/{server}/{}/{}/{cursor}/json",
        from.format("%Y-%m-%d"),
        to.format("%Y-%m-%d"),
    );
    let resp: ApiResponse = transport.get_json(&url, config.default_timeout).await?;
    let (total, count) = resp
        .messages
        .first()
        .map(|m| (m.total.0, m.count.0))
        .unwrap_or((0, 0));
    Ok(Page {
        collection: resp.collection,
        total,
        count,
    })
}

fn collect_relevant(
    raw: &[RawItem],
    topic: &str,
    server: PreprintServer,
    items: &mut Vec<Item>,
    cap: usize,
) {
    for entry in raw {
        if items.len() >= cap {
            break;
        }
        let (relevance, why_relevant) =
            compute_keyword_relevance(topic, &entry.title, &entry.abstract_text);
        if relevance <= 0.1 {
            continue;
        }
        items.push(to_item(entry, server, relevance, why_relevant));
    }
}

fn to_item(entry: &RawItem, server: PreprintServer, relevance: f64, why_relevant: String) -> Item {
    let (prefix, host) = match server {
        PreprintServer::Biorxiv => ("biorxiv", "www.biorxiv.org"),
        PreprintServer::Medrxiv => ("medrxiv", "www.medrxiv.org"),
    };

    let (date, date_confidence) = parse_date(&entry.date);
    let author_count = if entry.authors.trim().is_empty() {
        None
    } else {
        Some(entry.authors.split(';').filter(|a| !a.trim().is_empty()).count() as u32)
    };
    let published_doi = {
        let p = entry.published.trim();
        if p.is_empty() || p.eq_ignore_ascii_case("na") {
            None
        } else {
            Some(p.to_string())
        }
    };

    let header = ItemHeader {
        id: format!("{prefix}:{}", entry.doi),
        title: entry.title.trim().to_string(),
        url: format!("https://{host}/content/{}", entry.doi),
        date,
        date_confidence,
        relevance,
        why_relevant,
        subs: SubScores::default(),
        score: 0,
        engagement: Some(Engagement {
            published_doi,
            author_count,
            ..Default::default()
        }),
    };

    Item::Biorxiv {
        header,
        payload: BiorxivPayload {
            preprint_doi: Some(entry.doi.clone()),
            category: entry.category.clone(),
            source: server,
        },
    }
}

fn parse_date(s: &str) -> (Option<NaiveDate>, DateConfidence) {
    match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
        Ok(d) => (Some(d), DateConfidence::High),
        Err(_) => (None, DateConfidence::Low),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"{
        "collection": [
            {
                "doi": "10.1101/2026.06.01.000001",
                "title": "CRISPR screens reveal novel editing targets",
                "authors": "Doe, J.; Roe, J.",
                "date": "2026-06-01",
                "category": "genomics",
                "abstract": "We performed CRISPR screens across cell lines.",
                "published": "NA"
            }
        ],
        "messages": [
            { "total": "120", "count": "100" }
        ]
    }"#;

    #[test]
    fn parses_page_and_flex_counts() {
        let resp: ApiResponse = serde_json::from_str(SAMPLE_PAGE).unwrap();
        assert_eq!(resp.collection.len(), 1);
        assert_eq!(resp.messages[0].total.0, 120);
        assert_eq!(resp.messages[0].count.0, 100);
    }

    #[test]
    fn flex_count_accepts_numeric_json() {
        let v: FlexCount = serde_json::from_str("42").unwrap();
        assert_eq!(v.0, 42);
    }

    #[test]
    fn to_item_treats_na_published_as_unpublished() {
        let resp: ApiResponse = serde_json::from_str(SAMPLE_PAGE).unwrap();
        let item = to_item(&resp.collection[0], PreprintServer::Biorxiv, 0.4, "word overlap".to_string());
        assert!(item.header().engagement.as_ref().unwrap().published_doi.is_none());
        assert_eq!(item.header().date_confidence, DateConfidence::High);
        assert_eq!(
            item.header().engagement.as_ref().unwrap().author_count,
            Some(2)
        );
    }

    #[test]
    fn collect_relevant_filters_low_scores() {
        let entries = vec![RawItem {
            doi: "10.1101/x".to_string(),
            title: "Unrelated topic about birds".to_string(),
            authors: String::new(),
            date: "2026-01-01".to_string(),
            category: "zoology".to_string(),
            abstract_text: "Birds migrate.".to_string(),
            published: String::new(),
        }];
        let mut items = Vec::new();
        collect_relevant(&entries, "CRISPR gene editing", PreprintServer::Biorxiv, &mut items, 10);
        assert!(items.is_empty());
    }
}
