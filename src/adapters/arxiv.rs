//! arXiv adapter.
//!
//! Single-page Atom-feed search: `all:"{topic}"+AND+submittedDate:[F TO T]`,
//! sorted by submission date descending, `max_results` set directly to the
//! depth cap. Grounded on `arxiv.py`'s query construction and
//! `xml_parse.py::parse_arxiv_atom`'s field extraction; parsed via
//! `quick_xml::de` serde deserialization, the pattern used for Atom
//! feeds elsewhere in the pack (`antonio-leitao-bib`'s `parser::arxiv`).

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::adapters::{AdapterOutcome, SourceAdapter};
use crate::config::{PipelineConfig, Source};
use crate::relevance::compute_keyword_relevance;
use crate::schema::{ArxivPayload, DateConfidence, Engagement, Item, ItemHeader, SubScores, TopicQuery};
use crate::transport::Transport;

const API_BASE: &str = "http://export.arxiv.org/api/query";

#[derive(Debug, Default, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    id: String,
    title: String,
    #[serde(default)]
    summary: String,
    published: String,
    #[serde(rename = "author", default)]
    authors: Vec<RawAuthor>,
    #[serde(rename = "link", default)]
    links: Vec<RawLink>,
    #[serde(rename = "category", default)]
    categories: Vec<RawCategory>,
    #[serde(rename = "primary_category")]
    primary_category: Option<RawCategory>,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@type")]
    link_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    #[serde(rename = "@term")]
    term: String,
}

pub struct ArxivAdapter;

#[async_trait]
impl SourceAdapter for ArxivAdapter {
    fn name(&self) -> &'static str {
        "arxiv"
    }

    async fn search(
        &self,
        query: &TopicQuery,
        transport: &Transport,
        config: &PipelineConfig,
    ) -> AdapterOutcome {
        let cap = query.depth_cap(Source::Arxiv);
        let url = build_url(&query.topic, query.from_date, query.to_date, cap);

        let xml_text = match transport.get_text(&url, config.long_timeout).await {
            Ok(t) => t,
            Err(e) => return AdapterOutcome::failed(Vec::new(), e.to_string()),
        };

        let feed: Feed = match quick_xml::de::from_str(&xml_text) {
            Ok(f) => f,
            Err(e) => {
                return AdapterOutcome::failed(Vec::new(), format!("arxiv atom parse error: {e}"))
            }
        };

        let mut items = Vec::new();
        for entry in feed.entries {
            let (relevance, why_relevant) =
                compute_keyword_relevance(&query.topic, &entry.title, &entry.summary);
            if relevance <= 0.1 {
                continue;
            }
            items.push(to_item(entry, relevance, why_relevant));
            if items.len() >= cap {
                break;
            }
        }

        AdapterOutcome::ok(items)
    }
}

fn build_url(topic: &str, from: NaiveDate, to: NaiveDate, max_results: usize) -> String {
    let from_arxiv = format!("{}0000", from.format("%Y%m%d"));
    let to_arxiv = format!("{}2359", to.format("%Y%m%d"));

    let words: Vec<&str> = topic.split_whitespace().collect();
    let search_term = if words.len() > 1 {
        urlencoding::encode(&format!("\"{topic}\"")).into_owned()
    } else {
        urlencoding::encode(topic).into_owned()
    };

    let search_query = format!("all:{search_term}+AND+submittedDate:[{from_arxiv}+TO+{to_arxiv}]");

    format!(
        "{API_BASE}?search_query={search_query}&sortBy=submittedDate&sortOrder=descending&start=0&max_results={max_results}"
    )
}

fn to_item(entry: RawEntry, relevance: f64, why_relevant: String) -> Item {
    let arxiv_id = entry
        .id
        .trim()
        .split("/abs/")
        .last()
        .unwrap_or(entry.id.trim())
        .to_string();

    let link = entry
        .links
        .iter()
        .find(|l| l.link_type.as_deref() == Some("text/html"))
        .map(|l| l.href.clone())
        .unwrap_or_else(|| entry.id.trim().to_string());

    let categories: Vec<String> = entry.categories.iter().map(|c| c.term.clone()).collect();
    let primary_category = entry
        .primary_category
        .map(|c| c.term)
        .unwrap_or_default();

    let (date, date_confidence) = parse_published(entry.published.trim());
    let author_count = entry.authors.len() as u32;

    let header = ItemHeader {
        id: format!("arxiv:{arxiv_id}"),
        title: entry.title.trim().replace('\n', " "),
        url: link,
        date,
        date_confidence,
        relevance,
        why_relevant,
        subs: SubScores::default(),
        score: 0,
        engagement: Some(Engagement {
            author_count: Some(author_count),
            ..Default::default()
        }),
    };

    Item::Arxiv {
        header,
        payload: ArxivPayload {
            arxiv_id,
            categories,
            primary_category,
        },
    }
}

fn parse_published(published: &str) -> (Option<NaiveDate>, DateConfidence) {
    match chrono::DateTime::parse_from_rfc3339(published) {
        Ok(dt) => (Some(dt.date_naive()), DateConfidence::High),
        Err(_) => (None, DateConfidence::Low),
    }
}
