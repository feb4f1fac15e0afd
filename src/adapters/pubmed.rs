//! PubMed adapter.
//!
//! Two-step E-utilities flow: ESearch resolves a TIAB-tagged query to
//! PMIDs, EFetch retrieves abstracts in batches of 200. Grounded on
//! `pubmed.py` (query construction, rate limiting, batching) and
//! `xml_parse.py::parse_pubmed_efetch`/`_extract_pub_date` (mixed-content
//! extraction, `ArticleDate`-then-`JournalIssue/PubDate` fallback).

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use quick_xml::events::Event;
use serde::Deserialize;

use crate::adapters::xml_util::{attr_value, local_name};
use crate::adapters::{AdapterOutcome, SourceAdapter};
use crate::config::{PipelineConfig, Source};
use crate::relevance::compute_keyword_relevance;
use crate::schema::{DateConfidence, Engagement, Item, ItemHeader, PubmedPayload, SubScores, TopicQuery};
use crate::transport::Transport;

const ESEARCH_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
const EFETCH_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";
const EFETCH_BATCH_SIZE: usize = 200;
const RATE_LIMIT_NO_KEY: Duration = Duration::from_millis(340);
const RATE_LIMIT_WITH_KEY: Duration = Duration::from_millis(100);

const KNOWN_PHRASES: &[&str] = &[
    "machine learning",
    "deep learning",
    "gene editing",
    "gene therapy",
    "sickle cell",
    "stem cell",
    "clinical trial",
    "single cell",
    "genome wide",
    "public health",
    "mental health",
];

pub struct PubmedAdapter;

#[async_trait]
impl SourceAdapter for PubmedAdapter {
    fn name(&self) -> &'static str {
        "pubmed"
    }

    async fn search(
        &self,
        query: &TopicQuery,
        transport: &Transport,
        config: &PipelineConfig,
    ) -> AdapterOutcome {
        let cap = query.depth_cap(Source::Pubmed);
        let rate_delay = if config.ncbi_api_key.is_some() {
            RATE_LIMIT_WITH_KEY
        } else {
            RATE_LIMIT_NO_KEY
        };

        let pmids = match esearch(&query.topic, cap, config.ncbi_api_key.as_deref(), transport).await {
            Ok(p) => p,
            Err(e) => return AdapterOutcome::failed(Vec::new(), e.to_string()),
        };
        if pmids.is_empty() {
            return AdapterOutcome::ok(Vec::new());
        }

        tokio::time::sleep(rate_delay).await;

        let mut articles = Vec::new();
        let batches: Vec<&[String]> = pmids.chunks(EFETCH_BATCH_SIZE).collect();
        for (i, batch) in batches.iter().enumerate() {
            match efetch(batch, config.ncbi_api_key.as_deref(), transport, config).await {
                Ok(mut a) => articles.append(&mut a),
                Err(e) => return AdapterOutcome::failed(to_items(articles, &query.topic), e.to_string()),
            }
            if i + 1 < batches.len() {
                tokio::time::sleep(rate_delay).await;
            }
        }

        AdapterOutcome::ok(to_items(articles, &query.topic))
    }
}

fn build_query(topic: &str) -> String {
    let words: Vec<&str> = topic.split_whitespace().collect();
    if words.len() <= 1 || KNOWN_PHRASES.contains(&topic.to_lowercase().as_str()) {
        return format!("{topic}[TIAB]");
    }
    let and_part = words
        .iter()
        .map(|w| format!("{w}[TIAB]"))
        .collect::<Vec<_>>()
        .join(" AND ");
    format!("(\"{topic}\"[TIAB] OR ({and_part}))")
}

#[derive(Debug, Deserialize)]
struct EsearchResponse {
    esearchresult: EsearchResult,
}

#[derive(Debug, Deserialize, Default)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

async fn esearch(
    topic: &str,
    max_results: usize,
    api_key: Option<&str>,
    transport: &Transport,
) -> crate::error::Result<Vec<String>> {
    let query = build_query(topic);
    let encoded = urlencoding::encode(&query);
    let mut url = format!(
        "{ESEARCH_BASE}?db=pubmed&term={encoded}&reldate=30&datetype=pdat&retmax={max_results}&retmode=json"
    );
    if let Some(key) = api_key {
        url.push_str(&format!("&api_key={key}"));
    }

    let response: EsearchResponse = transport.get_json(&url, Duration::from_secs(30)).await?;
    Ok(response.esearchresult.idlist)
}

async fn efetch(
    pmids: &[String],
    api_key: Option<&str>,
    transport: &Transport,
    config: &PipelineConfig,
) -> crate::error::Result<Vec<PubmedArticle>> {
    let ids = pmids.join(",");
    let mut url =
        format!("{EFETCH_BASE}?db=pubmed&id={ids}&rettype=abstract&retmode=xml");
    if let Some(key) = api_key {
        url.push_str(&format!("&api_key={key}"));
    }

    let xml_text = transport.get_text(&url, config.long_timeout).await?;
    parse_efetch(&xml_text)
        .map_err(|e| crate::error::PipelineError::Parse(format!("pubmed efetch parse error: {e}")))
}

#[derive(Debug, Default, Clone)]
struct PubmedArticle {
    pmid: String,
    title: String,
    abstract_text: String,
    authors: Vec<String>,
    journal: String,
    doi: Option<String>,
    mesh_terms: Vec<String>,
    pub_date: Option<NaiveDate>,
    date_confidence: DateConfidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateCtx {
    None,
    ArticleDate,
    JournalPubDate,
}

fn parse_efetch(xml: &str) -> Result<Vec<PubmedArticle>, quick_xml::Error> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut articles = Vec::new();
    let mut current = PubmedArticle::default();
    let mut in_article_pubmed = false;

    let mut in_article_title = false;
    let mut title_text = String::new();

    let mut in_abstract_text = false;
    let mut abstract_label: Option<String> = None;
    let mut abstract_text = String::new();
    let mut abstract_parts: Vec<String> = Vec::new();

    let mut in_author = false;
    let mut current_last: Option<String> = None;
    let mut current_first: Option<String> = None;

    let mut in_journal = false;
    let mut in_journal_title = false;

    let mut in_article_id_list = false;
    let mut current_article_id_type: Option<String> = None;
    let mut article_id_text = String::new();

    let mut in_mesh_heading_list = false;
    let mut in_descriptor_name = false;
    let mut descriptor_text = String::new();

    let mut date_ctx = DateCtx::None;
    let mut date_year = String::new();
    let mut date_month = String::new();
    let mut date_day = String::new();
    let mut article_date_found = false;
    let mut journal_pub_date: Option<(NaiveDate, DateConfidence)> = None;

    let mut plain_text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = local_name(e.name().as_ref());
                match name.as_str() {
                    "PubmedArticle" => {
                        current = PubmedArticle::default();
                        in_article_pubmed = true;
                        article_date_found = false;
                        journal_pub_date = None;
                    }
                    "ArticleTitle" if in_article_pubmed => {
                        in_article_title = true;
                        title_text.clear();
                    }
                    "AbstractText" if in_article_pubmed => {
                        in_abstract_text = true;
                        abstract_label = attr_value(e, "Label");
                        abstract_text.clear();
                    }
                    "Author" if in_article_pubmed => {
                        in_author = true;
                        current_last = None;
                        current_first = None;
                    }
                    "Journal" if in_article_pubmed => in_journal = true,
                    "Title" if in_journal => in_journal_title = true,
                    "ArticleIdList" if in_article_pubmed => in_article_id_list = true,
                    "ArticleId" if in_article_id_list => {
                        current_article_id_type = attr_value(e, "IdType");
                        article_id_text.clear();
                    }
                    "MeshHeadingList" if in_article_pubmed => in_mesh_heading_list = true,
                    "DescriptorName" if in_mesh_heading_list => {
                        in_descriptor_name = true;
                        descriptor_text.clear();
                    }
                    "ArticleDate" if in_article_pubmed && !article_date_found => {
                        date_ctx = DateCtx::ArticleDate;
                        date_year.clear();
                        date_month.clear();
                        date_day.clear();
                    }
                    "PubDate" if in_journal && journal_pub_date.is_none() => {
                        date_ctx = DateCtx::JournalPubDate;
                        date_year.clear();
                        date_month.clear();
                        date_day.clear();
                    }
                    _ => {}
                }
                plain_text.clear();
            }
            Event::Text(e) => {
                let t = e.unescape().unwrap_or_default().into_owned();
                plain_text.push_str(&t);
                if in_article_title {
                    title_text.push_str(&t);
                }
                if in_abstract_text {
                    abstract_text.push_str(&t);
                }
                if in_article_id_list && current_article_id_type.is_some() {
                    article_id_text.push_str(&t);
                }
                if in_descriptor_name {
                    descriptor_text.push_str(&t);
                }
            }
            Event::End(ref e) => {
                let name = local_name(e.name().as_ref());
                match name.as_str() {
                    "ArticleTitle" => {
                        in_article_title = false;
                        current.title = title_text.trim().to_string();
                    }
                    "AbstractText" => {
                        in_abstract_text = false;
                        let text = abstract_text.trim().to_string();
                        if let Some(label) = abstract_label.take() {
                            if !label.is_empty() && !text.is_empty() {
                                abstract_parts.push(format!("{label}: {text}"));
                            } else if !text.is_empty() {
                                abstract_parts.push(text);
                            }
                        } else if !text.is_empty() {
                            abstract_parts.push(text);
                        }
                    }
                    "LastName" if in_author => current_last = Some(plain_text.trim().to_string()),
                    "ForeName" if in_author => current_first = Some(plain_text.trim().to_string()),
                    "Author" => {
                        in_author = false;
                        if let Some(last) = current_last.take() {
                            let name = match current_first.take() {
                                Some(first) if !first.is_empty() => {
                                    format!("{last} {}", &first[..1])
                                }
                                _ => last,
                            };
                            current.authors.push(name);
                        }
                    }
                    "Title" if in_journal_title => {
                        in_journal_title = false;
                        current.journal = plain_text.trim().to_string();
                    }
                    "Journal" => in_journal = false,
                    "ArticleId" => {
                        if current_article_id_type.as_deref() == Some("doi") {
                            let doi = article_id_text.trim().to_string();
                            if !doi.is_empty() {
                                current.doi = Some(doi);
                            }
                        }
                        current_article_id_type = None;
                    }
                    "ArticleIdList" => in_article_id_list = false,
                    "DescriptorName" => {
                        in_descriptor_name = false;
                        let text = descriptor_text.trim().to_string();
                        if !text.is_empty() {
                            current.mesh_terms.push(text);
                        }
                    }
                    "MeshHeadingList" => in_mesh_heading_list = false,
                    "Year" if date_ctx != DateCtx::None => date_year = plain_text.trim().to_string(),
                    "Month" if date_ctx != DateCtx::None => date_month = plain_text.trim().to_string(),
                    "Day" if date_ctx != DateCtx::None => date_day = plain_text.trim().to_string(),
                    "ArticleDate" if date_ctx == DateCtx::ArticleDate => {
                        if !date_year.is_empty() {
                            if let Some((date, conf)) = build_date(&date_year, &date_month, &date_day, false) {
                                current.pub_date = Some(date);
                                current.date_confidence = conf;
                                article_date_found = true;
                            }
                        }
                        date_ctx = DateCtx::None;
                    }
                    "PubDate" if date_ctx == DateCtx::JournalPubDate => {
                        if !date_year.is_empty() {
                            if let Some(parsed) = build_date(&date_year, &date_month, &date_day, true) {
                                journal_pub_date = Some(parsed);
                            }
                        }
                        date_ctx = DateCtx::None;
                    }
                    "PMID" if in_article_pubmed && current.pmid.is_empty() => {
                        current.pmid = plain_text.trim().to_string();
                    }
                    "PubmedArticle" => {
                        if current.pub_date.is_none() {
                            if let Some((date, conf)) = journal_pub_date.take() {
                                current.pub_date = Some(date);
                                current.date_confidence = conf;
                            }
                        }
                        current.abstract_text = abstract_parts.join(" ");
                        abstract_parts.clear();
                        articles.push(std::mem::take(&mut current));
                        in_article_pubmed = false;
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(articles)
}

/// Build a date from year/month/day text. `month_is_name` selects between
/// the numeric `ArticleDate` month and the name-or-abbreviation
/// `JournalIssue/PubDate` month.
fn build_date(
    year: &str,
    month: &str,
    day: &str,
    month_is_name: bool,
) -> Option<(NaiveDate, DateConfidence)> {
    let y: i32 = year.parse().ok()?;
    let has_month = !month.is_empty();
    let has_day = !day.is_empty();

    let m = if month.is_empty() {
        1
    } else if month_is_name {
        month_to_num(month)
    } else {
        month.parse().unwrap_or(1)
    };
    let d: u32 = if day.is_empty() { 1 } else { day.parse().unwrap_or(1) };

    let date = NaiveDate::from_ymd_opt(y, m, d)?;
    let confidence = crate::dates::confidence_for(has_day, has_month, true);
    Some((date, confidence))
}

fn month_to_num(month: &str) -> u32 {
    if let Ok(n) = month.parse::<u32>() {
        return n;
    }
    let lower = month.to_lowercase();
    let key = &lower[..lower.len().min(3)];
    match key {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => 1,
    }
}

fn to_items(articles: Vec<PubmedArticle>, topic: &str) -> Vec<Item> {
    articles
        .into_iter()
        .filter_map(|article| {
            let (relevance, why_relevant) =
                compute_keyword_relevance(topic, &article.title, &article.abstract_text);
            if relevance <= 0.1 {
                return None;
            }
            let author_count = article.authors.len() as u32;
            let header = ItemHeader {
                id: format!("pubmed:{}", article.pmid),
                title: article.title,
                url: format!("https://pubmed.ncbi.nlm.nih.gov/{}/", article.pmid),
                date: article.pub_date,
                date_confidence: article.date_confidence,
                relevance,
                why_relevant,
                subs: SubScores::default(),
                score: 0,
                engagement: Some(Engagement {
                    published_journal: if article.journal.is_empty() {
                        None
                    } else {
                        Some(article.journal.clone())
                    },
                    author_count: Some(author_count),
                    ..Default::default()
                }),
            };
            Some(Item::Pubmed {
                header,
                payload: PubmedPayload {
                    pmid: article.pmid,
                    journal: article.journal,
                    doi: article.doi,
                    mesh_terms: article.mesh_terms,
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_EFETCH: &str = r#"<?xml version="1.0"?>
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation>
      <PMID Version="1">12345678</PMID>
      <Article>
        <Journal>
          <Title>Nature Genetics</Title>
          <JournalIssue>
            <PubDate><Year>2026</Year><Month>Jun</Month></PubDate>
          </JournalIssue>
        </Journal>
        <ArticleTitle>CRISPR <i>in vivo</i> gene editing advances</ArticleTitle>
        <Abstract>
          <AbstractText Label="BACKGROUND">Gene editing has progressed.</AbstractText>
          <AbstractText Label="RESULTS">We show improved specificity.</AbstractText>
        </Abstract>
        <AuthorList>
          <Author><LastName>Smith</LastName><ForeName>Jane</ForeName></Author>
          <Author><LastName>Lee</LastName></Author>
        </AuthorList>
        <ArticleDate><Year>2026</Year><Month>06</Month><Day>15</Day></ArticleDate>
      </Article>
    </MedlineCitation>
    <PubmedData>
      <ArticleIdList>
        <ArticleId IdType="pubmed">12345678</ArticleId>
        <ArticleId IdType="doi">10.1038/xyz123</ArticleId>
      </ArticleIdList>
    </PubmedData>
  </PubmedArticle>
</PubmedArticleSet>"#;

    #[test]
    fn parses_article_fields() {
        let articles = parse_efetch(SAMPLE_EFETCH).unwrap();
        assert_eq!(articles.len(), 1);
        let a = &articles[0];
        assert_eq!(a.pmid, "12345678");
        assert_eq!(a.title, "CRISPR in vivo gene editing advances");
        assert!(a.abstract_text.contains("BACKGROUND: Gene editing"));
        assert!(a.abstract_text.contains("RESULTS: We show"));
        assert_eq!(a.authors, vec!["Smith J", "Lee"]);
        assert_eq!(a.journal, "Nature Genetics");
        assert_eq!(a.doi.as_deref(), Some("10.1038/xyz123"));
        assert_eq!(a.pub_date, NaiveDate::from_ymd_opt(2026, 6, 15));
        assert_eq!(a.date_confidence, DateConfidence::High);
    }

    #[test]
    fn query_single_word_uses_tiab_tag() {
        assert_eq!(build_query("crispr"), "crispr[TIAB]");
    }

    #[test]
    fn query_multi_word_combines_phrase_and_and_terms() {
        let q = build_query("gut microbiome diversity");
        assert!(q.starts_with("(\"gut microbiome diversity\"[TIAB] OR ("));
        assert!(q.contains("gut[TIAB] AND microbiome[TIAB] AND diversity[TIAB]"));
    }

    #[test]
    fn known_phrase_stays_as_tiab_unit() {
        assert_eq!(build_query("gene therapy"), "gene therapy[TIAB]");
    }

    #[test]
    fn month_name_falls_back_when_unrecognized() {
        assert_eq!(month_to_num("Foo"), 1);
        assert_eq!(month_to_num("Dec"), 12);
    }
}
