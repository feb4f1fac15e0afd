//! Composite scorer (C7).

use chrono::NaiveDate;

use crate::dates::recency_score;
use crate::engagement;
use crate::schema::{DateConfidence, Item, SubScores};

const PAPER_WEIGHT_RELEVANCE: f64 = 0.50;
const PAPER_WEIGHT_RECENCY: f64 = 0.25;
const PAPER_WEIGHT_ACADEMIC: f64 = 0.25;

const HF_WEIGHT_RELEVANCE: f64 = 0.45;
const HF_WEIGHT_RECENCY: f64 = 0.25;
const HF_WEIGHT_ACADEMIC: f64 = 0.30;

/// Compute and set `subs`/`score` on a single item in place, given the
/// reference date used for recency. §4.7.
pub fn score_item(item: &mut Item, today: NaiveDate) {
    let date = item.header().date;
    let relevance = item.header().relevance;
    let date_confidence = item.header().date_confidence;

    let rel100 = (relevance * 100.0) as i32;
    let recency = recency_score(date, today);

    let (academic, weights) = match item {
        Item::Arxiv { payload, .. } => (
            engagement::arxiv_academic(item_engagement(item), &payload.primary_category),
            (
                PAPER_WEIGHT_RELEVANCE,
                PAPER_WEIGHT_RECENCY,
                PAPER_WEIGHT_ACADEMIC,
            ),
        ),
        Item::Biorxiv { .. } => (
            engagement::biorxiv_academic(item_engagement(item)),
            (
                PAPER_WEIGHT_RELEVANCE,
                PAPER_WEIGHT_RECENCY,
                PAPER_WEIGHT_ACADEMIC,
            ),
        ),
        Item::Pubmed { .. } => (
            engagement::pubmed_academic(item_engagement(item)),
            (
                PAPER_WEIGHT_RELEVANCE,
                PAPER_WEIGHT_RECENCY,
                PAPER_WEIGHT_ACADEMIC,
            ),
        ),
        Item::HuggingFace { .. } => (
            engagement::huggingface_academic(item_engagement(item)),
            (HF_WEIGHT_RELEVANCE, HF_WEIGHT_RECENCY, HF_WEIGHT_ACADEMIC),
        ),
        Item::OpenAlex { .. } => (
            engagement::openalex_academic(item_engagement(item)),
            (
                PAPER_WEIGHT_RELEVANCE,
                PAPER_WEIGHT_RECENCY,
                PAPER_WEIGHT_ACADEMIC,
            ),
        ),
        Item::SemanticScholar { .. } => (
            engagement::semanticscholar_academic(item_engagement(item)),
            (
                PAPER_WEIGHT_RELEVANCE,
                PAPER_WEIGHT_RECENCY,
                PAPER_WEIGHT_ACADEMIC,
            ),
        ),
    };

    let (wr, wt, wa) = weights;
    let mut overall = wr * (rel100 as f64) + wt * (recency as f64) + wa * (academic as f64);
    if matches!(date_confidence, DateConfidence::Low) {
        overall -= 10.0;
    }
    let clamped = overall.round().clamp(0.0, 100.0) as i32;

    let header = item.header_mut();
    header.subs = SubScores {
        relevance: rel100.clamp(0, 100) as u32,
        recency,
        engagement: academic.clamp(0, 100) as u32,
    };
    header.score = clamped;
}

fn item_engagement(item: &Item) -> Option<&crate::schema::Engagement> {
    item.header().engagement.as_ref()
}

/// Score every item in place.
pub fn score_items(items: &mut [Item], today: NaiveDate) {
    for item in items.iter_mut() {
        score_item(item, today);
    }
}

/// Sort order used everywhere after scoring: `(-score, -date_as_int, title)`.
pub fn sort_items(items: &mut [Item]) {
    items.sort_by(|a, b| {
        let ha = a.header();
        let hb = b.header();
        let score_key = hb.score.cmp(&ha.score);
        if score_key != std::cmp::Ordering::Equal {
            return score_key;
        }
        let date_key_a = ha.date.map(|d| d.format("%Y%m%d").to_string());
        let date_key_b = hb.date.map(|d| d.format("%Y%m%d").to_string());
        // Missing dates sort as "0000-00-00" per the original scorer, i.e.
        // last among equal scores; represented here as the minimal key.
        let date_key_a = date_key_a.unwrap_or_else(|| "00000000".to_string());
        let date_key_b = date_key_b.unwrap_or_else(|| "00000000".to_string());
        let date_ord = date_key_b.cmp(&date_key_a);
        if date_ord != std::cmp::Ordering::Equal {
            return date_ord;
        }
        ha.title.cmp(&hb.title)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ArxivPayload, DateConfidence, Engagement, ItemHeader, SubScores};
    use chrono::NaiveDate;

    fn header(id: &str, date: Option<NaiveDate>, relevance: f64) -> ItemHeader {
        ItemHeader {
            id: id.to_string(),
            title: id.to_string(),
            url: String::new(),
            date,
            date_confidence: DateConfidence::High,
            relevance,
            why_relevant: String::new(),
            subs: SubScores::default(),
            score: 0,
            engagement: None,
        }
    }

    fn arxiv_item(id: &str, date: Option<NaiveDate>, relevance: f64) -> Item {
        Item::Arxiv {
            header: header(id, date, relevance),
            payload: ArxivPayload {
                arxiv_id: id.to_string(),
                categories: vec![],
                primary_category: "cs.LG".to_string(),
            },
        }
    }

    #[test]
    fn score_is_clamped_to_0_100() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let mut item = arxiv_item("a", Some(today), 1.0);
        score_item(&mut item, today);
        assert!(item.header().score >= 0 && item.header().score <= 100);
    }

    #[test]
    fn low_date_confidence_penalty_is_exactly_10() {
        // Scenario 6: two identical items differing only in date_confidence.
        let today = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let mut high = arxiv_item("a", Some(today), 0.8);
        let mut low = arxiv_item("b", Some(today), 0.8);
        low.header_mut().date_confidence = DateConfidence::Low;

        score_item(&mut high, today);
        score_item(&mut low, today);

        assert_eq!(high.header().score - low.header().score, 10);
    }

    #[test]
    fn sort_orders_by_score_then_date_then_title() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let old = today - chrono::Duration::days(10);
        let mut items = vec![
            arxiv_item("low score", Some(today), 0.1),
            arxiv_item("high score", Some(old), 0.9),
        ];
        score_items(&mut items, today);
        sort_items(&mut items);
        assert!(items[0].header().score >= items[1].header().score);
    }

    #[test]
    fn undated_rank_boosted_item_can_outrank_dated_lower_relevance_item() {
        // Open question (c): require_date=false lets undated items keep a
        // boosted relevance/score and sort on equal footing.
        let today = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let mut boosted_undated = arxiv_item("undated", None, 0.95);
        let mut dated_low_relevance = arxiv_item("dated", Some(today - chrono::Duration::days(5)), 0.2);

        score_item(&mut boosted_undated, today);
        score_item(&mut dated_low_relevance, today);

        assert!(boosted_undated.header().score > dated_low_relevance.header().score);
    }

    #[test]
    fn engagement_score_reflects_author_count_bonus() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let mut item = arxiv_item("a", Some(today), 0.5);
        item.header_mut().engagement = Some(Engagement {
            author_count: Some(10),
            ..Default::default()
        });
        score_item(&mut item, today);
        assert_eq!(item.header().subs.engagement, 50); // 30 base +10 cs.LG +10 authors
    }
}
