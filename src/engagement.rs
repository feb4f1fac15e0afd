//! Engagement scorer (C6).
//!
//! Ported field-for-field from `score.py`'s `compute_*_academic` family:
//! per-source base score plus bonuses, each capped at 100.

use crate::schema::Engagement;

fn log1p_safe(x: Option<u64>) -> f64 {
    match x {
        Some(v) => (v as f64).ln_1p(),
        None => 0.0,
    }
}

const ARXIV_POPULAR_CATEGORIES: &[&str] = &[
    "cs.AI", "cs.LG", "cs.CL", "cs.CV", "cs.NE", "stat.ML", "q-bio", "physics", "math",
];

pub fn arxiv_academic(engagement: Option<&Engagement>, primary_category: &str) -> i32 {
    let mut score = 30;
    if ARXIV_POPULAR_CATEGORIES
        .iter()
        .any(|cat| primary_category.starts_with(cat))
    {
        score += 10;
    }
    if let Some(eng) = engagement {
        if eng.author_count.map(|c| c >= 5).unwrap_or(false) {
            score += 10;
        }
    }
    score.min(100)
}

pub fn biorxiv_academic(engagement: Option<&Engagement>) -> i32 {
    let Some(eng) = engagement else {
        return 20;
    };
    let mut score = 20;
    if eng.published_doi.is_some() {
        score += 50;
    }
    if eng.author_count.map(|c| c >= 5).unwrap_or(false) {
        score += 10;
    }
    score.min(100)
}

pub fn pubmed_academic(engagement: Option<&Engagement>) -> i32 {
    let Some(eng) = engagement else {
        return 40;
    };
    let mut score = 40;
    if eng.published_journal.is_some() {
        score += 20;
    }
    if eng.citation_count.map(|c| c > 0).unwrap_or(false) {
        score += (log1p_safe(eng.citation_count) * 15.0) as i32;
    }
    score.min(100)
}

pub fn huggingface_academic(engagement: Option<&Engagement>) -> i32 {
    let Some(eng) = engagement else {
        return 10;
    };
    let mut score = 10;
    score += (log1p_safe(eng.downloads) * 8.0) as i32;
    score += (log1p_safe(eng.likes) * 12.0) as i32;
    score.min(100)
}

pub fn openalex_academic(engagement: Option<&Engagement>) -> i32 {
    let Some(eng) = engagement else {
        return 30;
    };
    let mut score = 30;
    if eng.published_journal.is_some() {
        score += 20;
    }
    if eng.citation_count.map(|c| c > 0).unwrap_or(false) {
        score += (log1p_safe(eng.citation_count) * 12.0) as i32;
    }
    if eng.author_count.map(|c| c >= 5).unwrap_or(false) {
        score += 10;
    }
    score.min(100)
}

/// Identical structure to `openalex_academic`, per §4.6.
pub fn semanticscholar_academic(engagement: Option<&Engagement>) -> i32 {
    openalex_academic(engagement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arxiv_base_score_with_no_signal() {
        assert_eq!(arxiv_academic(None, "econ.GN"), 30);
    }

    #[test]
    fn arxiv_popular_category_and_authors_bonus() {
        assert_eq!(
            arxiv_academic(
                Some(&Engagement {
                    author_count: Some(6),
                    ..Default::default()
                }),
                "cs.LG"
            ),
            50
        );
    }

    #[test]
    fn biorxiv_peer_reviewed_bonus() {
        let eng = Engagement {
            published_doi: Some("10.1038/x".to_string()),
            ..Default::default()
        };
        assert_eq!(biorxiv_academic(Some(&eng)), 70);
    }

    #[test]
    fn pubmed_citation_bonus_is_capped_at_100() {
        let eng = Engagement {
            published_journal: Some("Nature".to_string()),
            citation_count: Some(1_000_000),
            ..Default::default()
        };
        assert_eq!(pubmed_academic(Some(&eng)), 100);
    }

    #[test]
    fn huggingface_scales_with_downloads_and_likes() {
        let eng = Engagement {
            downloads: Some(1000),
            likes: Some(50),
            ..Default::default()
        };
        let score = huggingface_academic(Some(&eng));
        assert!(score > 10);
        assert!(score <= 100);
    }

    #[test]
    fn semanticscholar_matches_openalex_shape() {
        let eng = Engagement {
            published_journal: Some("venue".to_string()),
            citation_count: Some(10),
            author_count: Some(6),
            ..Default::default()
        };
        assert_eq!(semanticscholar_academic(Some(&eng)), openalex_academic(Some(&eng)));
    }
}
