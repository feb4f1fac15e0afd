//! Deduplicator (C8).
//!
//! Ported from `dedupe.py::dedupe_cross_source`/`dedupe_within_source`:
//! a DOI-exact pass followed by a Jaccard title-3-gram pass, both using a
//! `(source_priority asc, score desc)` comparator to pick a survivor.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use std::sync::OnceLock;

use crate::schema::Item;

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").unwrap())
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

pub fn normalize_text(text: &str) -> String {
    let lower = text.to_lowercase();
    let no_punct = non_word_re().replace_all(&lower, " ");
    whitespace_re().replace_all(&no_punct, " ").trim().to_string()
}

/// Character 3-grams of the normalized text.
pub fn get_ngrams(text: &str, n: usize) -> HashSet<String> {
    let normalized = normalize_text(text);
    let chars: Vec<char> = normalized.chars().collect();
    if chars.len() < n {
        return HashSet::from([normalized]);
    }
    (0..=chars.len() - n)
        .map(|i| chars[i..i + n].iter().collect())
        .collect()
}

pub fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// `(source_priority asc, score desc)` — lower tuple wins.
fn priority_key(item: &Item) -> (u8, i32) {
    (item.source().priority(), -item.header().score)
}

/// Remove duplicates across all sources: DOI pass, then title-similarity
/// pass over the survivors. §4.8.
pub fn dedupe_cross_source(items: Vec<Item>, threshold: f64) -> Vec<Item> {
    if items.len() <= 1 {
        return items;
    }

    let mut to_remove: HashSet<usize> = HashSet::new();

    // Pass 1: DOI-based exact dedup.
    let mut doi_map: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, item) in items.iter().enumerate() {
        for doi in item.doi_keys() {
            doi_map.entry(doi).or_default().push(idx);
        }
    }
    for indices in doi_map.values() {
        if indices.len() <= 1 {
            continue;
        }
        let best = *indices
            .iter()
            .min_by_key(|&&i| priority_key(&items[i]))
            .unwrap();
        for &idx in indices {
            if idx != best {
                to_remove.insert(idx);
            }
        }
    }

    // Pass 2: Jaccard title similarity over survivors.
    let remaining: Vec<usize> = (0..items.len()).filter(|i| !to_remove.contains(i)).collect();
    let ngrams: Vec<(usize, HashSet<String>)> = remaining
        .iter()
        .map(|&idx| (idx, get_ngrams(&items[idx].header().title, 3)))
        .collect();

    for i in 0..ngrams.len() {
        let (idx_i, ref grams_i) = ngrams[i];
        if to_remove.contains(&idx_i) {
            continue;
        }
        for j in (i + 1)..ngrams.len() {
            let (idx_j, ref grams_j) = ngrams[j];
            if to_remove.contains(&idx_j) {
                continue;
            }
            if jaccard_similarity(grams_i, grams_j) >= threshold {
                if priority_key(&items[idx_i]) <= priority_key(&items[idx_j]) {
                    to_remove.insert(idx_j);
                } else {
                    to_remove.insert(idx_i);
                }
            }
        }
    }

    items
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !to_remove.contains(idx))
        .map(|(_, item)| item)
        .collect()
}

/// Title-similarity pass restricted to a single source's items, keeping
/// the higher-scored item on collision.
pub fn dedupe_within_source(items: Vec<Item>, threshold: f64) -> Vec<Item> {
    if items.len() <= 1 {
        return items;
    }

    let ngrams: Vec<HashSet<String>> = items
        .iter()
        .map(|item| get_ngrams(&item.header().title, 3))
        .collect();
    let mut to_remove: HashSet<usize> = HashSet::new();

    for i in 0..items.len() {
        if to_remove.contains(&i) {
            continue;
        }
        for j in (i + 1)..items.len() {
            if to_remove.contains(&j) {
                continue;
            }
            if jaccard_similarity(&ngrams[i], &ngrams[j]) >= threshold {
                if items[i].header().score >= items[j].header().score {
                    to_remove.insert(j);
                } else {
                    to_remove.insert(i);
                }
            }
        }
    }

    items
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !to_remove.contains(idx))
        .map(|(_, item)| item)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        ArxivPayload, BiorxivPayload, DateConfidence, Engagement, ItemHeader, PreprintServer,
        PubmedPayload, SubScores,
    };

    fn header(id: &str, title: &str, score: i32) -> ItemHeader {
        ItemHeader {
            id: id.to_string(),
            title: title.to_string(),
            url: String::new(),
            date: None,
            date_confidence: DateConfidence::High,
            relevance: 0.5,
            why_relevant: String::new(),
            subs: SubScores::default(),
            score,
            engagement: None,
        }
    }

    #[test]
    fn cross_source_doi_dedup_keeps_higher_priority_source() {
        // Scenario 2: PubMed DOI 10.1038/xxx (score 60) vs bioRxiv item
        // whose engagement.published_doi is the same DOI (score 80) ->
        // only the PubMed item remains.
        let pubmed = Item::Pubmed {
            header: header("pubmed:1", "A Pubmed Title", 60),
            payload: PubmedPayload {
                pmid: "1".to_string(),
                journal: "J".to_string(),
                doi: Some("10.1038/xxx".to_string()),
                mesh_terms: vec![],
            },
        };
        let mut biorxiv_header = header("biorxiv:1", "A Different Title Entirely Unique", 80);
        biorxiv_header.engagement = Some(Engagement {
            published_doi: Some("10.1038/xxx".to_string()),
            ..Default::default()
        });
        let biorxiv = Item::Biorxiv {
            header: biorxiv_header,
            payload: BiorxivPayload {
                preprint_doi: Some("10.1101/yyy".to_string()),
                category: "genomics".to_string(),
                source: PreprintServer::Biorxiv,
            },
        };

        let result = dedupe_cross_source(vec![pubmed, biorxiv], 0.70);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].source(), crate::config::Source::Pubmed);
    }

    #[test]
    fn title_similarity_dedup_keeps_higher_priority_on_tie_break() {
        // Scenario 3: arXiv (score 80) vs bioRxiv (score 60), near-identical
        // titles -> bioRxiv survives (lower priority number wins).
        let arxiv = Item::Arxiv {
            header: header(
                "arxiv:1",
                "Deep Learning for CRISPR Guide RNA Design Optimization",
                80,
            ),
            payload: ArxivPayload {
                arxiv_id: "1".to_string(),
                categories: vec![],
                primary_category: "cs.LG".to_string(),
            },
        };
        let biorxiv = Item::Biorxiv {
            header: header(
                "biorxiv:1",
                "Deep Learning for CRISPR Guide RNA Design and Optimization",
                60,
            ),
            payload: BiorxivPayload {
                preprint_doi: None,
                category: "genomics".to_string(),
                source: PreprintServer::Biorxiv,
            },
        };

        let result = dedupe_cross_source(vec![arxiv, biorxiv], 0.70);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].source(), crate::config::Source::Biorxiv);
    }

    #[test]
    fn unrelated_titles_both_survive() {
        let a = Item::Arxiv {
            header: header("arxiv:1", "Quantum Computing Advances", 50),
            payload: ArxivPayload {
                arxiv_id: "1".to_string(),
                categories: vec![],
                primary_category: "cs.LG".to_string(),
            },
        };
        let b = Item::Arxiv {
            header: header("arxiv:2", "A Study of Migratory Birds", 50),
            payload: ArxivPayload {
                arxiv_id: "2".to_string(),
                categories: vec![],
                primary_category: "cs.LG".to_string(),
            },
        };
        let result = dedupe_cross_source(vec![a, b], 0.70);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn jaccard_similarity_identical_sets_is_one() {
        let a = get_ngrams("hello world", 3);
        let b = get_ngrams("hello world", 3);
        assert_eq!(jaccard_similarity(&a, &b), 1.0);
    }

    #[test]
    fn within_source_dedup_keeps_higher_score() {
        let a = Item::Arxiv {
            header: header("arxiv:1", "Graph Neural Networks for Molecules", 90),
            payload: ArxivPayload {
                arxiv_id: "1".to_string(),
                categories: vec![],
                primary_category: "cs.LG".to_string(),
            },
        };
        let b = Item::Arxiv {
            header: header("arxiv:2", "Graph Neural Networks for Molecule", 40),
            payload: ArxivPayload {
                arxiv_id: "2".to_string(),
                categories: vec![],
                primary_category: "cs.LG".to_string(),
            },
        };
        let result = dedupe_within_source(vec![a, b], 0.70);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].header().score, 90);
    }
}
