//! Relevance scorer (C2).
//!
//! Ported field-for-field from `normalize.py::compute_keyword_relevance`:
//! deterministic, case-insensitive keyword overlap between a topic and a
//! candidate (title, abstract) pair.

use regex::Regex;
use std::sync::OnceLock;

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9]+").unwrap())
}

fn tokenize(text: &str) -> Vec<String> {
    word_re()
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Score a candidate `(title, abstract)` against `topic`.
///
/// Returns `(relevance, explanation)` where `relevance` is clamped to
/// `[0, 1]` and rounded to 3 decimals, and `explanation` is a
/// semicolon-joined list of the bonuses that fired.
pub fn compute_keyword_relevance(topic: &str, title: &str, abstract_text: &str) -> (f64, String) {
    let topic_words = tokenize(topic);
    if topic_words.is_empty() {
        return (0.0, String::new());
    }

    let title_lower = title.to_lowercase();
    let abstract_lower = abstract_text.to_lowercase();
    let topic_lower = topic.to_lowercase();

    let mut score = 0.0f64;
    let mut triggers: Vec<&str> = Vec::new();

    // Step 2: exact phrase.
    if title_lower.contains(&topic_lower) {
        score += 0.40;
        triggers.push("exact phrase in title");
    } else if abstract_lower.contains(&topic_lower) {
        score += 0.20;
        triggers.push("exact phrase in abstract");
    }

    // Step 3: word-level hit ratio.
    let n = topic_words.len() as f64;
    let title_word_hits = topic_words
        .iter()
        .filter(|w| title_lower.contains(w.as_str()))
        .count() as f64;
    let abstract_word_hits = topic_words
        .iter()
        .filter(|w| abstract_lower.contains(w.as_str()))
        .count() as f64;
    let word_component = 0.60 * (title_word_hits / n) + 0.30 * (abstract_word_hits / n);
    score += word_component;
    if word_component > 0.0 {
        triggers.push("word overlap");
    }

    // Step 4: bigram bonus, skipped for single-word topics.
    if topic_words.len() >= 2 {
        let bigrams: Vec<(String, String)> = topic_words
            .windows(2)
            .map(|w| (w[0].clone(), w[1].clone()))
            .collect();
        let denom = (topic_words.len() - 1) as f64;

        let title_bigram_hits = bigrams
            .iter()
            .filter(|(a, b)| title_lower.contains(&format!("{a} {b}")))
            .count() as f64;
        let abstract_bigram_hits = bigrams
            .iter()
            .filter(|(a, b)| abstract_lower.contains(&format!("{a} {b}")))
            .count() as f64;

        let title_bonus = 0.15 * (title_bigram_hits / denom);
        let abstract_bonus = 0.15 * (abstract_bigram_hits / denom) * 0.5;
        let bigram_bonus = title_bonus.max(abstract_bonus);
        if bigram_bonus > 0.0 {
            score += bigram_bonus;
            triggers.push("bigrams matched");
        }
    }

    // Step 5: all-words bonus.
    let all_in_title = topic_words.iter().all(|w| title_lower.contains(w.as_str()));
    let all_in_abstract = topic_words
        .iter()
        .all(|w| abstract_lower.contains(w.as_str()));
    if all_in_title {
        score += 0.10;
        triggers.push("all words in title");
    } else if all_in_abstract {
        score += 0.05;
        triggers.push("all words in abstract");
    }

    let clamped = score.clamp(0.0, 1.0);
    let rounded = (clamped * 1000.0).round() / 1000.0;
    (rounded, triggers.join("; "))
}
