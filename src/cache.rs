//! Cache contract (§6) — an external collaborator.
//!
//! Only the key derivation and the trait shape live in this crate; a
//! file-backed TTL cache is out of scope (§1) and is left to whatever
//! calls `pipeline::run`.

use sha2::{Digest, Sha256};

/// `get(key) -> (document, age_hours) | miss`, `put(key, document)`.
pub trait ReportCache {
    fn get(&self, key: &str) -> Option<(serde_json::Value, f64)>;
    fn put(&self, key: &str, document: &serde_json::Value);
}

/// First 16 hex chars of `SHA-256("{topic}|{from}|{to}|{sources}")`.
pub fn cache_key(topic: &str, from: &str, to: &str, sources: &str) -> String {
    let input = format!("{topic}|{from}|{to}|{sources}");
    let digest = Sha256::digest(input.as_bytes());
    let hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
    hex[..16].to_string()
}

/// Default TTL for cached reports.
pub const DEFAULT_TTL_HOURS: f64 = 24.0;

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[test]
    fn cache_key_is_16_hex_chars_and_deterministic() {
        let k1 = cache_key("CRISPR", "2026-06-27", "2026-07-27", "all");
        let k2 = cache_key("CRISPR", "2026-06-27", "2026-07-27", "all");
        assert_eq!(k1, k2);
        assert_eq!(k1.len(), 16);
        assert!(k1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn cache_key_differs_for_different_inputs() {
        let a = cache_key("CRISPR", "2026-06-27", "2026-07-27", "all");
        let b = cache_key("gene therapy", "2026-06-27", "2026-07-27", "all");
        assert_ne!(a, b);
    }

    struct InMemoryCache {
        store: RefCell<HashMap<String, serde_json::Value>>,
    }

    impl ReportCache for InMemoryCache {
        fn get(&self, key: &str) -> Option<(serde_json::Value, f64)> {
            self.store.borrow().get(key).cloned().map(|v| (v, 0.0))
        }
        fn put(&self, key: &str, document: &serde_json::Value) {
            self.store.borrow_mut().insert(key.to_string(), document.clone());
        }
    }

    #[test]
    fn report_cache_trait_round_trips() {
        let cache = InMemoryCache {
            store: RefCell::new(HashMap::new()),
        };
        let key = cache_key("topic", "from", "to", "all");
        assert!(cache.get(&key).is_none());
        cache.put(&key, &serde_json::json!({"hello": "world"}));
        let (doc, age) = cache.get(&key).unwrap();
        assert_eq!(doc["hello"], "world");
        assert_eq!(age, 0.0);
    }
}
