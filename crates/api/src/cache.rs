use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Caches query reformulations keyed on the question plus conversation
/// history. Repeated questions in the same conversational position skip a
/// model round-trip; final answers are never cached because the document
/// store contents may change between turns.
pub struct ReformulationCache {
    entries: DashMap<String, String>,
    max_entries: usize,
    enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub reformulations_cached: usize,
}

impl ReformulationCache {
    pub fn new(max_entries: usize, enabled: bool) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
            enabled,
        }
    }

    pub fn get(&self, question: &str, history: &[(String, String)]) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let key = self.hash_key(question, history);
        self.entries.get(&key).map(|r| r.value().clone())
    }

    pub fn set(&self, question: &str, history: &[(String, String)], reformulated: String) {
        if !self.enabled {
            return;
        }
        if self.entries.len() >= self.max_entries {
            // Simple eviction: drop 25% when full
            let to_remove: Vec<_> = self
                .entries
                .iter()
                .take(self.max_entries / 4)
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.entries.remove(&key);
            }
        }
        let key = self.hash_key(question, history);
        self.entries.insert(key, reformulated);
    }

    fn hash_key(&self, question: &str, history: &[(String, String)]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(question.as_bytes());
        for (asked, answered) in history {
            hasher.update([0u8]);
            hasher.update(asked.as_bytes());
            hasher.update([0u8]);
            hasher.update(answered.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.enabled,
            reformulations_cached: self.entries.len(),
        }
    }
}
