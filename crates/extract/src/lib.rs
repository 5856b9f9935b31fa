pub mod dictionary;
pub mod ner;
pub mod patterns;
pub mod schema;

pub use ner::NerClient;
pub use patterns::PatternSet;
pub use schema::{Entity, EntityType, SourceStrategy};

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Once;
use tracing::{debug, warn};
use vocab::{Language, Vocabulary};

/// Passage excerpts are capped at this many characters before extraction to
/// bound the cost per passage.
pub const EXCERPT_CAP: usize = 500;

const CONTEXT_WINDOW_CHARS: usize = 80;

static NER_UNAVAILABLE_LOGGED: Once = Once::new();

/// Multi-strategy entity extractor. Dictionary and pattern strategies always
/// run; the model-based strategy is an optional capability that degrades to
/// the other two when unreachable.
pub struct Extractor {
    vocab: Arc<Vocabulary>,
    patterns: PatternSet,
    ner: Option<NerClient>,
}

impl Extractor {
    pub fn new(vocab: Arc<Vocabulary>) -> Self {
        Self {
            vocab,
            patterns: PatternSet::new(),
            ner: None,
        }
    }

    pub fn with_ner(mut self, client: NerClient) -> Self {
        self.ner = Some(client);
        self
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocab
    }

    /// Extract typed entities from a text span. Never fails: malformed or
    /// empty input yields an empty list, and a broken NER endpoint only
    /// reduces recall.
    ///
    /// Output is deduplicated by canonical form (case-insensitive); when
    /// several strategies find the same entity the instance keeps the
    /// highest-precedence strategy.
    pub async fn extract(&self, text: &str, language_hint: Language) -> Vec<Entity> {
        let excerpt = cap_excerpt(text);
        if excerpt.trim().is_empty() {
            return Vec::new();
        }

        let mut found = dictionary::find_all(excerpt, &self.vocab);
        found.extend(self.patterns.find_all(excerpt));

        if let Some(ner) = &self.ner {
            match ner.recognize(excerpt, language_hint).await {
                Ok(spans) => found.extend(spans),
                Err(e) => {
                    // Reduced recall, not a failure of the extraction call.
                    NER_UNAVAILABLE_LOGGED.call_once(|| {
                        warn!(error = %e, "NER model unavailable, continuing with dictionary and pattern strategies");
                    });
                    debug!(error = %e, "NER strategy skipped");
                }
            }
        }

        merge_entities(found)
    }
}

/// Deduplicate entities by canonical form. The first occurrence keeps its
/// position; a later duplicate replaces the payload only when its strategy
/// has higher precedence. `appears_in_query` is OR-ed either way.
pub fn merge_entities(entities: Vec<Entity>) -> Vec<Entity> {
    let mut merged: Vec<Entity> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entity in entities {
        match index.get(&entity.dedup_key()) {
            Some(&pos) => {
                let existing = &mut merged[pos];
                existing.appears_in_query |= entity.appears_in_query;
                if entity.source_strategy.precedence() > existing.source_strategy.precedence() {
                    let appears = existing.appears_in_query;
                    *existing = entity;
                    existing.appears_in_query = appears;
                }
            }
            None => {
                index.insert(entity.dedup_key(), merged.len());
                merged.push(entity);
            }
        }
    }

    merged
}

/// Flag entities whose surface text occurs verbatim (case-insensitive on
/// ASCII) in the user's own question.
pub fn mark_query_presence(entities: &mut [Entity], question: &str) {
    let haystack = question.to_ascii_lowercase();
    for entity in entities {
        if haystack.contains(&entity.text.to_ascii_lowercase()) {
            entity.appears_in_query = true;
        }
    }
}

/// First `EXCERPT_CAP` characters of a text, cut on a char boundary.
fn cap_excerpt(text: &str) -> &str {
    match text.char_indices().nth(EXCERPT_CAP) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Text surrounding a byte range, expanded to the nearest char boundaries.
pub(crate) fn context_window(text: &str, start: usize, end: usize) -> String {
    let mut from = start.saturating_sub(CONTEXT_WINDOW_CHARS);
    while from > 0 && !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + CONTEXT_WINDOW_CHARS).min(text.len());
    while to < text.len() && !text.is_char_boundary(to) {
        to += 1;
    }
    text[from..to].to_string()
}
