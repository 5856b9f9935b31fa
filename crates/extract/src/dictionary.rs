use vocab::Vocabulary;

use crate::schema::{Entity, EntityType, SourceStrategy};

/// Dictionary strategy: scan the excerpt for vocabulary terms in either
/// language. A hit resolves to the entry's canonical form, so "वज्रपात" and
/// "lightning strike" produce the same entity.
///
/// Matching is case-insensitive on ASCII (Devanagari has no case) against
/// the raw excerpt, with word boundaries checked on both sides. Entries are
/// scanned in declaration order, so output order is deterministic.
pub fn find_all(text: &str, vocab: &Vocabulary) -> Vec<Entity> {
    if text.is_empty() {
        return Vec::new();
    }

    // ASCII-lowercasing keeps byte offsets identical to the original text.
    let haystack = text.to_ascii_lowercase();
    let mut entities = Vec::new();

    for entry in vocab.entries() {
        let mut best: Option<(usize, usize)> = None;

        for term in entry
            .english
            .iter()
            .chain(entry.hindi.iter())
        {
            let needle = term.to_ascii_lowercase();
            if needle.is_empty() {
                continue;
            }
            for (start, matched) in haystack.match_indices(&needle) {
                let end = start + matched.len();
                if !is_word_bounded(&haystack, start, end) {
                    continue;
                }
                // Report each entry once, at its first occurrence.
                if best.map(|(s, _)| start < s).unwrap_or(true) {
                    best = Some((start, end));
                }
            }
        }

        if let Some((start, end)) = best {
            entities.push(Entity::new(
                text[start..end].to_string(),
                EntityType::from_category(entry.category),
                entry.canonical.clone(),
                SourceStrategy::Dictionary,
                crate::context_window(text, start, end),
            ));
        }
    }

    entities
}

fn is_word_bounded(haystack: &str, start: usize, end: usize) -> bool {
    let before_ok = haystack[..start]
        .chars()
        .next_back()
        .map(|c| !c.is_alphanumeric())
        .unwrap_or(true);
    let after_ok = haystack[end..]
        .chars()
        .next()
        .map(|c| !c.is_alphanumeric())
        .unwrap_or(true);
    before_ok && after_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn vocab() -> Arc<Vocabulary> {
        Arc::new(Vocabulary::builtin())
    }

    #[test]
    fn test_english_and_hindi_resolve_to_same_canonical() {
        let vocab = vocab();

        let en = find_all("compensation for lightning strike victims", &vocab);
        let hi = find_all("वज्रपात पीड़ितों के लिए मुआवजा", &vocab);

        let en_disaster = en
            .iter()
            .find(|e| e.entity_type == EntityType::DisasterType)
            .unwrap();
        let hi_disaster = hi
            .iter()
            .find(|e| e.entity_type == EntityType::DisasterType)
            .unwrap();

        assert_eq!(en_disaster.canonical_form, "lightning strike");
        assert_eq!(hi_disaster.canonical_form, "lightning strike");
        assert_eq!(en_disaster.text, "lightning strike");
        assert_eq!(hi_disaster.text, "वज्रपात");
    }

    #[test]
    fn test_case_insensitive_match() {
        let vocab = vocab();
        let found = find_all("Do I need a Ration Card for this?", &vocab);

        let card = found
            .iter()
            .find(|e| e.canonical_form == "ration card")
            .unwrap();
        assert_eq!(card.text, "Ration Card");
        assert_eq!(card.source_strategy, SourceStrategy::Dictionary);
    }

    #[test]
    fn test_word_boundaries_respected() {
        let vocab = vocab();
        // "aag" (fire) must not match inside another word.
        let found = find_all("the haagworth family", &vocab);
        assert!(!found.iter().any(|e| e.canonical_form == "fire"));
    }

    #[test]
    fn test_scheme_alias_match() {
        let vocab = vocab();
        let found = find_all("amount under the PM housing scheme", &vocab);

        let scheme = found
            .iter()
            .find(|e| e.entity_type == EntityType::SchemeName)
            .unwrap();
        assert_eq!(scheme.canonical_form, "pradhan mantri awas yojana");
        assert_eq!(scheme.text, "PM housing scheme");
    }

    #[test]
    fn test_entry_reported_once_at_first_occurrence() {
        let vocab = vocab();
        let found = find_all("eligibility rules and eligibility forms", &vocab);

        let hits: Vec<_> = found
            .iter()
            .filter(|e| e.canonical_form == "eligibility")
            .collect();
        assert_eq!(hits.len(), 1);
    }
}
