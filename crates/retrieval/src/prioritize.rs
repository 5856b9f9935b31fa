use std::sync::Arc;

use extract::{Entity, EntityType};
use vocab::{Vocabulary, normalize_term};

// Figures and scheme names drive the most useful follow-up searches; the
// generic NER types the least. Only the relative ordering is contractual.
const BASE_HIGH: f32 = 10.0;
const BASE_MEDIUM: f32 = 6.0;
const BASE_LOW: f32 = 2.0;

// Large enough that an entity from the user's own words always outranks a
// passage-only entity of equal base weight, whatever the procedural bonus.
const QUERY_PRESENCE_BONUS: f32 = 8.0;
const PROCEDURAL_CONTEXT_BONUS: f32 = 3.0;

/// Scores extracted entities and orders them by retrieval worthiness.
/// Deterministic: additive scoring plus a stable sort, so ties keep their
/// extraction order.
pub struct Prioritizer {
    vocab: Arc<Vocabulary>,
}

impl Prioritizer {
    pub fn new(vocab: Arc<Vocabulary>) -> Self {
        Self { vocab }
    }

    pub fn prioritize(&self, mut entities: Vec<Entity>) -> Vec<Entity> {
        for entity in &mut entities {
            entity.score = self.score(entity);
        }
        // sort_by is stable; equal scores keep extraction order.
        entities.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        entities
    }

    fn score(&self, entity: &Entity) -> f32 {
        let mut score = base_weight(entity.entity_type);

        if entity.appears_in_query {
            score += QUERY_PRESENCE_BONUS;
        }
        if self.has_procedural_context(entity) {
            score += PROCEDURAL_CONTEXT_BONUS;
        }

        score
    }

    /// Whether the text surrounding the entity mentions eligibility,
    /// application or documentation vocabulary in either language.
    fn has_procedural_context(&self, entity: &Entity) -> bool {
        if entity.context_window.is_empty() {
            return false;
        }
        let window = format!(" {} ", normalize_term(&entity.context_window));
        self.vocab
            .procedural_terms()
            .iter()
            .any(|term| window.contains(&format!(" {} ", term)))
    }
}

fn base_weight(entity_type: EntityType) -> f32 {
    match entity_type {
        EntityType::MonetaryAmount
        | EntityType::Percentage
        | EntityType::Installment
        | EntityType::SchemeName => BASE_HIGH,
        EntityType::BeneficiaryCategory
        | EntityType::DocumentType
        | EntityType::AuthorityOffice
        | EntityType::DisasterType
        | EntityType::ProcessTerm => BASE_MEDIUM,
        EntityType::Location
        | EntityType::Organization
        | EntityType::Person
        | EntityType::Generic => BASE_LOW,
    }
}

/// Cap the follow-up fan-out to the K most retrieval-worthy entities.
pub fn top_k(entities: Vec<Entity>, k: usize) -> Vec<Entity> {
    entities.into_iter().take(k).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::SourceStrategy;

    fn entity(text: &str, entity_type: EntityType) -> Entity {
        Entity::new(
            text.to_string(),
            entity_type,
            text.to_string(),
            SourceStrategy::Dictionary,
            String::new(),
        )
    }

    fn prioritizer() -> Prioritizer {
        Prioritizer::new(Arc::new(Vocabulary::builtin()))
    }

    #[test]
    fn test_query_presence_outranks_equal_base() {
        let mut in_query = entity("₹6,000", EntityType::MonetaryAmount);
        in_query.appears_in_query = true;
        let mut passage_only = entity("₹2,000", EntityType::MonetaryAmount);
        // Even a procedural context on the passage-only entity cannot
        // overcome the query-presence bonus.
        passage_only.context_window = "eligibility for ₹2,000 relief".to_string();

        let ranked = prioritizer().prioritize(vec![passage_only, in_query]);

        assert_eq!(ranked[0].text, "₹6,000");
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn test_type_tiers_hold() {
        let ranked = prioritizer().prioritize(vec![
            entity("Ranchi", EntityType::Location),
            entity("ration card", EntityType::DocumentType),
            entity("pm kisan", EntityType::SchemeName),
        ]);

        assert_eq!(ranked[0].entity_type, EntityType::SchemeName);
        assert_eq!(ranked[1].entity_type, EntityType::DocumentType);
        assert_eq!(ranked[2].entity_type, EntityType::Location);
    }

    #[test]
    fn test_procedural_context_bonus() {
        let mut with_context = entity("ration card", EntityType::DocumentType);
        with_context.context_window = "आवेदन के लिए राशन कार्ड जरूरी है".to_string();
        let without_context = entity("bank passbook", EntityType::DocumentType);

        let ranked = prioritizer().prioritize(vec![without_context, with_context]);

        assert_eq!(ranked[0].text, "ration card");
        assert_eq!(ranked[0].score, BASE_MEDIUM + PROCEDURAL_CONTEXT_BONUS);
    }

    #[test]
    fn test_ties_keep_extraction_order() {
        let ranked = prioritizer().prioritize(vec![
            entity("first", EntityType::Generic),
            entity("second", EntityType::Generic),
            entity("third", EntityType::Generic),
        ]);

        let texts: Vec<_> = ranked.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_prioritize_is_deterministic() {
        let make = || {
            vec![
                entity("a", EntityType::SchemeName),
                entity("b", EntityType::MonetaryAmount),
                entity("c", EntityType::Location),
            ]
        };
        let p = prioritizer();

        let one: Vec<_> = p.prioritize(make()).iter().map(|e| e.text.clone()).collect();
        let two: Vec<_> = p.prioritize(make()).iter().map(|e| e.text.clone()).collect();
        assert_eq!(one, two);
    }

    #[test]
    fn test_top_k_caps_fanout() {
        let entities: Vec<_> = (0..10)
            .map(|i| entity(&format!("e{i}"), EntityType::SchemeName))
            .collect();
        assert_eq!(top_k(entities, 5).len(), 5);
    }
}
