use std::collections::HashMap;

use crate::passage::{Passage, QueryOrigin};

/// Passages contributed by one completed follow-up search, tagged with the
/// priority score of the entity whose query retrieved them.
#[derive(Debug, Clone)]
pub struct FollowupResult {
    pub origin: QueryOrigin,
    pub entity_score: f32,
    pub passages: Vec<Passage>,
}

/// The final ordered, deduplicated collection of passages handed to answer
/// generation. Primary passages come first in their own rank order;
/// passages seen only in follow-up results are appended ordered by the
/// retrieving entity's priority, then by rank within that query.
#[derive(Debug, Clone, Default)]
pub struct ContextSet {
    passages: Vec<Passage>,
}

impl ContextSet {
    /// The degenerate path: no entities, so the context is exactly the
    /// primary result set.
    pub fn from_primary(primary: Vec<Passage>) -> Self {
        Self::merge(primary, Vec::new())
    }

    pub fn merge(mut primary: Vec<Passage>, mut followups: Vec<FollowupResult>) -> Self {
        primary.sort_by_key(|p| p.rank);

        let mut passages: Vec<Passage> = Vec::with_capacity(primary.len());
        let mut by_id: HashMap<String, usize> = HashMap::new();

        for mut passage in primary {
            if let Some(&pos) = by_id.get(&passage.id) {
                merge_origins(&mut passages[pos], QueryOrigin::Primary);
                continue;
            }
            merge_origins(&mut passage, QueryOrigin::Primary);
            by_id.insert(passage.id.clone(), passages.len());
            passages.push(passage);
        }

        // Stable sort: follow-ups arrive in entity-priority order already
        // and ties must keep that order.
        followups.sort_by(|a, b| {
            b.entity_score
                .partial_cmp(&a.entity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for followup in followups {
            let mut ranked = followup.passages;
            ranked.sort_by_key(|p| p.rank);

            for mut passage in ranked {
                if let Some(&pos) = by_id.get(&passage.id) {
                    merge_origins(&mut passages[pos], followup.origin.clone());
                    continue;
                }
                merge_origins(&mut passage, followup.origin.clone());
                by_id.insert(passage.id.clone(), passages.len());
                passages.push(passage);
            }
        }

        Self { passages }
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Render the set as numbered blocks for the answer-generation prompt.
    pub fn to_prompt_context(&self) -> String {
        let mut context = String::new();
        for (i, passage) in self.passages.iter().enumerate() {
            context.push_str(&format!(
                "[Passage {} | {}]\n{}\n\n",
                i + 1,
                passage.metadata.source,
                passage.text
            ));
        }
        context
    }
}

fn merge_origins(passage: &mut Passage, origin: QueryOrigin) {
    if !passage.retrieved_by.contains(&origin) {
        passage.retrieved_by.push(origin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passage::PassageMetadata;
    use extract::EntityType;

    fn passage(id: &str, rank: usize) -> Passage {
        Passage::new(
            id.to_string(),
            format!("text of {id}"),
            PassageMetadata::default(),
            rank,
        )
    }

    fn followup_origin(canonical: &str) -> QueryOrigin {
        QueryOrigin::Followup {
            entity_type: EntityType::SchemeName,
            canonical_form: canonical.to_string(),
        }
    }

    #[test]
    fn test_primary_order_preserved() {
        let set = ContextSet::from_primary(vec![passage("b", 1), passage("a", 0)]);

        let ids: Vec<_> = set.passages().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(set.passages()[0].retrieved_by, vec![QueryOrigin::Primary]);
    }

    #[test]
    fn test_each_id_appears_exactly_once() {
        let primary = vec![passage("a", 0), passage("b", 1)];
        let followups = vec![
            FollowupResult {
                origin: followup_origin("scheme one"),
                entity_score: 18.0,
                passages: vec![passage("b", 0), passage("c", 1)],
            },
            FollowupResult {
                origin: followup_origin("scheme two"),
                entity_score: 10.0,
                passages: vec![passage("c", 0), passage("a", 1)],
            },
        ];

        let set = ContextSet::merge(primary, followups);

        let ids: Vec<_> = set.passages().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        // "b" was returned by primary and one follow-up.
        let b = &set.passages()[1];
        assert_eq!(b.retrieved_by.len(), 2);
        assert!(b.retrieved_by.contains(&QueryOrigin::Primary));
    }

    #[test]
    fn test_followup_only_passages_ordered_by_entity_priority() {
        let primary = vec![passage("p", 0)];
        // Lower-priority follow-up listed first; merge must reorder.
        let followups = vec![
            FollowupResult {
                origin: followup_origin("low"),
                entity_score: 6.0,
                passages: vec![passage("low-1", 0)],
            },
            FollowupResult {
                origin: followup_origin("high"),
                entity_score: 18.0,
                passages: vec![passage("high-2", 1), passage("high-1", 0)],
            },
        ];

        let set = ContextSet::merge(primary, followups);

        let ids: Vec<_> = set.passages().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p", "high-1", "high-2", "low-1"]);
    }

    #[test]
    fn test_degenerate_path_equals_primary() {
        let primary = vec![passage("a", 0), passage("b", 1), passage("c", 2)];
        let set = ContextSet::from_primary(primary.clone());

        assert_eq!(set.len(), 3);
        for (got, want) in set.passages().iter().zip(primary.iter()) {
            assert_eq!(got.id, want.id);
        }
    }
}
