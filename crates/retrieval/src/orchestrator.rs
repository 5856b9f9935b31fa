use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use extract::{Extractor, mark_query_presence, merge_entities};
use vocab::Language;

use crate::client::SearchProvider;
use crate::context::{ContextSet, FollowupResult};
use crate::prioritize::{Prioritizer, top_k};
use crate::query_gen::QueryGenerator;

/// Bounds on the per-turn retrieval flow. The relative shape (small top-N,
/// small fan-out, per-call timeout) is the contract; the numbers are tuning.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// How many primary passages feed entity extraction.
    pub extract_top_n: usize,
    /// Follow-up fan-out cap (top-K entities after prioritization).
    pub max_followups: usize,
    /// Individual timeout per follow-up search.
    pub followup_timeout: Duration,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            extract_top_n: 3,
            max_followups: 5,
            followup_timeout: Duration::from_secs(10),
        }
    }
}

/// The only turn-fatal retrieval condition: without a primary result there
/// is no meaningful context to assemble. Everything else degrades in place.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("document store unavailable for primary search: {0}")]
    Unavailable(#[source] anyhow::Error),
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct RetrievalTrace {
    pub primary_passages: usize,
    pub entities_found: usize,
    pub entities_selected: usize,
    pub followups_dispatched: usize,
    pub followups_degraded: usize,
    pub context_size: usize,
}

pub struct RetrievalOutcome {
    pub context: ContextSet,
    pub trace: RetrievalTrace,
}

/// Drives one user turn end to end: primary search, entity extraction over
/// question and top passages, prioritization, concurrent follow-up searches,
/// and the merge into a deduplicated context set. Holds no cross-turn state
/// and is safe to call concurrently for independent turns.
pub struct EnhancedRetriever {
    client: Arc<dyn SearchProvider>,
    extractor: Extractor,
    prioritizer: Prioritizer,
    generator: QueryGenerator,
    config: RetrievalConfig,
}

impl EnhancedRetriever {
    pub fn new(
        client: Arc<dyn SearchProvider>,
        extractor: Extractor,
        config: RetrievalConfig,
    ) -> Self {
        let vocab = Arc::clone(extractor.vocabulary());
        Self {
            client,
            extractor,
            prioritizer: Prioritizer::new(Arc::clone(&vocab)),
            generator: QueryGenerator::new(vocab),
            config,
        }
    }

    pub async fn retrieve(
        &self,
        reformulated_query: &str,
        question: &str,
        language: Language,
    ) -> Result<RetrievalOutcome, RetrievalError> {
        // Primary search. Extraction cannot begin without its result.
        let primary = self
            .client
            .search(reformulated_query)
            .await
            .map_err(RetrievalError::Unavailable)?;
        let primary_count = primary.len();

        // Extract over the reformulated query and the top primary passages,
        // treated as one logical pass.
        let mut found = self.extractor.extract(reformulated_query, language).await;
        for passage in primary.iter().take(self.config.extract_top_n) {
            found.extend(self.extractor.extract(&passage.text, language).await);
        }
        let mut entities = merge_entities(found);
        mark_query_presence(&mut entities, question);
        let entities_found = entities.len();

        let ranked = self.prioritizer.prioritize(entities);
        let selected = top_k(ranked, self.config.max_followups);

        if selected.is_empty() {
            // Degenerate path: nothing to follow up on, the primary result
            // set is the context.
            debug!(primary = primary_count, "No entities extracted, skipping follow-up search");
            let context = ContextSet::from_primary(primary);
            let context_size = context.len();
            return Ok(RetrievalOutcome {
                context,
                trace: RetrievalTrace {
                    primary_passages: primary_count,
                    entities_found,
                    context_size,
                    ..Default::default()
                },
            });
        }

        // Fan-out: one concurrent search per selected entity. Each task owns
        // its own result slot; a timed-out or errored task contributes
        // nothing and does not disturb its siblings.
        let mut handles = Vec::with_capacity(selected.len());
        for entity in &selected {
            let query = self.generator.generate(entity);
            let client = Arc::clone(&self.client);
            let timeout = self.config.followup_timeout;
            let entity_score = entity.score;

            handles.push(tokio::spawn(async move {
                match tokio::time::timeout(timeout, client.search(&query.text)).await {
                    Ok(Ok(passages)) => Some(FollowupResult {
                        origin: query.origin,
                        entity_score,
                        passages,
                    }),
                    Ok(Err(e)) => {
                        warn!(query = %query.text, error = %e, "Follow-up search failed, dropping its results");
                        None
                    }
                    Err(_) => {
                        warn!(
                            query = %query.text,
                            timeout_ms = timeout.as_millis() as u64,
                            "Follow-up search timed out, dropping its results"
                        );
                        None
                    }
                }
            }));
        }

        let dispatched = handles.len();
        let mut followups = Vec::with_capacity(dispatched);
        let mut degraded = 0usize;
        for handle in handles {
            match handle.await {
                Ok(Some(result)) => followups.push(result),
                Ok(None) => degraded += 1,
                Err(e) => {
                    warn!(error = %e, "Follow-up task aborted");
                    degraded += 1;
                }
            }
        }

        // All fan-out tasks have completed or timed out; the merge itself is
        // single-threaded.
        let context = ContextSet::merge(primary, followups);

        let trace = RetrievalTrace {
            primary_passages: primary_count,
            entities_found,
            entities_selected: selected.len(),
            followups_dispatched: dispatched,
            followups_degraded: degraded,
            context_size: context.len(),
        };
        info!(
            primary = trace.primary_passages,
            entities = trace.entities_found,
            followups = trace.followups_dispatched,
            degraded = trace.followups_degraded,
            context = trace.context_size,
            "Enhanced retrieval completed"
        );

        Ok(RetrievalOutcome { context, trace })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passage::{Passage, PassageMetadata, QueryOrigin};
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use vocab::Vocabulary;

    fn passage(id: &str, text: &str, rank: usize) -> Passage {
        Passage::new(
            id.to_string(),
            text.to_string(),
            PassageMetadata::default(),
            rank,
        )
    }

    /// Returns canned passages per query substring; unknown queries get an
    /// empty result. Records every query it sees.
    struct MockProvider {
        canned: HashMap<&'static str, Vec<Passage>>,
        seen: Mutex<Vec<String>>,
        fail_primary: bool,
        slow_queries: Vec<&'static str>,
    }

    impl MockProvider {
        fn new(canned: HashMap<&'static str, Vec<Passage>>) -> Self {
            Self {
                canned,
                seen: Mutex::new(Vec::new()),
                fail_primary: false,
                slow_queries: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for MockProvider {
        async fn search(&self, query: &str) -> Result<Vec<Passage>> {
            self.seen.lock().unwrap().push(query.to_string());

            if self.fail_primary && self.seen.lock().unwrap().len() == 1 {
                return Err(anyhow!("connection refused"));
            }
            if self.slow_queries.iter().any(|s| query.contains(s)) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }

            for (needle, passages) in &self.canned {
                if query.to_lowercase().contains(&needle.to_lowercase()) {
                    return Ok(passages.clone());
                }
            }
            Ok(Vec::new())
        }
    }

    fn retriever(provider: MockProvider, config: RetrievalConfig) -> EnhancedRetriever {
        let vocab = Arc::new(Vocabulary::builtin());
        EnhancedRetriever::new(Arc::new(provider), Extractor::new(vocab), config)
    }

    #[tokio::test]
    async fn test_primary_failure_is_fatal() {
        let mut provider = MockProvider::new(HashMap::new());
        provider.fail_primary = true;
        let retriever = retriever(provider, RetrievalConfig::default());

        let result = retriever
            .retrieve("any query", "any question", Language::English)
            .await;
        assert!(matches!(result, Err(RetrievalError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_degenerate_path_returns_primary_unchanged() {
        let mut canned = HashMap::new();
        // Passages with no vocabulary terms, figures, or NER model in play.
        canned.insert(
            "generic",
            vec![
                passage("p1", "some unrelated prose", 0),
                passage("p2", "more unrelated prose", 1),
            ],
        );
        let retriever = retriever(MockProvider::new(canned), RetrievalConfig::default());

        let outcome = retriever
            .retrieve(
                "tell me about generic things",
                "tell me about generic things",
                Language::English,
            )
            .await
            .unwrap();

        assert_eq!(outcome.trace.followups_dispatched, 0);
        assert_eq!(outcome.trace.entities_selected, 0);
        let ids: Vec<_> = outcome
            .context
            .passages()
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_end_to_end_housing_scheme_scenario() {
        let mut canned = HashMap::new();
        canned.insert(
            "housing",
            vec![
                passage(
                    "prim-1",
                    "Under the PM housing scheme beneficiaries receive ₹1,20,000 in total.",
                    0,
                ),
                passage("prim-2", "The scheme targets rural families.", 1),
            ],
        );
        // Follow-up for the scheme name lands a new passage.
        canned.insert(
            "pradhan mantri awas yojana",
            vec![passage("fup-1", "Eligibility: families without a pucca house.", 0)],
        );
        // Follow-up for the amount returns an overlap plus a new passage.
        canned.insert(
            "₹1,20,000",
            vec![
                passage("prim-1", "Under the PM housing scheme beneficiaries receive ₹1,20,000 in total.", 0),
                passage("fup-2", "The amount is released in three installments.", 1),
            ],
        );

        let retriever = retriever(MockProvider::new(canned), RetrievalConfig::default());
        let question = "What is the amount under the PM housing scheme and who is eligible?";
        let outcome = retriever
            .retrieve(question, question, Language::English)
            .await
            .unwrap();

        assert!(outcome.trace.entities_found >= 2);
        assert!(outcome.trace.followups_dispatched >= 2);
        assert_eq!(outcome.trace.followups_degraded, 0);

        let ids: Vec<_> = outcome
            .context
            .passages()
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        // Primary passages first in rank order, net-new follow-up passages
        // after, each id exactly once.
        assert_eq!(ids[0], "prim-1");
        assert_eq!(ids[1], "prim-2");
        assert!(ids.contains(&"fup-1"));
        assert!(ids.contains(&"fup-2"));
        assert_eq!(
            ids.len(),
            ids.iter().collect::<std::collections::HashSet<_>>().len()
        );

        // prim-1 was returned by the primary search and one follow-up.
        let prim1 = &outcome.context.passages()[0];
        assert!(prim1.retrieved_by.contains(&QueryOrigin::Primary));
        assert!(prim1.retrieved_by.len() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_followups_are_dropped_within_one_timeout() {
        let mut canned = HashMap::new();
        canned.insert(
            "relief",
            vec![passage(
                "prim-1",
                "Flood relief: ration card holders get ₹5,000 compensation after application at the panchayat.",
                0,
            )],
        );
        // Needles that only occur in the generated follow-up queries (via
        // the bilingual pairing), never in the primary query.
        canned.insert("बाढ़", vec![passage("fup-flood", "flood relief details", 0)]);
        canned.insert("राशन कार्ड", vec![passage("fup-card", "card process", 0)]);

        let mut provider = MockProvider::new(canned);
        // The amount and compensation follow-ups hang past the timeout.
        provider.slow_queries = vec!["₹5,000", "compensation"];

        let config = RetrievalConfig {
            followup_timeout: Duration::from_secs(2),
            ..Default::default()
        };
        let retriever = retriever(provider, config);

        let started = tokio::time::Instant::now();
        let outcome = retriever
            .retrieve(
                "flood relief",
                "What relief is there for floods?",
                Language::English,
            )
            .await
            .unwrap();

        // Bounded wait: the per-call timeout, not the sum over slow calls.
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(outcome.trace.followups_degraded >= 1);

        let ids: Vec<_> = outcome
            .context
            .passages()
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert!(ids.contains(&"prim-1"));
        assert!(ids.contains(&"fup-flood"));
    }
}
