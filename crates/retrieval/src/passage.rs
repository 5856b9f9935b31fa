use extract::EntityType;
use serde::{Deserialize, Serialize};

/// Where a passage came from within the document store.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PassageMetadata {
    pub source: String,
    pub page: Option<u32>,
    pub language: Option<String>,
}

/// A scored document passage returned by the store. `rank` is the position
/// within its own query's result list (lower is better); `retrieved_by`
/// records every query origin that returned it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub text: String,
    pub metadata: PassageMetadata,
    pub rank: usize,
    pub retrieved_by: Vec<QueryOrigin>,
}

impl Passage {
    pub fn new(id: String, text: String, metadata: PassageMetadata, rank: usize) -> Self {
        Self {
            id,
            text,
            metadata,
            rank,
            retrieved_by: Vec::new(),
        }
    }
}

/// Origin of a retrieval query: the reformulated user question, or a
/// follow-up generated from a prioritized entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryOrigin {
    Primary,
    Followup {
        entity_type: EntityType,
        canonical_form: String,
    },
}

/// A query string bound for the document store, tagged with its origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalQuery {
    pub text: String,
    pub origin: QueryOrigin,
}
