pub mod client;
pub mod context;
pub mod formatter;
pub mod llm;
pub mod orchestrator;
pub mod passage;
pub mod prioritize;
pub mod prompt;
pub mod query_gen;
pub mod suggest;
pub mod weaviate;

pub use client::SearchProvider;
pub use context::{ContextSet, FollowupResult};
pub use formatter::ResponseFormatter;
pub use llm::ChatModel;
pub use orchestrator::{
    EnhancedRetriever, RetrievalConfig, RetrievalError, RetrievalOutcome, RetrievalTrace,
};
pub use passage::{Passage, PassageMetadata, QueryOrigin, RetrievalQuery};
pub use prioritize::Prioritizer;
pub use query_gen::QueryGenerator;
pub use suggest::{SuggestedQuestion, SuggestionEngine};
pub use weaviate::WeaviateSearch;
