use anyhow::Result;
use async_trait::async_trait;

use crate::passage::Passage;

/// The document store, consumed purely as a search provider. Implementations
/// must be safe to call concurrently with independent query strings; the
/// orchestrator fans follow-up queries out over one shared instance.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Passage>>;
}
