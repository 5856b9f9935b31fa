use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::client::SearchProvider;
use crate::passage::{Passage, PassageMetadata};

/// Weaviate-backed search over the scheme-document chunk class, via the
/// GraphQL REST endpoint.
pub struct WeaviateSearch {
    base_url: String,
    class_name: String,
    limit: usize,
    client: reqwest::Client,
}

impl WeaviateSearch {
    pub fn new(base_url: String, class_name: String, limit: usize) -> Self {
        Self {
            base_url,
            class_name,
            limit,
            client: reqwest::Client::new(),
        }
    }

    fn build_graphql(&self, query: &str) -> Result<serde_json::Value> {
        // serde escapes the user text into a valid GraphQL string literal.
        let concepts = serde_json::to_string(query).context("Failed to escape query text")?;
        let gql = format!(
            "{{ Get {{ {class}(nearText: {{concepts: [{concepts}]}}, limit: {limit}) \
             {{ text source page language _additional {{ id }} }} }} }}",
            class = self.class_name,
            concepts = concepts,
            limit = self.limit,
        );
        Ok(serde_json::json!({ "query": gql }))
    }
}

#[async_trait]
impl SearchProvider for WeaviateSearch {
    async fn search(&self, query: &str) -> Result<Vec<Passage>> {
        let url = format!("{}/v1/graphql", self.base_url);
        let body = self.build_graphql(query)?;

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to send search request to Weaviate")?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Weaviate search failed: {}", error_text);
        }

        let result: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse Weaviate response")?;

        if let Some(errors) = result.get("errors") {
            anyhow::bail!("Weaviate GraphQL error: {}", errors);
        }

        let objects = result["data"]["Get"][&self.class_name]
            .as_array()
            .context("Invalid Weaviate response format")?;

        let mut passages = Vec::with_capacity(objects.len());
        for (rank, object) in objects.iter().enumerate() {
            let id = object["_additional"]["id"]
                .as_str()
                .unwrap_or("")
                .to_string();
            let text = object["text"].as_str().unwrap_or("").to_string();
            if id.is_empty() || text.is_empty() {
                continue;
            }

            let metadata = PassageMetadata {
                source: object["source"].as_str().unwrap_or("").to_string(),
                page: object["page"].as_u64().map(|p| p as u32),
                language: object["language"].as_str().map(|s| s.to_string()),
            };

            passages.push(Passage::new(id, text, metadata, rank));
        }

        Ok(passages)
    }
}
