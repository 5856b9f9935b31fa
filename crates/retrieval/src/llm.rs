use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use vocab::Language;

use crate::prompt;

/// The language-model collaborator, consumed as a black box: it rewrites a
/// question into a standalone query given history, and generates the final
/// answer from assembled context. Ollama-style generate endpoint.
#[derive(Clone)]
pub struct ChatModel {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl ChatModel {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to chat model")?;

        if !response.status().is_success() {
            anyhow::bail!("Chat model request failed: {}", response.status());
        }

        let generate_response: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse chat model response")?;

        Ok(generate_response.response.trim().to_string())
    }

    /// Rewrite the question into a standalone search query, expanding key
    /// terms across both languages. The result is treated as an opaque
    /// string by the retrieval engine.
    pub async fn reformulate(&self, question: &str, history: &[(String, String)]) -> Result<String> {
        let reformulated = self
            .generate(&prompt::build_reformulation_prompt(question, history))
            .await?;
        // A model that returns nothing must not blank the search.
        if reformulated.is_empty() {
            Ok(question.to_string())
        } else {
            Ok(reformulated)
        }
    }

    /// Generate the final answer from the assembled context.
    pub async fn answer(
        &self,
        question: &str,
        context: &str,
        language: Language,
    ) -> Result<String> {
        self.generate(&prompt::build_answer_prompt(question, context, language))
            .await
    }

    /// Propose contextual follow-up questions for the latest turn. The model
    /// answers with a JSON object; anything else is an error the suggestion
    /// engine degrades past.
    pub async fn suggest_followups(
        &self,
        question: &str,
        answer: &str,
        history: &[(String, String)],
        language: Language,
    ) -> Result<Vec<String>> {
        let raw = self
            .generate(&prompt::build_suggestion_prompt(
                question, answer, history, language,
            ))
            .await?;

        let output: SuggestionOutput =
            serde_json::from_str(&raw).context("Suggestion model returned invalid JSON")?;

        Ok(output
            .questions
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect())
    }
}

#[derive(Deserialize)]
struct SuggestionOutput {
    questions: Vec<String>,
}
