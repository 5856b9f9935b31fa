use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use vocab::Language;

use crate::schema::{Entity, EntityType, SourceStrategy};

/// Model-based strategy: an Ollama-style endpoint asked to return generic
/// PERSON / ORGANIZATION / LOCATION spans as JSON. Entirely optional; the
/// extractor runs without it.
#[derive(Clone)]
pub struct NerClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct NerOutput {
    entities: Vec<NerSpan>,
}

#[derive(Deserialize)]
struct NerSpan {
    text: String,
    #[serde(rename = "type")]
    span_type: String,
}

impl NerClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
        }
    }

    pub async fn recognize(&self, text: &str, language: Language) -> Result<Vec<Entity>> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: build_ner_prompt(text, language),
            stream: false,
            format: "json".to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send NER request")?;

        if !response.status().is_success() {
            anyhow::bail!("NER request failed: {}", response.status());
        }

        let generate_response: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse NER response envelope")?;

        let output: NerOutput = serde_json::from_str(&generate_response.response)
            .context("NER model returned invalid JSON")?;

        let mut entities = Vec::new();
        for span in output.entities {
            let trimmed = span.text.trim();
            if trimmed.is_empty() {
                continue;
            }
            let entity_type = match span.span_type.as_str() {
                "PERSON" => EntityType::Person,
                "ORGANIZATION" => EntityType::Organization,
                "LOCATION" => EntityType::Location,
                _ => EntityType::Generic,
            };
            entities.push(Entity::new(
                trimmed.to_string(),
                entity_type,
                trimmed.to_string(),
                SourceStrategy::Model,
                window_for_span(text, trimmed),
            ));
        }

        Ok(entities)
    }
}

/// Recover a context window for a model-reported span by locating it in the
/// excerpt. Spans the model hallucinated get an empty window.
fn window_for_span(text: &str, span: &str) -> String {
    let haystack = text.to_ascii_lowercase();
    match haystack.find(&span.to_ascii_lowercase()) {
        Some(start) => crate::context_window(text, start, start + span.len()),
        None => String::new(),
    }
}

fn build_ner_prompt(text: &str, language: Language) -> String {
    format!(
        r#"Extract named entities from the following text. The text may be in English or Hindi (language hint: {}).

INSTRUCTIONS:
1. Identify persons, organizations, and locations only
2. Output ONLY valid JSON, nothing else
3. Use the exact schema below

SCHEMA:
{{
  "entities": [
    {{"text": "surface string exactly as it appears", "type": "PERSON|ORGANIZATION|LOCATION"}}
  ]
}}

RULES:
- Copy each surface string verbatim from the text, original script included
- Do not invent entities that are not in the text
- An empty list is a valid answer

TEXT:
{}

JSON OUTPUT:"#,
        language.code(),
        text
    )
}
