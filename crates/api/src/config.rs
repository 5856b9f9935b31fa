use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub bind_addr: String,
    pub weaviate: WeaviateConfig,
    pub chat_model: ChatModelConfig,
    pub ner: NerConfig,
    pub retrieval: RetrievalTuning,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaviateConfig {
    pub url: String,
    pub class_name: String,
    pub results_per_query: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatModelConfig {
    pub url: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NerConfig {
    pub enabled: bool,
    pub url: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalTuning {
    pub extract_top_n: usize,
    pub max_followups: usize,
    pub followup_timeout_secs: u64,
    pub turn_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            weaviate: WeaviateConfig {
                url: "http://localhost:8080".to_string(),
                class_name: "SchemeDocumentChunk".to_string(),
                results_per_query: 3,
            },
            chat_model: ChatModelConfig {
                url: "http://localhost:11434".to_string(),
                model: "llama3".to_string(),
            },
            ner: NerConfig {
                enabled: false,
                url: "http://localhost:11434".to_string(),
                model: "llama3".to_string(),
            },
            retrieval: RetrievalTuning {
                extract_top_n: 3,
                max_followups: 5,
                followup_timeout_secs: 10,
                turn_timeout_secs: 120,
            },
            retry: RetryConfig {
                max_retries: 3,
                initial_backoff_ms: 1000,
                max_backoff_ms: 10000,
            },
            cache: CacheConfig {
                enabled: true,
                max_entries: 10000,
            },
        }
    }
}

impl AppConfig {
    /// Defaults overridden by environment variables where set.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(url) = std::env::var("WEAVIATE_URL") {
            config.weaviate.url = url;
        }
        if let Ok(class_name) = std::env::var("WEAVIATE_CLASS_NAME") {
            config.weaviate.class_name = class_name;
        }
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            config.chat_model.url = url.clone();
            config.ner.url = url;
        }
        if let Ok(model) = std::env::var("CHAT_MODEL") {
            config.chat_model.model = model;
        }
        if let Ok(model) = std::env::var("NER_MODEL") {
            config.ner.model = model;
            config.ner.enabled = true;
        }
        if let Ok(k) = std::env::var("MAX_FOLLOWUPS") {
            if let Ok(k) = k.parse() {
                config.retrieval.max_followups = k;
            }
        }

        config
    }

    pub fn followup_timeout(&self) -> Duration {
        Duration::from_secs(self.retrieval.followup_timeout_secs)
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.retrieval.turn_timeout_secs)
    }
}
