mod cache;
mod config;
mod metrics;
mod retry;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use extract::{Extractor, NerClient};
use retrieval::{
    ChatModel, EnhancedRetriever, QueryOrigin, ResponseFormatter, RetrievalConfig, RetrievalError,
    SuggestedQuestion, SuggestionEngine, WeaviateSearch,
};
use vocab::{Language, Vocabulary};

use cache::ReformulationCache;
use config::AppConfig;
use metrics::Metrics;
use retry::RetryPolicy;

struct AppState {
    retriever: EnhancedRetriever,
    chat_model: ChatModel,
    suggestions: SuggestionEngine,
    formatter: ResponseFormatter,
    cache: ReformulationCache,
    retry: RetryPolicy,
    metrics: Arc<Metrics>,
    config: AppConfig,
}

#[derive(Deserialize)]
struct ChatRequest {
    question: String,
    /// Prior turns as (question, answer) pairs, oldest first.
    #[serde(default)]
    history: Vec<(String, String)>,
    /// Forces the answer language; detected from the question when absent.
    language: Option<Language>,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
    language: Language,
    sources: Vec<SourceRef>,
    trace: retrieval::RetrievalTrace,
}

#[derive(Serialize)]
struct SourceRef {
    id: String,
    source: String,
    page: Option<u32>,
    followup: bool,
}

#[derive(Deserialize)]
struct SuggestRequest {
    question: String,
    answer: String,
    #[serde(default)]
    history: Vec<(String, String)>,
}

#[derive(Serialize)]
struct SuggestResponse {
    suggestions: Vec<SuggestedQuestion>,
}

#[derive(Serialize)]
struct HealthResponse {
    weaviate: String,
    chat_model: String,
}

#[derive(Serialize)]
struct StatsResponse {
    metrics: metrics::MetricsSnapshot,
    cache: cache::CacheStats,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().json().init();

    let config = AppConfig::from_env();

    let vocab = Arc::new(Vocabulary::builtin());
    let mut extractor = Extractor::new(Arc::clone(&vocab));
    if config.ner.enabled {
        extractor = extractor.with_ner(NerClient::new(
            config.ner.url.clone(),
            config.ner.model.clone(),
        ));
    }

    let search = WeaviateSearch::new(
        config.weaviate.url.clone(),
        config.weaviate.class_name.clone(),
        config.weaviate.results_per_query,
    );

    let retriever = EnhancedRetriever::new(
        Arc::new(search),
        extractor,
        RetrievalConfig {
            extract_top_n: config.retrieval.extract_top_n,
            max_followups: config.retrieval.max_followups,
            followup_timeout: config.followup_timeout(),
        },
    );

    let chat_model = ChatModel::new(config.chat_model.url.clone(), config.chat_model.model.clone());
    let suggestions =
        SuggestionEngine::new(Arc::clone(&vocab)).with_chat_model(chat_model.clone());

    let state = Arc::new(AppState {
        retriever,
        chat_model,
        suggestions,
        formatter: ResponseFormatter::new(),
        cache: ReformulationCache::new(config.cache.max_entries, config.cache.enabled),
        retry: RetryPolicy::new(&config.retry),
        metrics: Metrics::new(),
        config: config.clone(),
    });

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/chat", post(chat))
        .route("/suggestions", post(suggest_questions))
        .route("/stats", get(get_stats))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind_addr, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };

    info!(addr = %config.bind_addr, "Server listening");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server exited with error");
        std::process::exit(1);
    }
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let weaviate = match reqwest::get(format!(
        "{}/v1/.well-known/ready",
        state.config.weaviate.url
    ))
    .await
    {
        Ok(resp) if resp.status().is_success() => "ok".to_string(),
        Ok(resp) => format!("error: status {}", resp.status()),
        Err(e) => format!("error: {}", e),
    };

    let chat_model = match reqwest::get(format!("{}/api/tags", state.config.chat_model.url)).await {
        Ok(resp) if resp.status().is_success() => "ok".to_string(),
        Ok(resp) => format!("error: status {}", resp.status()),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        weaviate,
        chat_model,
    })
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    let turn_id = Uuid::new_v4();

    if req.question.trim().is_empty() {
        return Err(turn_error(StatusCode::BAD_REQUEST, "question must not be empty"));
    }

    let language = req
        .language
        .unwrap_or_else(|| Language::detect(&req.question));

    let started = Instant::now();
    let result = tokio::time::timeout(
        state.config.turn_timeout(),
        run_turn(&state, &req, language).instrument(info_span!("chat_turn", %turn_id)),
    )
    .await;

    let response = match result {
        Ok(Ok(response)) => {
            state.metrics.record_turn(true, started.elapsed());
            response
        }
        Ok(Err(status_error)) => {
            state.metrics.record_turn(false, started.elapsed());
            return Err(status_error);
        }
        Err(_) => {
            state.metrics.record_turn(false, started.elapsed());
            warn!(
                %turn_id,
                timeout_secs = state.config.retrieval.turn_timeout_secs,
                "Turn timed out"
            );
            return Err(turn_error(StatusCode::GATEWAY_TIMEOUT, "turn timed out"));
        }
    };

    info!(
        %turn_id,
        elapsed_ms = started.elapsed().as_millis() as u64,
        language = language.code(),
        sources = response.sources.len(),
        "Turn completed"
    );

    Ok(Json(response))
}

async fn run_turn(
    state: &AppState,
    req: &ChatRequest,
    language: Language,
) -> Result<ChatResponse, (StatusCode, Json<ErrorResponse>)> {
    // Step 1: reformulate the question into a standalone search query,
    // consulting the cache first.
    let reformulated = match state.cache.get(&req.question, &req.history) {
        Some(cached) => cached,
        None => {
            let reformulated = state
                .retry
                .run("reformulate", || {
                    state.chat_model.reformulate(&req.question, &req.history)
                })
                .await
                .map_err(|e| {
                    error!(error = %e, "Reformulation failed");
                    turn_error(StatusCode::BAD_GATEWAY, "language model unavailable")
                })?;
            state
                .cache
                .set(&req.question, &req.history, reformulated.clone());
            reformulated
        }
    };

    // Step 2: enhanced retrieval over the reformulated query.
    let outcome = state
        .retriever
        .retrieve(&reformulated, &req.question, language)
        .await
        .map_err(|e| match e {
            RetrievalError::Unavailable(source) => {
                state.metrics.record_retrieval_unavailable();
                error!(error = %source, "Primary search failed");
                turn_error(StatusCode::SERVICE_UNAVAILABLE, "document store unavailable")
            }
        })?;
    state.metrics.record_retrieval(&outcome.trace);

    // Step 3: generate the answer from the assembled context.
    let context_text = outcome.context.to_prompt_context();
    let answer = state
        .retry
        .run("answer", || {
            state
                .chat_model
                .answer(&req.question, &context_text, language)
        })
        .await
        .map_err(|e| {
            error!(error = %e, "Answer generation failed");
            turn_error(StatusCode::BAD_GATEWAY, "language model unavailable")
        })?;

    // Step 4: post-process for amount prominence.
    let answer = state.formatter.format(&answer, language);

    let sources = outcome
        .context
        .passages()
        .iter()
        .map(|p| SourceRef {
            id: p.id.clone(),
            source: p.metadata.source.clone(),
            page: p.metadata.page,
            followup: !p.retrieved_by.contains(&QueryOrigin::Primary),
        })
        .collect();

    Ok(ChatResponse {
        answer,
        language,
        sources,
        trace: outcome.trace,
    })
}

/// Suggestions degrade rather than fail: a turn with nothing to work from
/// still gets the generic templates, so this handler always answers 200.
async fn suggest_questions(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SuggestRequest>,
) -> Json<SuggestResponse> {
    let suggestions = state
        .suggestions
        .suggest(&req.question, &req.answer, &req.history)
        .await;
    Json(SuggestResponse { suggestions })
}

fn turn_error(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        metrics: state.metrics.snapshot(),
        cache: state.cache.stats(),
    })
}
