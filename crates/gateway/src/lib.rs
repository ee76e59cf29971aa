//! HTTP chat gateway for Charloom.
//!
//! Exposes the chat endpoint plus health, state inspection, and prompt
//! debugging. Each `/chat` request runs the full turn pipeline: validation,
//! feedback extraction, context enrichment, prompt composition, generation,
//! and completion cleanup.
//!
//! Built on Axum for high performance async HTTP.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use charloom_config::AppConfig;
use charloom_core::error::{StoreError, ValidationError};
use charloom_core::generate::{GenerationRequest, Generator};
use charloom_core::segment::PromptSegment;
use charloom_core::state::ConversationState;
use charloom_core::store::{ConversationKey, ConversationStore};
use charloom_core::turn::TurnRequest;
use charloom_enrich::EnrichmentPipeline;
use charloom_feedback::FeedbackExtractor;
use charloom_prompt::PromptComposer;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub store: Arc<dyn ConversationStore>,
    pub generator: Arc<dyn Generator>,
    pub pipeline: EnrichmentPipeline,
    pub extractor: FeedbackExtractor,
    pub composer: PromptComposer,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - Request body size limit (1 MB)
/// - CORS open to any origin (the gateway serves browser clients directly)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/compose/debug", post(compose_debug_handler))
        .route("/state/{key}", get(state_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server with the real pipeline components.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = Arc::new(GatewayState {
        store: Arc::new(charloom_memory::InMemoryStore::new(
            config.store.max_conversations,
        )),
        generator: Arc::new(charloom_providers::OpenAiGenerator::from_config(&config)),
        pipeline: EnrichmentPipeline::from_config(&config.adapters),
        extractor: FeedbackExtractor::new(),
        composer: PromptComposer::new(config.prompt.history_word_budget),
        config,
    });

    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ── Wire types ────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize, Deserialize)]
struct ChatResponse {
    reply: String,
}

#[derive(Serialize, Deserialize)]
struct ComposeDebugResponse {
    segments: Vec<PromptSegment>,
}

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

type ErrorReply = (StatusCode, Json<ErrorResponse>);

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// The full turn pipeline. Rejection happens before any state mutation or
/// external call; a failed generation surfaces as a distinct error without
/// touching the already-saved conversation state.
async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<TurnRequest>,
) -> Result<Json<ChatResponse>, ErrorReply> {
    let message = validate(&payload).map_err(rejected)?;
    let key = payload.conversation_key();
    info!(key = %key, regenerate = payload.regenerate, "Chat turn");

    let mut conversation = state.store.load(&key).await.map_err(store_failure)?;

    state.extractor.extract(&message, &mut conversation);

    let enrichment = state.pipeline.gather(&message).await;
    if let Some(emotion) = &enrichment.emotion {
        conversation.push_emotion(emotion.clone());
    }

    state
        .store
        .save(&key, conversation.clone())
        .await
        .map_err(store_failure)?;

    let segments = state.composer.compose(&payload, &conversation, &enrichment);
    let request = GenerationRequest {
        segments,
        max_tokens: state.config.generation.max_completion_tokens,
        temperature: state.config.generation.temperature,
    };

    match state.generator.generate(request).await {
        Ok(raw) => {
            let reply = charloom_postprocess::clean(&raw, &payload.history);
            Ok(Json(ChatResponse { reply }))
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Generation failed");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "Failed to get AI response".into(),
                    details: Some(e.category().into()),
                }),
            ))
        }
    }
}

/// Compose the prompt for a turn without mutating any state or calling the
/// generation service. Enrichment adapters still run, since their output
/// shapes the prompt.
async fn compose_debug_handler(
    State(state): State<SharedState>,
    Json(payload): Json<TurnRequest>,
) -> Result<Json<ComposeDebugResponse>, ErrorReply> {
    let message = validate(&payload).map_err(rejected)?;
    let key = payload.conversation_key();

    let conversation = state.store.load(&key).await.map_err(store_failure)?;
    let enrichment = state.pipeline.gather(&message).await;
    let segments = state.composer.compose(&payload, &conversation, &enrichment);

    Ok(Json(ComposeDebugResponse { segments }))
}

/// Inspect the accumulated state for a conversation key. Unknown keys read
/// as a fresh default state.
async fn state_handler(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<Json<ConversationState>, ErrorReply> {
    let conversation = state
        .store
        .load(&ConversationKey::from(&key))
        .await
        .map_err(store_failure)?;
    Ok(Json(conversation))
}

// ── Validation and error mapping ──────────────────────────────────────────

/// Check the turn before any side effect, returning the effective message.
fn validate(payload: &TurnRequest) -> Result<String, ValidationError> {
    if payload.character.name.trim().is_empty() {
        return Err(ValidationError::MissingCharacterName);
    }
    if payload.character.description.trim().is_empty() {
        return Err(ValidationError::MissingCharacterDescription);
    }
    payload
        .effective_message()
        .map(str::to_string)
        .ok_or(ValidationError::MissingMessage)
}

fn rejected(e: ValidationError) -> ErrorReply {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "Missing message or character".into(),
            details: Some(e.to_string()),
        }),
    )
}

fn store_failure(e: StoreError) -> ErrorReply {
    warn!(error = %e, "Conversation store failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".into(),
            details: None,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use charloom_core::error::GenerationError;
    use charloom_memory::InMemoryStore;
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Mock generation backend returning a canned result.
    struct MockGenerator {
        outcome: Result<String, GenerationError>,
        last_request: Mutex<Option<GenerationRequest>>,
    }

    impl MockGenerator {
        fn replying(text: &str) -> Self {
            Self {
                outcome: Ok(text.to_string()),
                last_request: Mutex::new(None),
            }
        }

        fn failing(error: GenerationError) -> Self {
            Self {
                outcome: Err(error),
                last_request: Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl Generator for MockGenerator {
        fn name(&self) -> &str {
            "gateway_mock"
        }

        async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
            *self.last_request.lock().unwrap() = Some(request);
            self.outcome.clone()
        }
    }

    fn test_state(generator: Arc<MockGenerator>) -> SharedState {
        Arc::new(GatewayState {
            config: AppConfig::default(),
            store: Arc::new(InMemoryStore::new(16)),
            generator,
            pipeline: EnrichmentPipeline::new(),
            extractor: FeedbackExtractor::new(),
            composer: PromptComposer::default(),
        })
    }

    fn chat_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn mira_body(message: &str) -> serde_json::Value {
        serde_json::json!({
            "message": message,
            "character": { "name": "Mira", "description": "a poised heiress" },
        })
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = build_router(test_state(Arc::new(MockGenerator::replying("hi"))));
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let health: HealthResponse = json_body(response).await;
        assert_eq!(health.status, "ok");
        assert!(!health.version.is_empty());
    }

    #[tokio::test]
    async fn successful_turn_returns_cleaned_reply() {
        let generator = Arc::new(MockGenerator::replying(
            "*She smiles.* \"Hello to you too.\"",
        ));
        let state = test_state(generator);
        let app = build_router(state.clone());

        let response = app.oneshot(chat_request(mira_body("Hello"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let chat: ChatResponse = json_body(response).await;
        assert_eq!(chat.reply, "*She smiles.* \"Hello to you too.\"");

        // The turn persisted conversation state under the default bucket.
        assert_eq!(state.store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rejected_turn_leaves_state_untouched() {
        let state = test_state(Arc::new(MockGenerator::replying("unused")));

        let missing_name = serde_json::json!({
            "message": "Hello",
            "character": { "name": "", "description": "a poised heiress" },
        });
        let response = build_router(state.clone())
            .oneshot(chat_request(missing_name))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = json_body(response).await;
        assert_eq!(error.error, "Missing message or character");
        assert!(error.details.unwrap().contains("character.name"));

        let blank_message = mira_body("   ");
        let response = build_router(state.clone())
            .oneshot(chat_request(blank_message))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // No feedback, no emotion, no tracked conversation.
        assert_eq!(state.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn generation_failure_maps_to_bad_gateway() {
        let cases = [
            (
                GenerationError::RequestFailed("connection refused".into()),
                "request failed",
            ),
            (
                GenerationError::InvalidResponse("missing choices".into()),
                "invalid response",
            ),
            (GenerationError::EmptyCompletion, "no response"),
        ];

        for (error, category) in cases {
            let state = test_state(Arc::new(MockGenerator::failing(error)));
            let response = build_router(state)
                .oneshot(chat_request(mira_body("Hello")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
            let body: ErrorResponse = json_body(response).await;
            assert_eq!(body.error, "Failed to get AI response");
            assert_eq!(body.details.as_deref(), Some(category));
        }
    }

    #[tokio::test]
    async fn regenerate_reuses_last_user_message() {
        let generator = Arc::new(MockGenerator::replying("A fresh take."));
        let state = test_state(generator.clone());

        let body = serde_json::json!({
            "message": "ignored stale text",
            "character": { "name": "Mira", "description": "a poised heiress" },
            "history": [
                { "text": "What do you think of the garden?", "isUser": true },
                { "text": "*She shrugs.* \"It is overgrown.\"", "isUser": false },
            ],
            "regenerate": true,
        });
        let response = build_router(state).oneshot(chat_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = generator.last_request.lock().unwrap().take().unwrap();
        assert_eq!(
            request.segments.last().unwrap().content,
            "What do you think of the garden?"
        );
    }

    #[tokio::test]
    async fn reply_echoing_prior_assistant_turn_is_deduplicated() {
        let echoed = "The moon hangs low over the orchard tonight.";
        let generator = Arc::new(MockGenerator::replying(&format!(
            "{echoed} Come walk with me."
        )));
        let state = test_state(generator);

        let body = serde_json::json!({
            "message": "Shall we go outside?",
            "character": { "name": "Mira", "description": "a poised heiress" },
            "history": [
                { "text": "Tell me about the night.", "isUser": true },
                { "text": echoed, "isUser": false },
            ],
        });
        let response = build_router(state).oneshot(chat_request(body)).await.unwrap();
        let chat: ChatResponse = json_body(response).await;
        assert_eq!(chat.reply, "Come walk with me.");
    }

    #[tokio::test]
    async fn feedback_from_the_turn_reaches_the_prompt() {
        let generator = Arc::new(MockGenerator::replying("As you like."));
        let state = test_state(generator.clone());

        let response = build_router(state)
            .oneshot(chat_request(mira_body("Be more poetic, please")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = generator.last_request.lock().unwrap().take().unwrap();
        let prompt_text: String = request
            .segments
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(prompt_text.contains("poetic"));
    }

    #[tokio::test]
    async fn compose_debug_returns_segments_without_persisting() {
        let state = test_state(Arc::new(MockGenerator::replying("unused")));
        let req = Request::builder()
            .method("POST")
            .uri("/compose/debug")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&mira_body("Hello")).unwrap()))
            .unwrap();

        let response = build_router(state.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let debug: ComposeDebugResponse = json_body(response).await;
        assert_eq!(debug.segments.len(), 5);
        assert_eq!(state.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn state_endpoint_reads_fresh_default_for_unknown_key() {
        let state = test_state(Arc::new(MockGenerator::replying("unused")));
        let req = Request::builder()
            .uri("/state/some-unknown-key")
            .body(Body::empty())
            .unwrap();

        let response = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let conversation: ConversationState = json_body(response).await;
        assert!(conversation.emotion_history.is_empty());
        assert!(conversation.feedback_log.is_empty());
    }

    #[tokio::test]
    async fn conversation_key_scopes_state() {
        let generator = Arc::new(MockGenerator::replying("Noted."));
        let state = test_state(generator);
        let app = build_router(state.clone());

        let mut body = mira_body("Be more poetic, please");
        body["conversationKey"] = serde_json::json!("sam:mira");
        let response = app.oneshot(chat_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let keyed = state
            .store
            .load(&ConversationKey::from("sam:mira"))
            .await
            .unwrap();
        assert_eq!(keyed.preferences.style.as_deref(), Some("poetic"));

        let other = state
            .store
            .load(&ConversationKey::from("default"))
            .await
            .unwrap();
        assert!(other.preferences.is_empty());
    }
}
