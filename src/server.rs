//! HTTP host
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/api/voice-intent` | POST | Resolve `{"text": ...}` to an intent |
//! | `/api/taxonomy` | GET | Current vocabulary |
//! | `/api/corpus` | POST | Replace the corpus with the posted event array |
//! | `/api/health` | GET | Corpus and classifier status |

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::corpus::{CorpusSnapshot, CorpusStore};
use crate::error::VoiceIntentError;
use crate::intent::Intent;
use crate::resolver::IntentResolver;
use crate::taxonomy::Taxonomy;

/// Shared state for all routes
#[derive(Clone)]
pub struct AppState {
    pub corpus: Arc<CorpusStore>,
    pub resolver: Arc<IntentResolver>,
}

impl AppState {
    pub fn new(corpus: CorpusSnapshot, resolver: IntentResolver) -> Self {
        Self {
            corpus: Arc::new(CorpusStore::new(corpus)),
            resolver: Arc::new(resolver),
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct VoiceIntentRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceIntentResponse {
    pub intent: Intent,
    pub known_categories: Vec<String>,
    pub known_actions: Vec<String>,
    pub known_hook_names: Vec<String>,
}

impl VoiceIntentResponse {
    pub fn new(intent: Intent, taxonomy: &Taxonomy) -> Self {
        Self {
            intent,
            known_categories: taxonomy.categories.clone(),
            known_actions: taxonomy.actions.clone(),
            known_hook_names: taxonomy.hook_names.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusSummary {
    pub source: String,
    pub events: usize,
    pub loaded_at: String,
    pub taxonomy: Taxonomy,
}

impl CorpusSummary {
    fn of(snapshot: &CorpusSnapshot) -> Self {
        Self {
            source: snapshot.source.clone(),
            events: snapshot.events.len(),
            loaded_at: snapshot.loaded_at.to_rfc3339(),
            taxonomy: snapshot.taxonomy.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub corpus_source: String,
    pub events: usize,
    pub loaded_at: String,
    pub remote_classifier: bool,
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/voice-intent", post(voice_intent))
        .route("/api/taxonomy", get(taxonomy))
        .route("/api/corpus", post(reload_corpus))
        .route("/api/health", get(health))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until the process is stopped
pub async fn serve(state: AppState, addr: &str) -> Result<(), VoiceIntentError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| VoiceIntentError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, router(state))
        .await
        .map_err(VoiceIntentError::Serve)
}

// ============================================================================
// Handlers
// ============================================================================

async fn voice_intent(
    State(state): State<AppState>,
    body: Result<Json<VoiceIntentRequest>, JsonRejection>,
) -> Result<Json<VoiceIntentResponse>, VoiceIntentError> {
    let Json(request) = body.map_err(|e| VoiceIntentError::InvalidBody(e.body_text()))?;
    let text = request.text.ok_or(VoiceIntentError::InputMissing)?;

    // The whole request sees one corpus even if a reload lands mid-flight
    let snapshot = state.corpus.snapshot().await;
    let intent = state.resolver.resolve(&text, &snapshot.taxonomy).await?;
    info!("{:?} -> {}", text, intent.tag());

    Ok(Json(VoiceIntentResponse::new(intent, &snapshot.taxonomy)))
}

async fn taxonomy(State(state): State<AppState>) -> Json<Taxonomy> {
    Json(state.corpus.snapshot().await.taxonomy.clone())
}

async fn reload_corpus(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CorpusSummary>, VoiceIntentError> {
    let Json(document) = body.map_err(|e| VoiceIntentError::InvalidBody(e.body_text()))?;

    let snapshot = CorpusSnapshot::from_document(document, "api");
    let summary = CorpusSummary::of(&snapshot);
    let previous = state.corpus.replace(snapshot).await;
    info!(
        "Corpus reloaded: {} events (was {} from {})",
        summary.events,
        previous.events.len(),
        previous.source
    );

    Ok(Json(summary))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.corpus.snapshot().await;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        corpus_source: snapshot.source.clone(),
        events: snapshot.events.len(),
        loaded_at: snapshot.loaded_at.to_rfc3339(),
        remote_classifier: state.resolver.has_normalizer(),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::json;
    use tower::ServiceExt;

    fn state() -> AppState {
        let corpus = CorpusSnapshot::from_document(
            json!([
                {"screenName": "login", "action": "login_with_password", "category": "signin"},
                {"screenName": "homeTab", "action": "seen", "category": "home_tab",
                 "label": {"hook_name": "listing_carousel"}}
            ]),
            "test",
        );
        AppState::new(corpus, IntentResolver::local())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_voice_intent_filter() {
        let resp = router(state())
            .oneshot(post_json("/api/voice-intent", r#"{"text":"show category sign"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(
            body["intent"],
            json!({"type": "filterByCategory", "category": "signin"})
        );
        assert_eq!(body["knownCategories"], json!(["home_tab", "signin"]));
        assert_eq!(body["knownActions"], json!(["login_with_password", "seen"]));
        assert_eq!(body["knownHookNames"], json!(["listing_carousel"]));
    }

    #[tokio::test]
    async fn test_voice_intent_hook_name_key() {
        let resp = router(state())
            .oneshot(post_json("/api/voice-intent", r#"{"text":"show hook carousel"}"#))
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(
            body["intent"],
            json!({"type": "filterByHookName", "hookName": "listing_carousel"})
        );
    }

    #[tokio::test]
    async fn test_voice_intent_missing_text() {
        for body in [r#"{}"#, r#"{"text":""}"#, r#"{"text":"   "}"#] {
            let resp = router(state())
                .oneshot(post_json("/api/voice-intent", body))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {}", body);
            assert_eq!(body_json(resp).await, json!({"error": "Missing text"}));
        }
    }

    #[tokio::test]
    async fn test_voice_intent_bad_json() {
        let resp = router(state())
            .oneshot(post_json("/api/voice-intent", "{not json"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_voice_intent_unknown() {
        let resp = router(state())
            .oneshot(post_json("/api/voice-intent", r#"{"text":"banana"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["intent"], json!({"type": "unknown"}));
    }

    #[tokio::test]
    async fn test_taxonomy_route() {
        let resp = router(state()).oneshot(get("/api/taxonomy")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({
                "categories": ["home_tab", "signin"],
                "actions": ["login_with_password", "seen"],
                "hookNames": ["listing_carousel"]
            })
        );
    }

    #[tokio::test]
    async fn test_reload_then_resolve() {
        let state = state();
        let app = router(state.clone());

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/corpus",
                r#"[{"category":"checkout","action":"tap"}]"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let summary = body_json(resp).await;
        assert_eq!(summary["events"], 1);
        assert_eq!(summary["source"], "api");

        let resp = app
            .oneshot(post_json("/api/voice-intent", r#"{"text":"list categories"}"#))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["knownCategories"], json!(["checkout"]));
    }

    #[tokio::test]
    async fn test_health() {
        let resp = router(state()).oneshot(get("/api/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["events"], 2);
        assert_eq!(body["corpusSource"], "test");
        assert_eq!(body["remoteClassifier"], false);
    }
}
