//! HTTP surface of the relay.
//!
//! - `POST /api/chat`: validate, translate, invoke upstream, wrap the result
//! - `GET /health`: liveness, independent of credentials
//! - `OPTIONS *`: empty CORS preflight answer
//! - anything else: `404 { "error": "Not found" }`
//!
//! Every response carries the same three CORS headers (see [`cors_headers`]).

use std::sync::Arc;

use actix_web::http::Method;
use actix_web::middleware::DefaultHeaders;
use actix_web::{web, HttpRequest, HttpResponse};
use bytes::Bytes;
use serde_json::{json, Value};

use crate::bedrock::{BedrockInvoker, InferenceClient};
use crate::config::RelayConfig;
use crate::conversion::translate;
use crate::error::{RelayError, Result};
use crate::models::ChatRequest;
use crate::util::error_response;

pub const CHAT_PATH: &str = "/api/chat";
pub const HEALTH_PATH: &str = "/health";

pub const ALLOW_HEADERS: &str = "content-type";
pub const ALLOW_METHODS: &str = "POST, OPTIONS";

/// Shared application state used by the HTTP server and handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub client: Arc<dyn InferenceClient>,
}

impl AppState {
    pub fn new(config: Arc<RelayConfig>, client: Arc<dyn InferenceClient>) -> Self {
        Self { config, client }
    }

    /// State backed by a real Bedrock invoker.
    pub fn with_bedrock(config: RelayConfig, http: reqwest::Client) -> Self {
        let config = Arc::new(config);
        let client = Arc::new(BedrockInvoker::new(http, config.clone()));
        Self { config, client }
    }
}

/// CORS headers attached to every response, success or error.
pub fn cors_headers(config: &RelayConfig) -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", config.allowed_origin.clone()))
        .add(("Access-Control-Allow-Headers", ALLOW_HEADERS))
        .add(("Access-Control-Allow-Methods", ALLOW_METHODS))
}

/// Configure Actix-web routes. Expects `web::Data<AppState>` to be registered.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    // Request bodies are buffered whole with no size cap.
    cfg.app_data(web::PayloadConfig::new(usize::MAX))
        .service(
            web::resource(CHAT_PATH)
                .route(web::post().to(chat))
                .default_service(web::to(fallback)),
        )
        .service(
            web::resource(HEALTH_PATH)
                .route(web::get().to(health))
                .default_service(web::to(fallback)),
        )
        .default_service(web::to(fallback));
}

/// Preflight for any path, 404 for everything else that did not match.
async fn fallback(req: HttpRequest) -> HttpResponse {
    if *req.method() == Method::OPTIONS {
        return HttpResponse::NoContent().finish();
    }
    tracing::debug!("No route for {} {}", req.method(), req.path());
    error_response(&RelayError::NotFound)
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "ok": true }))
}

async fn chat(state: web::Data<AppState>, body: Bytes) -> HttpResponse {
    match relay_chat(&state, &body).await {
        Ok(response) => HttpResponse::Ok().json(json!({ "response": response })),
        Err(err) => {
            match &err {
                RelayError::InvalidInput(_) => tracing::debug!("Rejected chat request: {}", err),
                _ => tracing::warn!("Chat relay failed ({}): {}", err.status(), err),
            }
            error_response(&err)
        }
    }
}

/// Validate → translate → invoke for one chat turn.
pub async fn relay_chat(state: &AppState, body: &[u8]) -> Result<Value> {
    let request = ChatRequest::from_body(body)?;
    let payload = translate(&request.message, &request.conversation_history);
    tracing::debug!(
        "Relaying chat turn ({} prior turns) to {}",
        request.conversation_history.len(),
        state.config.model_id
    );
    state.client.invoke(&payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InferencePayload;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records payloads and answers from a fixed script.
    struct ScriptedClient {
        calls: Mutex<Vec<InferencePayload>>,
        reply: fn(&InferencePayload) -> Result<Value>,
    }

    #[async_trait]
    impl InferenceClient for ScriptedClient {
        async fn invoke(&self, payload: &InferencePayload) -> Result<Value> {
            self.calls.lock().unwrap().push(payload.clone());
            (self.reply)(payload)
        }
    }

    fn state(reply: fn(&InferencePayload) -> Result<Value>) -> (AppState, Arc<ScriptedClient>) {
        let client = Arc::new(ScriptedClient {
            calls: Mutex::new(Vec::new()),
            reply,
        });
        let state = AppState::new(Arc::new(RelayConfig::default()), client.clone());
        (state, client)
    }

    #[actix_web::test]
    async fn relay_chat_returns_upstream_body_verbatim() {
        let (state, client) = state(|_| Ok(json!({"content": [{"type": "text", "text": "hey"}]})));
        let body = br#"{"message":"hi","conversationHistory":[{"role":"assistant","content":"yo"}]}"#;
        let value = relay_chat(&state, body).await.expect("relay ok");
        assert_eq!(value["content"][0]["text"], "hey");

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].messages.len(), 2);
        assert_eq!(calls[0].messages[1].content, "hi");
    }

    #[actix_web::test]
    async fn relay_chat_rejects_blank_message_without_invoking() {
        let (state, client) = state(|_| Ok(json!({})));
        let err = relay_chat(&state, br#"{"message":"   "}"#).await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidInput(_)));
        assert!(client.calls.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn relay_chat_propagates_invoker_errors() {
        let (state, _client) = state(|_| {
            Err(RelayError::UpstreamHttp {
                status: 400,
                body: "bad".into(),
            })
        });
        let err = relay_chat(&state, br#"{"message":"hi"}"#).await.unwrap_err();
        assert_eq!(err.status().as_u16(), 400);
    }
}
