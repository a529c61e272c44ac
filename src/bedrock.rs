//! Bedrock InvokeModel client.
//!
//! One relayed turn issues exactly one upstream call. There are no retries and
//! no timeout beyond what the HTTP client applies by default. The response
//! body is returned as opaque JSON; its shape is the model's business.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::config::{RelayConfig, ENV_BEARER_TOKEN};
use crate::conversion::{invoke_url, upstream_headers};
use crate::error::{RelayError, Result};
use crate::models::InferencePayload;

/// Seam between the relay endpoint and the inference backend.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send one payload upstream and return the upstream JSON body.
    async fn invoke(&self, payload: &InferencePayload) -> Result<Value>;
}

/// InvokeModel over HTTPS with a bearer token.
pub struct BedrockInvoker {
    http: reqwest::Client,
    config: Arc<RelayConfig>,
}

impl BedrockInvoker {
    pub fn new(http: reqwest::Client, config: Arc<RelayConfig>) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

#[async_trait]
impl InferenceClient for BedrockInvoker {
    async fn invoke(&self, payload: &InferencePayload) -> Result<Value> {
        // Checked per call so the relay can run (and serve /health) without a credential.
        let token = self
            .config
            .bearer_token()
            .ok_or_else(|| RelayError::Configuration(format!("Missing {ENV_BEARER_TOKEN}")))?;

        let headers = upstream_headers(&self.config, token)?;
        let url = invoke_url(&self.config);
        invoke_model(&self.http, &url, headers, payload).await
    }
}

/// POST `payload` to `url` and classify the outcome.
///
/// - transport failure: [`RelayError::Transport`]
/// - non-2xx: [`RelayError::UpstreamHttp`] with the status and body text
///   (an unreadable body becomes an empty string)
/// - 2xx: the body parsed as JSON, unchanged
pub async fn invoke_model(
    http: &reqwest::Client,
    url: &str,
    headers: HeaderMap,
    payload: &InferencePayload,
) -> Result<Value> {
    tracing::debug!(
        "Invoking {} with {} messages",
        url,
        payload.messages.len()
    );

    let response = http
        .post(url)
        .headers(headers)
        .json(payload)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!("Bedrock request to {} failed: {}", url, e);
            RelayError::from(e)
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("Bedrock returned {}: {}", status.as_u16(), body);
        return Err(RelayError::UpstreamHttp {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice::<Value>(&bytes).map_err(|e| RelayError::UpstreamDecode(e.to_string()))
}
