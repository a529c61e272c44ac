//! Wire models for the relay: inbound chat turns and the outbound
//! Anthropic-on-Bedrock InvokeModel payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RelayError, Result};

/// Protocol tag Bedrock expects for Anthropic messages payloads.
pub const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Generation cap applied to every relayed turn.
pub const MAX_TOKENS: u32 = 4000;

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the dialogue, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Validated inbound request for `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// New user message; non-empty after trimming.
    pub message: String,
    /// Prior turns supplied by the client.
    pub conversation_history: Vec<ConversationTurn>,
}

/// Body sent to `POST /model/{modelId}/invoke`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InferencePayload {
    pub anthropic_version: String,
    pub max_tokens: u32,
    pub messages: Vec<ConversationTurn>,
}

impl ChatRequest {
    /// Parse and validate a raw request body.
    ///
    /// An empty body is treated as `{}`. `message` is coerced to text;
    /// `conversationHistory` is only used when it is an array of well-formed
    /// turns, otherwise it is treated as empty.
    pub fn from_body(body: &[u8]) -> Result<Self> {
        let parsed: Value = if body.iter().all(|b| b.is_ascii_whitespace()) {
            Value::Object(Default::default())
        } else {
            serde_json::from_slice(body)
                .map_err(|e| RelayError::InvalidInput(format!("Invalid JSON body: {e}")))?
        };

        let message = parsed.get("message").map(value_to_text).unwrap_or_default();
        let conversation_history = parsed
            .get("conversationHistory")
            .map(history_from_value)
            .unwrap_or_default();

        if message.trim().is_empty() {
            return Err(RelayError::InvalidInput("message is required".to_string()));
        }

        Ok(Self {
            message,
            conversation_history,
        })
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn history_from_value(value: &Value) -> Vec<ConversationTurn> {
    if !value.is_array() {
        return Vec::new();
    }
    match serde_json::from_value::<Vec<ConversationTurn>>(value.clone()) {
        Ok(turns) => turns,
        Err(e) => {
            tracing::warn!("Ignoring malformed conversationHistory: {}", e);
            Vec::new()
        }
    }
}
