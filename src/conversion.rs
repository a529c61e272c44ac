//! Chat turn → Bedrock InvokeModel translation.
//!
//! Pure functions: nothing here performs I/O.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::models::{ConversationTurn, InferencePayload, ANTHROPIC_VERSION, MAX_TOKENS};

pub const AMZ_TARGET_HEADER: &str = "x-amz-target";
pub const AMZ_TARGET_INVOKE_MODEL: &str = "BedrockRuntime.InvokeModel";
pub const INFERENCE_PROFILE_ID_HEADER: &str = "x-amzn-bedrock-inference-profile-id";
pub const INFERENCE_PROFILE_ARN_HEADER: &str = "x-amzn-bedrock-inference-profile-arn";

/// Build the upstream payload: prior turns followed by `message` as a new
/// user turn. Consecutive same-role turns are forwarded as-is.
pub fn translate(message: &str, history: &[ConversationTurn]) -> InferencePayload {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.extend_from_slice(history);
    messages.push(ConversationTurn::user(message));

    InferencePayload {
        anthropic_version: ANTHROPIC_VERSION.to_string(),
        max_tokens: MAX_TOKENS,
        messages,
    }
}

/// Headers for an InvokeModel call.
///
/// Inference-profile headers are only added when configured.
pub fn upstream_headers(config: &RelayConfig, bearer_token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let auth = HeaderValue::from_str(&format!("Bearer {bearer_token}")).map_err(|_| {
        RelayError::Configuration(
            "AWS_BEARER_TOKEN_BEDROCK contains characters not allowed in a header".to_string(),
        )
    })?;
    headers.insert(AUTHORIZATION, auth);
    headers.insert(
        HeaderName::from_static(AMZ_TARGET_HEADER),
        HeaderValue::from_static(AMZ_TARGET_INVOKE_MODEL),
    );

    let profiles = [
        (
            INFERENCE_PROFILE_ID_HEADER,
            config.inference_profile_id.as_deref(),
        ),
        (
            INFERENCE_PROFILE_ARN_HEADER,
            config.inference_profile_arn.as_deref(),
        ),
    ];
    for (name, value) in profiles {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            continue;
        };
        let value = HeaderValue::from_str(value).map_err(|_| {
            RelayError::Configuration(format!("Invalid value for header {name}"))
        })?;
        headers.insert(HeaderName::from_static(name), value);
    }

    Ok(headers)
}

/// `{endpoint}/model/{modelId}/invoke`, with the model id percent-encoded.
pub fn invoke_url(config: &RelayConfig) -> String {
    format!(
        "{}/model/{}/invoke",
        config.endpoint_base(),
        urlencoding::encode(&config.model_id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use std::collections::HashMap;

    #[test]
    fn appends_new_user_turn_last() {
        let history = vec![
            ConversationTurn::user("prev"),
            ConversationTurn::assistant("answer"),
        ];
        let payload = translate("next", &history);
        assert_eq!(payload.anthropic_version, "bedrock-2023-05-31");
        assert_eq!(payload.max_tokens, 4000);
        assert_eq!(payload.messages.len(), 3);
        assert_eq!(&payload.messages[..2], &history[..]);
        assert_eq!(payload.messages[2], ConversationTurn::user("next"));
        // Input left untouched.
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn does_not_merge_consecutive_user_turns() {
        let history = vec![ConversationTurn::user("prev")];
        let payload = translate("hi", &history);
        let roles: Vec<Role> = payload.messages.iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::User, Role::User]);
        assert_eq!(payload.messages[1].content, "hi");
    }

    #[test]
    fn empty_history_yields_single_turn() {
        let payload = translate("hello", &[]);
        assert_eq!(payload.messages, vec![ConversationTurn::user("hello")]);
    }

    #[test]
    fn headers_without_profiles() {
        let cfg = RelayConfig::default();
        let headers = upstream_headers(&cfg, "tok").expect("headers");
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer tok");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(
            headers.get(AMZ_TARGET_HEADER).unwrap(),
            "BedrockRuntime.InvokeModel"
        );
        assert!(headers.get(INFERENCE_PROFILE_ID_HEADER).is_none());
        assert!(headers.get(INFERENCE_PROFILE_ARN_HEADER).is_none());
    }

    #[test]
    fn headers_include_configured_profiles_only() {
        let cfg = RelayConfig {
            inference_profile_id: Some("apac.anthropic.claude".into()),
            ..RelayConfig::default()
        };
        let headers = upstream_headers(&cfg, "tok").expect("headers");
        assert_eq!(
            headers.get(INFERENCE_PROFILE_ID_HEADER).unwrap(),
            "apac.anthropic.claude"
        );
        assert!(headers.get(INFERENCE_PROFILE_ARN_HEADER).is_none());

        let cfg = RelayConfig {
            inference_profile_id: Some("id".into()),
            inference_profile_arn: Some("arn:aws:bedrock:x".into()),
            ..RelayConfig::default()
        };
        let headers = upstream_headers(&cfg, "tok").expect("headers");
        assert_eq!(headers.get(INFERENCE_PROFILE_ARN_HEADER).unwrap(), "arn:aws:bedrock:x");
    }

    #[test]
    fn token_with_control_characters_is_a_configuration_error() {
        let err = upstream_headers(&RelayConfig::default(), "bad\ntoken").unwrap_err();
        assert!(matches!(err, RelayError::Configuration(_)));
    }

    #[test]
    fn invoke_url_encodes_model_id() {
        let cfg = RelayConfig::from_vars(&HashMap::new());
        assert_eq!(
            invoke_url(&cfg),
            "https://bedrock-runtime.ap-southeast-2.amazonaws.com/model/anthropic.claude-sonnet-4-5-20250929-v1%3A0/invoke"
        );
    }

    #[test]
    fn invoke_url_uses_endpoint_override() {
        let cfg = RelayConfig {
            endpoint_url: Some("http://127.0.0.1:9999/".into()),
            model_id: "m".into(),
            ..RelayConfig::default()
        };
        assert_eq!(invoke_url(&cfg), "http://127.0.0.1:9999/model/m/invoke");
    }
}
