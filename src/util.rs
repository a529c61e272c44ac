use actix_web::HttpResponse;
use http::StatusCode;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::RelayError;

/// Initialize structured tracing based on RUST_LOG (default `info`).
pub fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,actix_web=info".into());
    let subscriber = fmt().with_env_filter(EnvFilter::new(filter)).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Build the outbound HTTP client honoring proxy environment variables.
///
/// Environment:
/// - RELAY_NO_PROXY = 1|true|yes|on  -> disable all proxies
/// - RELAY_PROXY_URL = <url>         -> proxy for all schemes
/// - HTTP_PROXY / http_proxy         -> HTTP proxy
/// - HTTPS_PROXY / https_proxy       -> HTTPS proxy
///
/// No request timeout is set; the transport default applies.
pub fn build_http_client_from_env() -> reqwest::Client {
    let mut builder = reqwest::Client::builder();

    let no_proxy = std::env::var("RELAY_NO_PROXY")
        .map(|v| v.trim().to_ascii_lowercase())
        .map(|v| v == "1" || v == "true" || v == "yes" || v == "on")
        .unwrap_or(false);

    if no_proxy {
        builder = builder.no_proxy();
    } else {
        if let Ok(url) = std::env::var("RELAY_PROXY_URL") {
            let u = url.trim();
            if !u.is_empty() {
                match reqwest::Proxy::all(u) {
                    Ok(p) => builder = builder.proxy(p),
                    Err(e) => tracing::warn!("Ignoring invalid RELAY_PROXY_URL: {}", e),
                }
            }
        }
        if let Ok(http_p) = std::env::var("HTTP_PROXY").or_else(|_| std::env::var("http_proxy")) {
            let u = http_p.trim();
            if !u.is_empty() {
                if let Ok(p) = reqwest::Proxy::http(u) {
                    builder = builder.proxy(p);
                }
            }
        }
        if let Ok(https_p) = std::env::var("HTTPS_PROXY").or_else(|_| std::env::var("https_proxy"))
        {
            let u = https_p.trim();
            if !u.is_empty() {
                if let Ok(p) = reqwest::Proxy::https(u) {
                    builder = builder.proxy(p);
                }
            }
        }
    }

    builder = builder.user_agent(format!("bedrock-relay/{}", env!("CARGO_PKG_VERSION")));

    builder.build().unwrap_or_else(|e| {
        tracing::warn!("Falling back to default HTTP client: {}", e);
        reqwest::Client::new()
    })
}

/// Build the `{ "error": <message> }` envelope for a relay failure.
pub fn error_response(err: &RelayError) -> HttpResponse {
    json_error(err.status(), &err.to_string())
}

/// Build a JSON error response with the given HTTP status and message.
pub fn json_error(status: StatusCode, msg: &str) -> HttpResponse {
    let status = actix_web::http::StatusCode::from_u16(status.as_u16())
        .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(serde_json::json!({ "error": msg }))
}
