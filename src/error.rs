//! Relay error taxonomy.
//!
//! Every failure raised while handling a chat turn ends up here and is turned
//! into the uniform `{ "error": <message> }` envelope by the server.

use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    /// Relay is not configured to talk to upstream (e.g. no bearer token).
    #[error("{0}")]
    Configuration(String),

    /// Inbound request was rejected before any upstream call.
    #[error("{0}")]
    InvalidInput(String),

    /// Upstream answered with a non-2xx status.
    #[error("Bedrock error {status}: {body}")]
    UpstreamHttp { status: u16, body: String },

    /// Upstream could not be reached (DNS, connect, TLS, ...).
    #[error("{0}")]
    Transport(String),

    /// Upstream answered 2xx but the body was not JSON.
    #[error("Invalid upstream response: {0}")]
    UpstreamDecode(String),

    #[error("Not found")]
    NotFound,
}

pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// HTTP status the relay answers with for this failure.
    ///
    /// Upstream statuses are passed through when they are valid error codes;
    /// anything without a usable status maps to 500.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RelayError::NotFound => StatusCode::NOT_FOUND,
            RelayError::UpstreamHttp { status, .. } if *status >= 400 => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        let msg = err.to_string();
        if msg.trim().is_empty() {
            RelayError::Transport("Upstream request failed".to_string())
        } else {
            RelayError::Transport(msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_is_preserved() {
        let err = RelayError::UpstreamHttp {
            status: 429,
            body: "Too many requests".into(),
        };
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.to_string(), "Bedrock error 429: Too many requests");
    }

    #[test]
    fn non_error_upstream_status_falls_back_to_500() {
        let err = RelayError::UpstreamHttp {
            status: 302,
            body: String::new(),
        };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = RelayError::UpstreamHttp {
            status: 1000,
            body: String::new(),
        };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn kinds_without_upstream_status_map_to_fixed_codes() {
        assert_eq!(
            RelayError::InvalidInput("message is required".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(RelayError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            RelayError::Configuration("Missing AWS_BEARER_TOKEN_BEDROCK".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            RelayError::Transport("connection refused".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(RelayError::NotFound.to_string(), "Not found");
    }
}
