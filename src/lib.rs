#![forbid(unsafe_code)]
#![doc = r#"
Bedrock Relay

Accept chat turns from a browser client and forward them to an AWS Bedrock
`InvokeModel` endpoint authenticated with a bearer token. The relay is
stateless: the client sends its prior turns with every request, and the model
response is returned unchanged inside `{ "response": ... }`.

Crate highlights
- Library: pure translation via `translate(&str, &[ConversationTurn])`.
- HTTP server (in `server`): `POST /api/chat`, `GET /health`, CORS preflight.
- Upstream client (in `bedrock`): one call per turn, no retries.

Modules
- `config`: Environment and override-file configuration.
- `models`: Conversation turns, inbound request parsing, outbound payload.
- `conversion`: Chat turn → InvokeModel payload, headers and URL.
- `bedrock`: `InferenceClient` trait and the reqwest-backed invoker.
- `error`: Relay error taxonomy and HTTP status mapping.
- `server`: Actix-web routes and handlers.
- `util`: Tracing setup, HTTP client construction, error envelopes.
"#]

pub mod bedrock;
pub mod config;
pub mod conversion;
pub mod error;
pub mod models;
pub mod server;
pub mod util;

pub use crate::bedrock::{invoke_model, BedrockInvoker, InferenceClient};
pub use crate::config::{ConfigSource, RelayConfig};
pub use crate::conversion::{invoke_url, translate, upstream_headers};
pub use crate::error::RelayError;
pub use crate::models::{ChatRequest, ConversationTurn, InferencePayload, Role};
pub use crate::server::{config_routes, cors_headers, AppState};
