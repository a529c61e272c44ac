//! Relay configuration.
//!
//! Resolved once at startup from the process environment plus an optional
//! override file, then shared read-only. A missing bearer token is not a
//! startup error: the relay still serves `/health` and reports the problem on
//! each chat request instead.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8088;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:8087";
pub const DEFAULT_REGION: &str = "ap-southeast-2";
pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-sonnet-4-5-20250929-v1:0";
pub const DEFAULT_ENV_FILE: &str = ".env";

pub const ENV_HOST: &str = "BACKEND_HOST";
pub const ENV_PORT: &str = "BACKEND_PORT";
pub const ENV_ALLOWED_ORIGIN: &str = "FRONTEND_ORIGIN";
pub const ENV_BEARER_TOKEN: &str = "AWS_BEARER_TOKEN_BEDROCK";
pub const ENV_REGION: &str = "BEDROCK_REGION";
pub const ENV_MODEL_ID: &str = "BEDROCK_MODEL_ID";
pub const ENV_INFERENCE_PROFILE_ID: &str = "BEDROCK_INFERENCE_PROFILE_ID";
pub const ENV_INFERENCE_PROFILE_ARN: &str = "BEDROCK_INFERENCE_PROFILE_ARN";
pub const ENV_ENDPOINT_URL: &str = "BEDROCK_ENDPOINT_URL";

/// Immutable snapshot of everything the relay needs to serve requests.
#[derive(Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Interface the HTTP server binds to.
    pub host: String,
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Single origin echoed in `Access-Control-Allow-Origin`.
    pub allowed_origin: String,
    /// Bearer credential for upstream; `None` when unset or blank.
    pub bearer_token: Option<String>,
    pub region: String,
    pub model_id: String,
    pub inference_profile_id: Option<String>,
    pub inference_profile_arn: Option<String>,
    /// Overrides the regional Bedrock runtime host (e.g. a VPC endpoint or a test double).
    pub endpoint_url: Option<String>,
}

/// Where the override values came from, for startup logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Environment only; no override file was found.
    Environment,
    /// Environment plus an override file; `loaded` counts keys actually taken from it.
    File { path: String, loaded: usize },
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Environment => write!(f, "environment"),
            ConfigSource::File { path, loaded } => {
                write!(f, "environment + {path} ({loaded} keys)")
            }
        }
    }
}

// Keep the credential out of logs.
impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("allowed_origin", &self.allowed_origin)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "<redacted>"),
            )
            .field("region", &self.region)
            .field("model_id", &self.model_id)
            .field("inference_profile_id", &self.inference_profile_id)
            .field("inference_profile_arn", &self.inference_profile_arn)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::from_vars(&HashMap::new())
    }
}

impl RelayConfig {
    /// Resolve configuration from the process environment and an optional
    /// override file. Values already in the environment are never replaced.
    pub fn load(env_file: Option<&Path>) -> (Self, ConfigSource) {
        let mut vars: HashMap<String, String> = std::env::vars().collect();
        let path = env_file.unwrap_or_else(|| Path::new(DEFAULT_ENV_FILE));
        let source = match merge_override_file(&mut vars, path) {
            Some(loaded) => ConfigSource::File {
                path: path.display().to_string(),
                loaded,
            },
            None => ConfigSource::Environment,
        };
        (Self::from_vars(&vars), source)
    }

    /// Build a config from an explicit key/value map, applying defaults.
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let port = match non_empty(vars, ENV_PORT) {
            Some(raw) => raw.parse::<u16>().unwrap_or_else(|_| {
                tracing::warn!(
                    "Ignoring invalid {}={:?}; using {}",
                    ENV_PORT,
                    raw,
                    DEFAULT_PORT
                );
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        Self {
            host: non_empty(vars, ENV_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            allowed_origin: non_empty(vars, ENV_ALLOWED_ORIGIN)
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
            bearer_token: non_empty(vars, ENV_BEARER_TOKEN),
            region: non_empty(vars, ENV_REGION).unwrap_or_else(|| DEFAULT_REGION.to_string()),
            model_id: non_empty(vars, ENV_MODEL_ID)
                .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            inference_profile_id: non_empty(vars, ENV_INFERENCE_PROFILE_ID),
            inference_profile_arn: non_empty(vars, ENV_INFERENCE_PROFILE_ARN),
            endpoint_url: non_empty(vars, ENV_ENDPOINT_URL),
        }
    }

    /// Bearer credential, if one is configured.
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    /// Base URL of the Bedrock runtime, without a trailing slash.
    pub fn endpoint_base(&self) -> String {
        match self.endpoint_url.as_deref() {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        }
    }

    /// `host:port` pair for binding the HTTP server.
    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn non_empty(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// Merge an override file into `vars` without replacing existing keys.
///
/// Returns `None` when the file does not exist, otherwise the number of keys
/// that were taken from the file.
pub fn merge_override_file(vars: &mut HashMap<String, String>, path: &Path) -> Option<usize> {
    let entries = read_override_file(path)?;
    let mut loaded = 0usize;
    for (key, value) in entries {
        if vars.contains_key(&key) {
            continue;
        }
        vars.insert(key, value);
        loaded += 1;
    }
    Some(loaded)
}

/// Read `key=value` pairs from an override file in file order.
///
/// dotenvy handles the usual syntax; if it rejects the file, fall back to a
/// tolerant line parser so one odd line does not discard the whole file.
pub fn read_override_file(path: &Path) -> Option<Vec<(String, String)>> {
    if !path.is_file() {
        return None;
    }

    let parsed = dotenvy::from_path_iter(path)
        .and_then(|iter| iter.collect::<std::result::Result<Vec<_>, _>>());
    match parsed {
        Ok(entries) => Some(entries),
        Err(err) => {
            tracing::debug!(
                "dotenvy could not parse {}: {}; using tolerant parser",
                path.display(),
                err
            );
            let text = std::fs::read_to_string(path).ok()?;
            Some(parse_env_lines(&text))
        }
    }
}

/// Tolerant `key=value` parser: blank lines, `#` comments and lines without
/// `=` are skipped; surrounding quotes are stripped.
pub fn parse_env_lines(text: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || !line.contains('=') {
            continue;
        }
        let mut parts = line.splitn(2, '=');
        if let (Some(k), Some(v)) = (parts.next(), parts.next()) {
            let key = k.trim();
            if key.is_empty() {
                continue;
            }
            let mut val = v.trim().to_string();
            if val.len() >= 2
                && ((val.starts_with('"') && val.ends_with('"'))
                    || (val.starts_with('\'') && val.ends_with('\'')))
            {
                val = val[1..val.len() - 1].to_string();
            }
            out.push((key.to_string(), val));
        }
    }
    out
}
