use std::path::PathBuf;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::Parser;

use bedrock_relay::config::RelayConfig;
use bedrock_relay::server::{config_routes, cors_headers, AppState};
use bedrock_relay::util::{build_http_client_from_env, init_tracing};

/// Relay browser chat turns to AWS Bedrock.
#[derive(Debug, Parser)]
#[command(name = "bedrock-relay", version, about)]
struct Cli {
    /// Override file with KEY=value lines (never replaces existing env vars).
    #[arg(long, env = "ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Listen port (defaults to BACKEND_PORT or 8088).
    #[arg(long)]
    port: Option<u16>,

    /// Bind interface (defaults to BACKEND_HOST or 0.0.0.0).
    #[arg(long)]
    host: Option<String>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let (mut config, source) = RelayConfig::load(cli.env_file.as_deref());
    tracing::info!("Configuration loaded from: {}", source);

    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }

    if config.bearer_token().is_none() {
        tracing::warn!(
            "AWS_BEARER_TOKEN_BEDROCK is not set; /api/chat will fail until it is configured"
        );
    }
    tracing::info!(
        "Relaying to model {} in {} (allowed origin {})",
        config.model_id,
        config.region,
        config.allowed_origin
    );

    let bind = config.bind_addr();
    let state = AppState::with_bedrock(config, build_http_client_from_env());

    tracing::info!("Bedrock relay listening on http://{}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors_headers(&state.config))
            .configure(config_routes)
    })
    .bind(bind.clone())
    .with_context(|| format!("failed to bind {}:{}", bind.0, bind.1))?
    .run()
    .await
    .context("server error")?;

    Ok(())
}
