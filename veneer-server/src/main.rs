//! Server binary: load the configuration, connect the Elasticsearch
//! client, and serve the legacy API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use veneer::config::Settings;
use veneer::es::{EsClient, SearchBackend};
use veneer_api::{api_router, AppState};

#[derive(Parser)]
#[command(
    name = "veneer-server",
    version,
    about = "Compatibility search layer between the genomics data portal and Elasticsearch"
)]
struct Args {
    /// Configuration file; written with defaults when missing
    #[arg(long, default_value = "veneer.toml", env = "VENEER_CONFIG")]
    config: PathBuf,

    /// Override the configured listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured listen port
    #[arg(long)]
    port: Option<u16>,
}

fn bind_addr(settings: &Settings, args: &Args) -> String {
    let (host, port) = settings
        .server
        .bind_addr
        .rsplit_once(':')
        .map(|(host, port)| (host.to_string(), port.to_string()))
        .unwrap_or_else(|| (settings.server.bind_addr.clone(), "8200".to_string()));
    let host = args.host.clone().unwrap_or(host);
    let port = args.port.map(|port| port.to_string()).unwrap_or(port);
    format!("{host}:{port}")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,veneer=debug".to_string()),
    );
    tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer()).init();

    let args = Args::parse();
    let settings = Settings::load_or_create(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;
    let addr = bind_addr(&settings, &args);

    let backend = Arc::new(EsClient::from_settings(&settings.elasticsearch)?);
    // a cold cluster is not fatal, searches degrade to 502 until it returns
    if !backend.ping().await {
        tracing::warn!(url = %settings.elasticsearch.url, "search backend unreachable at startup");
    }

    let state = AppState::new(backend, Arc::new(settings));
    let app = api_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "veneer listening");
    axum::serve(listener, app).await?;
    Ok(())
}
