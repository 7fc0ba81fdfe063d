//! CampaignScope server — marketing-campaign analysis orchestration API.
//!
//! Exposes HTTP endpoints for triggering landing-page analysis runs,
//! polling per-section progress, and re-triggering competitor enhancement.

mod api;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing::info;
use url::Url;

use campaignscope_core::HttpStageExecutor;
use campaignscope_enhancer::Enhancer;
use campaignscope_shared::load_config;
use campaignscope_storage::Storage;

use api::AppState;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// CampaignScope — analyze a product URL into a full campaign brief.
#[derive(Parser)]
#[command(
    name = "campaignscope-server",
    version,
    about = "HTTP server orchestrating campaign analysis sessions.",
    long_about = None,
)]
struct Cli {
    /// Bind host (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Database path (overrides config).
    #[arg(long)]
    db: Option<PathBuf>,

    /// Bulk analysis endpoint (overrides config).
    #[arg(long)]
    analysis_endpoint: Option<String>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "campaignscope=info",
        1 => "campaignscope=debug",
        _ => "campaignscope=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = load_config()?;

    let host = cli.host.unwrap_or_else(|| config.server.host.clone());
    let port = cli.port.unwrap_or(config.server.port);
    let db_path = match cli.db {
        Some(path) => path,
        None => config.server.resolve_db_path()?,
    };
    let endpoint_raw = cli
        .analysis_endpoint
        .unwrap_or_else(|| config.analysis.endpoint.clone());
    let endpoint = Url::parse(&endpoint_raw)
        .map_err(|e| eyre!("invalid analysis endpoint {endpoint_raw:?}: {e}"))?;

    let storage = Arc::new(Storage::open(&db_path).await?);
    let executor =
        HttpStageExecutor::new(endpoint, Duration::from_secs(config.analysis.timeout_secs))?;
    let enhancer = Arc::new(Enhancer::new(config.enhancement.clone())?);

    let state = Arc::new(AppState {
        storage,
        executor,
        enhancer,
    });

    let app = api::build_router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("failed to bind {addr}: {e}"))?;
    info!(addr = %listener.local_addr()?, db = %db_path.display(), "campaignscope server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
    }
}
