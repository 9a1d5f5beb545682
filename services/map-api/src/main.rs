//! Map shading API service.

use std::{env, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use map_api::handlers::build_router;
use map_api::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "map-api")]
#[command(about = "Map tile, image and GeoJSON server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    listen: String,

    /// Source configuration file
    #[arg(short, long, env = "MAP_CONFIG", default_value = "sources.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long)]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    let threads = args.worker_threads.or_else(|| {
        env::var("TOKIO_WORKER_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
    });
    if let Some(threads) = threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .json()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;
    info!("Prometheus metrics exporter initialized");

    info!(config = %args.config.display(), "Loading sources");
    let config = args.config.clone();
    let state = tokio::task::spawn_blocking(move || AppState::from_config(&config))
        .await?
        .with_context(|| format!("failed to load sources from {}", args.config.display()))?;
    let state = Arc::new(state.with_prometheus(prometheus_handle));

    let app = build_router(state);

    let addr: SocketAddr = args.listen.parse()?;
    info!(%addr, "Starting map API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
