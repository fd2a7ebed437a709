//! Video saver server binary.
//!
//! Runs the HTTP API and the single pipeline worker in one process.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vsave_api::{create_router, metrics, ApiConfig, AppState};
use vsave_ledger::SqliteLedger;
use vsave_queue::{DispatchQueue, JobService};
use vsave_storage::{ObjectStore, S3Client};
use vsave_worker::{JobExecutor, Pipeline, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing()?;

    // Install rustls crypto provider (required for rustls 0.23+)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider already installed");
    }

    info!("Starting vsave-api");

    let config = ApiConfig::from_env();
    let worker_config = WorkerConfig::from_env();
    info!("API config: host={}, port={}", config.host, config.port);

    let ledger = Arc::new(
        SqliteLedger::from_env()
            .await
            .context("Failed to open job ledger")?,
    );
    let storage: Arc<dyn ObjectStore> =
        Arc::new(S3Client::from_env().context("Failed to configure S3 client")?);

    let (dispatcher, receiver) = DispatchQueue::channel();
    let jobs = JobService::new(ledger.clone(), dispatcher);

    if config.recover_queued_jobs {
        let recovered = jobs
            .recover_queued()
            .await
            .context("Failed to recover queued jobs")?;
        if recovered > 0 {
            info!("Re-enqueued {} job(s) left queued by a previous run", recovered);
        }
    }

    let pipeline = Pipeline::from_config(worker_config.clone(), Arc::clone(&storage))
        .context("Failed to build pipeline")?;
    let worker = tokio::spawn(JobExecutor::new(pipeline, ledger.clone(), receiver).run());

    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("Failed to install metrics recorder")?)
    } else {
        None
    };

    let state = AppState::new(config.clone(), jobs.clone(), storage);
    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Let the worker finish what is already queued, bounded by the timeout.
    jobs.dispatcher().shutdown();
    match tokio::time::timeout(worker_config.shutdown_timeout, worker).await {
        Ok(Ok(processed)) => info!("Worker drained after {} job(s)", processed),
        Ok(Err(e)) => error!("Worker task failed: {}", e),
        Err(_) => warn!(
            "Worker did not stop within {:?}; remaining jobs stay queued",
            worker_config.shutdown_timeout
        ),
    }

    ledger.close().await;
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("vsave=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
