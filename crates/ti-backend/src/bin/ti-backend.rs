//! CLI entry point (spec.md §6 "Process interface"). Grounded on
//! `original_source/totalimpact/backend.py`'s `main()` optparse flags and
//! `botticelli_actor::bin::actor_server`'s `clap::Parser` + `tracing_subscriber`
//! startup sequence.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use ti_backend::{build_metrics_queues, build_registry, BackendConfig, Journal, WorkerContext};
use ti_core::Shutdown;
use ti_http::Fetcher;
use ti_queue::{InMemoryQueue, Queue};
use tracing_subscriber::EnvFilter;

/// TotalImpact-Backend: provider-driven alias/biblio/metrics ingestion.
#[derive(Parser, Debug)]
#[command(name = "ti-backend")]
#[command(about = "Work-dispatch and retry/rate-control engine for the altmetrics ingestion backend")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short = 'c', long, default_value = "ti-backend.toml")]
    config: PathBuf,

    /// PID-file path for daemon mode.
    #[arg(short = 'p', long)]
    pid_file: Option<PathBuf>,

    /// Startup log path.
    #[arg(short = 's', long)]
    startup_log: Option<PathBuf>,

    /// Runtime log path.
    #[arg(short = 'l', long, default_value = "logs/backend.log")]
    log_file: PathBuf,

    /// Detach and run as a daemon. Forking a running tokio runtime is
    /// unsound, so this flag does not double-fork: detachment is the
    /// caller's responsibility (e.g. `setsid`, systemd, a process
    /// supervisor). Accepted for CLI compatibility; only changes the
    /// default log destination. See DESIGN.md.
    #[arg(short = 'd', long)]
    daemon: bool,

    /// Error journal path (JSONL, spec.md §7 "All errors are journalled").
    #[arg(long, default_value = "logs/errors.jsonl")]
    journal: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if args.daemon {
        tracing::info!(
            pid_file = ?args.pid_file,
            log_file = %args.log_file.display(),
            "daemon mode requested; detachment is left to the process supervisor"
        );
    }

    let config = BackendConfig::load(&args.config)?;
    let registry = Arc::new(build_registry(&config));
    let metrics_queues = build_metrics_queues(&config, &registry);
    let alias_queue: Arc<dyn Queue> = Arc::new(InMemoryQueue::new());

    let shutdown = Shutdown::new();
    let ctx = Arc::new(WorkerContext {
        registry,
        fetcher: Arc::new(Fetcher::new()),
        journal: Arc::new(Journal::new(args.journal)),
        shutdown: shutdown.clone(),
    });

    let handles =
        ti_backend::spawn_workers(ctx, config.aliases.workers, alias_queue, metrics_queues);

    ti_backend::signals::install(shutdown).await;

    tracing::info!("shutdown signalled, waiting for workers to drain");
    for handle in handles {
        let _ = handle.await;
    }
    tracing::info!("all workers stopped, exiting");

    Ok(())
}
