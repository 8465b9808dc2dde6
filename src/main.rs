use anyhow::Result;
use hostmon::*;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::{broadcast, watch};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(
        service = version::NAME,
        version = version::VERSION,
        data_dir = %app_config.storage.data_dir.display(),
        "starting"
    );

    let history_repo = history_repo::HistoryRepo::open(
        &app_config.storage.data_dir,
        app_config.storage.retention(),
    )?;
    if let Err(e) = backfill::run_backfill(&history_repo).await {
        tracing::warn!(error = %e, "startup rollup failed");
    }

    let source = sysinfo_repo::SysinfoRepo::new(&app_config.monitoring.disk_mount);
    let monitor = Arc::new(monitor::Monitor::new(Box::new(source), history_repo));

    let (tx, _) = broadcast::channel::<models::Snapshot>(app_config.monitoring.broadcast_capacity);
    let ws_connections = Arc::new(AtomicUsize::new(0));
    let (sampler_shutdown_tx, sampler_shutdown_rx) = watch::channel(false);
    let (rollup_shutdown_tx, rollup_shutdown_rx) = watch::channel(false);

    let sampler_handle = worker::spawn(
        worker::WorkerDeps {
            monitor: monitor.clone(),
            tx: tx.clone(),
            ws_connections: ws_connections.clone(),
            shutdown_rx: sampler_shutdown_rx,
        },
        worker::WorkerConfig {
            sample_interval_ms: app_config.monitoring.sample_interval_ms,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );
    let rollup_handle = aggregation_worker::spawn(monitor.clone(), rollup_shutdown_rx);

    let app = routes::app(monitor, tx, ws_connections, app_config.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let served = tokio::select! {
        result = axum::serve(listener, app) => result,
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            Ok(())
        }
    };

    // Sampler first so no tick lands after the final flush.
    let _ = sampler_shutdown_tx.send(true);
    let _ = sampler_handle.await;
    let _ = rollup_shutdown_tx.send(true);
    let _ = rollup_handle.await;

    served?;
    Ok(())
}
