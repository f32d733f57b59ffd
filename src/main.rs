use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use fleet_sync::join_poll_loops;
use fleet_sync::poll_chains_runtime;
use fleet_sync::poll_deployments_update;
use fleet_sync::poll_engines_state;
use fleet_sync::spawn_poll_loop;
use fleet_sync::start_server;
use fleet_sync::Error;
use fleet_sync::FleetView;
use fleet_sync::Result;
use fleet_sync::SyncConfig;
use fleet_sync::SyncService;
use fleet_sync::CHAINS_RUNTIME_RESOURCE;
use fleet_sync::DEPLOYMENTS_UPDATE_RESOURCE;
use fleet_sync::ENGINES_STATE_RESOURCE;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let settings = SyncConfig::new()?.validate()?;

    // Initializing Logs
    let _guard = init_observability(&settings.log_dir)?;
    info!("Starting with {:?}", settings);

    // Initializing Shutdown Signal
    let (graceful_tx, graceful_rx) = watch::channel(());

    if settings.monitoring.prometheus_enabled {
        tokio::spawn(start_server(settings.monitoring.prometheus_port, graceful_rx.clone()));
    }

    let service = Arc::new(SyncService::connect(&settings)?);
    let view = Arc::new(FleetView::default());

    let engines = service.get_engines_state_safe().await;
    info!("{} engine(s) reporting at startup", engines.len());

    let handles = vec![
        spawn_poll_loop(
            ENGINES_STATE_RESOURCE,
            {
                let (service, view) = (service.clone(), view.clone());
                move || {
                    let (service, view) = (service.clone(), view.clone());
                    async move { poll_engines_state(&service, &view).await }
                }
            },
            settings.retry.poll,
            graceful_rx.clone(),
        ),
        spawn_poll_loop(
            DEPLOYMENTS_UPDATE_RESOURCE,
            {
                let (service, view) = (service.clone(), view.clone());
                move || {
                    let (service, view) = (service.clone(), view.clone());
                    async move { poll_deployments_update(&service, &view).await }
                }
            },
            settings.retry.poll,
            graceful_rx.clone(),
        ),
        spawn_poll_loop(
            CHAINS_RUNTIME_RESOURCE,
            {
                let (service, view) = (service.clone(), view.clone());
                move || {
                    let (service, view) = (service.clone(), view.clone());
                    async move { poll_chains_runtime(&service, &view).await }
                }
            },
            settings.retry.poll,
            graceful_rx.clone(),
        ),
    ];

    info!("Application started. Waiting for CTRL+C signal...");
    // Listen on Shutdown Signal
    tokio::spawn(async {
        if let Err(e) = graceful_shutdown(graceful_tx).await {
            error!("Failed to shutdown: {:?}", e);
        }
    });

    let joined = join_poll_loops(handles).await;

    info!(
        "Exiting: {} engine(s), {} chain(s) with runtime properties, deployments modified at {}",
        view.engines().len(),
        view.chains_runtime().len(),
        view.deployments_timestamp()
    );
    joined
}

async fn graceful_shutdown(graceful_tx: watch::Sender<()>) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
    }

    graceful_tx.send(()).map_err(|e| {
        error!("Failed to send shutdown signal: {}", e);
        Error::SignalSenderClosed(format!("Failed to send shutdown signal: {}", e))
    })?;

    info!("Shutdown completed");
    Ok(())
}

fn init_observability(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("fleet-sync.log"))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(base_subscriber).init();

    Ok(guard)
}
