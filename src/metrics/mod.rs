use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use warp::Filter;
use warp::Rejection;
use warp::Reply;


lazy_static! {
    pub static ref STORE_REQUESTS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("kv_store_requests_total", "Requests sent to the KV store"),
        &["op"]
    )
    .expect("metric can not be created");

    pub static ref WATCH_CHANGES_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("kv_watch_changes_total", "Watch polls that observed an index change"),
        &["resource"]
    )
    .expect("metric can not be created");

    pub static ref TXN_CHUNKS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("kv_txn_chunks_total", "Transaction chunks by outcome"),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref DECODE_FAILURES_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("kv_decode_failures_total", "Entries that could not be decoded"),
        &["policy"]
    )
    .expect("metric can not be created");

    pub static ref INDEX_ROLLBACKS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("kv_index_rollbacks_total", "Watch index rollbacks"),
        &["resource"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

pub(crate) fn register_custom_metrics(registry: &Registry) -> prometheus::Result<()> {
    registry.register(Box::new(STORE_REQUESTS_METRIC.clone()))?;
    registry.register(Box::new(WATCH_CHANGES_METRIC.clone()))?;
    registry.register(Box::new(TXN_CHUNKS_METRIC.clone()))?;
    registry.register(Box::new(DECODE_FAILURES_METRIC.clone()))?;
    registry.register(Box::new(INDEX_ROLLBACKS_METRIC.clone()))?;
    Ok(())
}

/// Serves `/metrics` until `shutdown_signal` fires
pub async fn start_server(
    port: u16,
    mut shutdown_signal: watch::Receiver<()>,
) {
    if let Err(e) = register_custom_metrics(&REGISTRY) {
        error!("could not register metrics: {}", e);
    }

    let metrics_route = warp::path!("metrics")
        .map(|| REGISTRY.clone())
        .and_then(metrics_handler);

    info!("metrics server listening on port {}", port);
    let (_, server) = warp::serve(metrics_route).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
        let _ = shutdown_signal.changed().await;
    });
    server.await;
}

async fn metrics_handler(registry: Registry) -> Result<impl Reply, Rejection> {
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    };
    let res = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    };
    Ok(res)
}
