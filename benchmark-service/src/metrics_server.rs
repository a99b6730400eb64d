use std::net::SocketAddr;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROM_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder and serve `/metrics` on `bind_addr`.
pub fn init(bind_addr: &str) {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus metrics recorder");

    // A second call leaves the original handle in place.
    let _ = PROM_HANDLE.set(handle);

    let addr: SocketAddr = bind_addr
        .parse()
        .expect("invalid metrics bind address");

    tokio::spawn(async move {
        let app = Router::new().route("/metrics", get(render_metrics));

        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    tracing::error!(error = %e, "metrics server error");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to bind metrics listener");
            }
        }
    });
}

async fn render_metrics() -> String {
    PROM_HANDLE
        .get()
        .expect("Prometheus recorder not initialized")
        .render()
}
