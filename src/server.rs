//! Metrics and status HTTP server

use crate::{
    defaults::HTTP_REQUEST_TIMEOUT,
    error::{AppError, Result},
    output::{render_metrics, StatusTemplate, HTML_CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE},
    store::MetricsStore,
    types::Signal,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;

/// Shared state of the request handlers
#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<MetricsStore>,
    pub template: Arc<StatusTemplate>,
}

/// Router serving `/metrics` and `/status`; everything else is 404
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/status", get(status_handler))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(TimeoutLayer::new(HTTP_REQUEST_TIMEOUT))
}

/// Bound metrics server
pub struct MetricsServer {
    listener: TcpListener,
    router: Router,
}

impl MetricsServer {
    /// Bind to `0.0.0.0:<port>`. Port 0 picks a free port.
    pub async fn bind(port: u16, state: ServerState) -> Result<Self> {
        let address = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(address)
            .await
            .map_err(|e| AppError::io(format!("Failed to bind metrics server to {}: {}", address, e)))?;

        Ok(Self {
            listener,
            router: router(state),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until a shutdown signal is received
    pub async fn serve(self, mut shutdown: broadcast::Receiver<Signal>) -> Result<()> {
        let address = self.local_addr()?;
        tracing::info!("Prometheus metrics server started on port {}", address.port());

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Metrics server received shutdown signal");
            })
            .await
            .map_err(|e| AppError::io(format!("Metrics server failed: {}", e)))?;

        tracing::info!("Metrics server stopped");
        Ok(())
    }
}

async fn metrics_handler(State(state): State<ServerState>) -> Response {
    let body = render_metrics(&state.store.snapshot());
    ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body).into_response()
}

async fn status_handler(State(state): State<ServerState>) -> Response {
    let body = state.template.render(&state.store.snapshot().status());
    ([(header::CONTENT_TYPE, HTML_CONTENT_TYPE)], body).into_response()
}

async fn not_found_handler() -> Response {
    StatusCode::NOT_FOUND.into_response()
}
