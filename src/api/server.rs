use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::services;
use crate::observability::Metrics;

/// Mount `/health` and `/metrics` next to a role's routes and add the shared middleware
pub fn service(routes: Router, role: &'static str, metrics: Arc<Metrics>) -> Router {
    routes.merge(services::router(role, metrics)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            // Gzip request bodies are decoded before they reach a handler
            .layer(RequestDecompressionLayer::new()),
    )
}

/// Serve `app` until Ctrl+C or SIGTERM
pub async fn serve(listener: TcpListener, app: Router, role: &'static str) -> std::io::Result<()> {
    let address = listener.local_addr()?;
    info!(%address, role, "pixelq listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
