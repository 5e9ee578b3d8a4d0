//! HTTP binding of the receiver operations (axum).
//!
//! Routes take their target from query parameters (`directory`, `filename`,
//! `chunk`, `total`). Store work is blocking filesystem I/O and runs on
//! `spawn_blocking`. Errors are JSON `{"error", "code"}` bodies.

mod error;
mod handlers;

pub use error::{ApiError, ErrorResponse};

use std::future::Future;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::store::Receiver;

#[derive(Clone)]
pub struct ReceiverState {
    pub receiver: Receiver,
}

/// Build the receiver router. Request bodies are capped at twice the chunk limit
/// so base64 payloads of a maximum-size chunk still fit.
pub fn router(receiver: Receiver) -> Router {
    let body_limit = usize::try_from(receiver.store().max_chunk_bytes().saturating_mul(2))
        .unwrap_or(usize::MAX);
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/chunks",
            post(handlers::upload_chunk).get(handlers::probe_chunk),
        )
        .route("/api/files", get(handlers::probe_file))
        .route("/api/merge", post(handlers::merge))
        .route("/api/digest", get(handlers::digest))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(ReceiverState { receiver })
}

pub async fn bind(listen: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, receiver: Receiver, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("listener has no local address")?;
    tracing::info!(
        %addr,
        root = %receiver.store().root().display(),
        max_chunk_bytes = receiver.store().max_chunk_bytes(),
        "receiver listening"
    );
    axum::serve(listener, router(receiver))
        .with_graceful_shutdown(shutdown)
        .await
        .context("receiver server failed")?;
    tracing::info!("receiver shut down");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
