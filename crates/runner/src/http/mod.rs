//! JSON HTTP surface
//!
//! - `GET /fulldata`: full pipeline state
//! - `GET /data`: state if anything changed since the last poll, else `null`
//! - `POST /tick`: advance one tick now
//! - `GET /model`: active model summary

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::TickResponse;

use crate::pipeline::Pipeline;
use axum::{
    Router,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Create the router
pub fn create_router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/fulldata", get(handlers::full_data))
        .route("/data", get(handlers::fresh_data))
        .route("/tick", post(handlers::tick))
        .route("/model", get(handlers::model))
        .with_state(pipeline)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(
    listener: TcpListener,
    pipeline: Arc<Pipeline>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        log::info!("[http] listening on http://{}", addr);
    }
    axum::serve(listener, create_router(pipeline))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Wait for the server task, then drain the pipeline
///
/// The pipeline is shut down even when the server failed; the server's
/// error is returned afterwards.
pub async fn finish(
    server: Option<JoinHandle<std::io::Result<()>>>,
    pipeline: &Pipeline,
) -> anyhow::Result<()> {
    let served = match server {
        Some(server) => match server.await {
            Ok(result) => result.map_err(anyhow::Error::from),
            Err(e) => Err(e.into()),
        },
        None => Ok(()),
    };
    pipeline.shutdown().await;
    served
}
