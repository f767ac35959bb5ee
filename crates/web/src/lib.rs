//! Browser form for submitting a video link and phone number.
//!
//! [`build_app`] returns the axum `Router`; [`serve`] binds it. Each POST
//! runs one pipeline job and re-renders the form with the outcome.

pub mod error;
pub mod form;
mod templates;

use std::{net::SocketAddr, sync::Arc};

use {
    axum::{Router, routing::get},
    clipcast_pipeline::Pipeline,
    tokio::net::TcpListener,
    tracing::info,
};

pub use error::{Error, Result};

/// Routes: `GET /` form, `POST /` submit, `GET /health`.
pub fn build_app(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/", get(form::index_handler).post(form::submit_handler))
        .route("/health", get(form::health_handler))
        .with_state(pipeline)
}

/// Parse `bind` and `port` into a socket address.
pub fn listen_addr(bind: &str, port: u16) -> Result<SocketAddr> {
    let host = bind.trim().trim_start_matches('[').trim_end_matches(']');
    let ip = host
        .parse()
        .map_err(|_| Error::Address(format!("{bind}:{port}")))?;
    Ok(SocketAddr::new(ip, port))
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, pipeline: Arc<Pipeline>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| Error::Bind { addr, source })?;
    let local = listener.local_addr()?;
    info!(addr = %local, "web form listening on http://{local}");
    axum::serve(listener, build_app(pipeline)).await?;
    Ok(())
}
