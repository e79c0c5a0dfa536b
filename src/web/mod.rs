//! HTTP layer: router construction and the serving loop.
//!
//! The surface is small (the root slideshow, one artwork by name, and a
//! method guard), so the router takes a plain state struct instead of a
//! service registry.

use std::time::Duration;

use axum::Router;
use axum::routing::any;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::errors::AppError;
use crate::models::Gallery;

pub mod frame;
pub mod handlers;

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub gallery: Gallery,
    /// Pause between framed blocks when streaming the whole gallery.
    pub frame_delay: Duration,
}

/// Build the slideshow router. Routes use `any()` so the handlers can
/// answer non-GET methods with the short "Method not allowed" body instead
/// of axum's bare 405.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", any(handlers::slideshow))
        .route("/{name}", any(handlers::artwork))
        .fallback(handlers::fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped. A bind failure is fatal.
pub async fn serve(listen_addr: &str, state: AppState) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!(address = %listener.local_addr()?, "slideshow listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
