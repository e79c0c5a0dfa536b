//! HTTP handlers for the slideshow surface.
//!
//! Three paths, all read-only: the root slideshow, a single named artwork,
//! and a fallback that keeps the 405/404 contract for any other path. The
//! gallery's shared lock is held for the entire response, pacing sleeps
//! included; population has finished by the time requests arrive, so the
//! write side never contends.

use std::convert::Infallible;

use async_stream::stream;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use super::{AppState, frame};

fn text_content_type() -> [(header::HeaderName, &'static str); 1] {
    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")]
}

/// `GET /`: stream every rendered artwork as a paced slideshow.
pub async fn slideshow(State(state): State<AppState>, method: Method) -> Response {
    if method != Method::GET {
        return method_not_allowed();
    }

    let artworks = state.gallery.read_owned().await;
    let delay = state.frame_delay;
    debug!(artworks = artworks.len(), "starting slideshow response");

    // One chunk per framed block; each yield is written and flushed on its
    // own, which is what keeps a terminal client animating instead of
    // buffering. The owned read guard rides inside the stream, so the
    // shared lock is held until the body finishes or the client hangs up.
    let body = stream! {
        let mut first = true;
        for artwork in artworks.iter() {
            // Artworks that never completed the pipeline have no frame and
            // are skipped rather than served blank.
            let Some(rendered) = artwork.frame() else {
                continue;
            };
            let block = frame::frame_block(artwork.name(), rendered);
            let chunk = if first {
                first = false;
                let mut prefixed = BytesMut::with_capacity(frame::RESET.len() + block.len());
                prefixed.put_slice(frame::RESET);
                prefixed.put_slice(&block);
                prefixed.freeze()
            } else {
                block
            };
            yield Ok::<Bytes, Infallible>(chunk);
            tokio::time::sleep(delay).await;
        }
    };

    (
        StatusCode::OK,
        text_content_type(),
        Body::from_stream(body),
    )
        .into_response()
}

/// `GET /{name}`: one framed block for a single artwork.
pub async fn artwork(
    State(state): State<AppState>,
    method: Method,
    Path(name): Path<String>,
) -> Response {
    if method != Method::GET {
        return method_not_allowed();
    }

    let artworks = state.gallery.read_owned().await;
    let found = artworks
        .iter()
        .find(|artwork| artwork.name() == name)
        .and_then(|artwork| artwork.frame().map(|frame| (artwork.name(), frame)));

    match found {
        Some((name, rendered)) => {
            (text_content_type(), frame::frame_block(name, rendered)).into_response()
        }
        None => not_found(&name),
    }
}

/// Anything that matched no route: still honor the method contract, then
/// report the missing artwork by its path.
pub async fn fallback(method: Method, uri: axum::http::Uri) -> Response {
    if method != Method::GET {
        return method_not_allowed();
    }
    not_found(uri.path().trim_start_matches('/'))
}

fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response()
}

fn not_found(name: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("Artwork {name} not found")).into_response()
}
