//! HTTP API for course evaluation summaries.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{Method, header};
use axum::routing::{MethodRouter, get, post};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};

pub mod error;
pub mod handlers;
pub mod models;
pub mod state;
pub mod upload;

pub use error::ApiError;
pub use state::AppState;

/// Build the router with CORS, the request body limit, panic recovery and
/// JSON fallbacks.
pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/test-key", api_route(post(handlers::test_key::test_key)))
        .route(
            "/api/process-text",
            api_route(post(handlers::process_text::process_text)),
        )
        .route("/api/upload", api_route(post(handlers::upload::upload)))
        .route(
            "/api/process-pdf-direct",
            api_route(post(handlers::direct::process_pdf_direct)),
        )
        .route("/api/health", api_route(get(handlers::health::health)))
        .fallback(handlers::not_found)
        .layer(body_limit)
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(cors)
        .with_state(state)
}

fn api_route(route: MethodRouter<Arc<AppState>>) -> MethodRouter<Arc<AppState>> {
    route
        .options(handlers::preflight)
        .fallback(handlers::method_not_allowed)
}
