mod client;
mod form;
mod generate;
mod health;
mod metrics;

use generate::generate_handler;
use health::health_handler;
use metrics::metrics_handler;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

// multipart framing and the text fields on top of the photo itself
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/generate", post(generate_handler))
        .route("/metrics", get(metrics_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
