use anyhow::Context;
use axum::http::{HeaderValue, Method};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

mod collage;
mod config;
mod entitlement;
mod error;
mod gemini;
mod handlers;
mod logging;
mod metrics;
mod models;
mod prompts;
mod rate_limit;
mod state;
mod stylist;

#[cfg(test)]
mod tests;

use collage::GridLayout;
use config::Args;
use gemini::GeminiClient;
use rate_limit::RateLimiter;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional, real environment variables take precedence
    dotenvy::dotenv().ok();
    let args = Args::parse();
    logging::init_logging(&args.log_level);

    let rate_limiter = RateLimiter::new(args.rate_limit, args.rate_window)
        .inspect_err(|err| error!("Invalid rate limit configuration: {err}"))?;

    if args.gemini_api_key.is_empty() {
        warn!("GEMINI_API_KEY is not set, model calls will be rejected upstream");
    }
    let model = GeminiClient::new(
        &args.gemini_base_url,
        &args.gemini_api_key,
        &args.text_model,
        &args.image_model,
        Duration::from_secs(args.request_timeout),
    )
    .context("failed to build model client")?;

    // creating shared state
    let state = Arc::new(AppState {
        model: Arc::new(model),
        rate_limiter,
        collage_layout: GridLayout::default(),
        max_upload_bytes: args.max_upload_bytes,
    });

    let origin: HeaderValue = args
        .frontend_url
        .parse()
        .with_context(|| format!("invalid FRONTEND_URL {:?}", args.frontend_url))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    info!(
        "Rate limit: {} requests per {} seconds",
        state.rate_limiter.max_requests(),
        state.rate_limiter.window().as_secs()
    );

    let app = handlers::router(state).layer(cors);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Stylist API running on http://{addr}");
    info!("Text model: {}, image model: {}", args.text_model, args.image_model);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;
    Ok(())
}
