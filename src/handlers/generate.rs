use axum::{Json, extract::{Multipart, State}};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::entitlement::require_entitlement;
use crate::error::AppError;
use crate::handlers::client::{ClientId, fingerprint};
use crate::handlers::form::read_form;
use crate::metrics::{
    COLLAGE_TOTAL, GENERATION_LATENCY, RATE_LIMIT_CLIENTS, RATE_LIMITED_TOTAL, REQUEST_TOTAL,
};
use crate::models::GenerateResponse;
use crate::state::AppState;
use crate::stylist::assemble_collage;

// Style report plus hair collage for one uploaded photo.
// The photo only lives in memory for the duration of this call.
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    ClientId(client): ClientId,
    multipart: Multipart,
) -> Result<Json<GenerateResponse>, AppError> {
    REQUEST_TOTAL.inc();
    let client_tag = fingerprint(&client);

    let allowed = state.rate_limiter.is_allowed(&client);
    RATE_LIMIT_CLIENTS.set(state.rate_limiter.tracked_clients() as f64);
    if !allowed {
        RATE_LIMITED_TOTAL.inc();
        let retry_after = state.rate_limiter.get_retry_after(&client);
        warn!(client = %client_tag, retry_after, "Rate limit exceeded");
        return Err(AppError::RateLimited { retry_after });
    }

    require_entitlement(None).await?;

    let form = read_form(multipart).await?;
    let (photo, params) = form.validate(state.max_upload_bytes)?;
    let start_time = Instant::now();

    let report = state
        .model
        .style_report(&photo, &params)
        .await
        .map_err(|err| {
            error!(client = %client_tag, "Error generating style report: {err}");
            AppError::Generation
        })?;

    let hairstyles = report.hairstyle_names();
    let generated = state.model.hair_images(&photo, &hairstyles).await;

    // resizing and PNG encoding are CPU bound, keep them off the runtime threads
    let layout = state.collage_layout;
    let (hair_collage, source) =
        tokio::task::spawn_blocking(move || assemble_collage(generated, &hairstyles, &layout))
            .await
            .map_err(|err| {
                error!("Collage task panicked: {err}");
                AppError::Internal
            })?
            .map_err(|err| {
                error!(kind = ?err.kind(), "Placeholder collage failed: {err}");
                AppError::Generation
            })?;

    COLLAGE_TOTAL.with_label_values(&[source.as_str()]).inc();
    GENERATION_LATENCY.observe(start_time.elapsed().as_secs_f64());
    info!(
        client = %client_tag,
        occasion = params.occasion.as_str(),
        collage = source.as_str(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Style report generated"
    );

    Ok(Json(GenerateResponse {
        result: report,
        hair_collage,
    }))
}
