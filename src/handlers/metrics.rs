use prometheus::{Encoder, TextEncoder};
use tracing::error;

use crate::error::AppError;

pub async fn metrics_handler() -> Result<String, AppError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).map_err(|err| {
        error!("Failed to encode metrics: {err}");
        AppError::Internal
    })?;
    String::from_utf8(buffer).map_err(|_| AppError::Internal)
}
