use std::sync::Arc;

use crate::collage::GridLayout;
use crate::rate_limit::RateLimiter;
use crate::stylist::StyleModel;

// app's shared state, built once at startup
pub struct AppState {
    pub model: Arc<dyn StyleModel>,
    pub rate_limiter: RateLimiter,
    pub collage_layout: GridLayout, // geometry of composed and placeholder collages
    pub max_upload_bytes: usize,
}
