use clap::Parser;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "stylist-gateway")]
#[command(about = "AI personal stylist API: style reports and hairstyle collages")]
pub struct Args {
    // Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    // Only origin allowed by CORS
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:5173")]
    pub frontend_url: String,

    // Rate limit max requests per window
    #[arg(long, env = "RATE_LIMIT_REQUESTS", default_value_t = 10)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECONDS", default_value_t = 3600)]
    pub rate_window: u64,

    #[arg(long, env = "GEMINI_API_KEY", default_value = "", hide_env_values = true)]
    pub gemini_api_key: String,

    #[arg(
        long,
        env = "GEMINI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com"
    )]
    pub gemini_base_url: String,

    // Model producing the JSON style report
    #[arg(long, env = "GEMINI_TEXT_MODEL", default_value = "gemini-2.5-flash")]
    pub text_model: String,

    // Model asked for the hairstyle collage
    #[arg(long, env = "GEMINI_IMAGE_MODEL", default_value = "gemini-2.5-flash-image")]
    pub image_model: String,

    // Upstream request timeout in seconds
    #[arg(long, env = "GEMINI_TIMEOUT_SECONDS", default_value_t = 90)]
    pub request_timeout: u64,

    // Largest accepted photo (8MB)
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 8 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    // Used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}
