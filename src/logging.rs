use tracing_subscriber::EnvFilter;

// HTTP client internals are only interesting when something breaks
const QUIET_TARGETS: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn"];

fn default_directives(level: &str) -> String {
    let level = match level.trim().to_lowercase().as_str() {
        "warning" => "warn".to_string(),
        l @ ("trace" | "debug" | "info" | "warn" | "error" | "off") => l.to_string(),
        _ => "info".to_string(),
    };
    std::iter::once(level.as_str())
        .chain(QUIET_TARGETS.iter().copied())
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_normalised() {
        assert_eq!(
            default_directives("DEBUG"),
            "debug,hyper=warn,hyper_util=warn,reqwest=warn"
        );
        assert!(default_directives("warning").starts_with("warn,"));
        assert!(default_directives("chatty").starts_with("info,"));
    }
}
