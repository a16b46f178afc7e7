use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rate limit must allow at least one request per window")]
    ZeroRequests,
    #[error("rate limit window must be at least one second")]
    ZeroWindow,
}

/// Sliding-window limiter keyed by client identifier.
///
/// Every admitted request keeps its timestamp until it leaves the window, so
/// a client is never admitted more than `max_requests` times in any trailing
/// `window`. Expired timestamps are dropped when the client is next looked up.
pub struct RateLimiter {
    history: DashMap<String, Vec<Instant>>, // client -> admission times, oldest first
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_seconds: u64) -> Result<Self, ConfigError> {
        if max_requests == 0 {
            return Err(ConfigError::ZeroRequests);
        }
        if window_seconds == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(Self {
            history: DashMap::new(),
            max_requests: max_requests as usize,
            window: Duration::from_secs(window_seconds),
        })
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_allowed(&self, client_id: &str) -> bool {
        self.is_allowed_at(client_id, Instant::now())
    }

    /// Admission decision at a given instant. The entry guard is held for the
    /// whole prune-compare-append, so two callers for the same client can never
    /// both take the last slot.
    pub fn is_allowed_at(&self, client_id: &str, now: Instant) -> bool {
        let mut entry = self.history.entry(client_id.to_string()).or_default();

        // None when the monotonic clock is younger than the window: nothing expired
        if let Some(cutoff) = now.checked_sub(self.window) {
            entry.retain(|&t| t > cutoff);
        }

        if entry.len() < self.max_requests {
            entry.push(now);
            return true;
        }

        false
    }

    /// Whole seconds until the oldest recorded request leaves the window.
    /// Always within `0..=window`, and 0 for clients with no history.
    pub fn get_retry_after(&self, client_id: &str) -> u64 {
        self.retry_after_at(client_id, Instant::now())
    }

    pub fn retry_after_at(&self, client_id: &str, now: Instant) -> u64 {
        let Some(entry) = self.history.get(client_id) else {
            return 0;
        };
        let Some(oldest) = entry.iter().min().copied() else {
            return 0;
        };

        let remaining = (oldest + self.window).saturating_duration_since(now);
        let mut secs = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            secs += 1;
        }
        secs.min(self.window.as_secs())
    }

    // Clients currently holding a history entry
    pub fn tracked_clients(&self) -> usize {
        self.history.len()
    }
}
