//! Server configuration read from the environment.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use governor::{Quota, RateLimiter};

/// Global (unkeyed) request rate limiter.
pub type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

const DEFAULT_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// CORS whitelist.
    pub allowed_origins: Vec<HeaderValue>,
    pub rate_limit: RateLimitConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3005,
            allowed_origins: parse_allowed_origins(DEFAULT_ORIGINS),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Read `HOST`, `PORT`, `ALLOWED_ORIGINS` and the `RATE_LIMIT_*` variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let origins = std::env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ORIGINS.into());
        let mut allowed_origins = parse_allowed_origins(&origins);
        if allowed_origins.is_empty() {
            allowed_origins = defaults.allowed_origins;
        }

        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            allowed_origins,
            rate_limit: RateLimitConfig::from_env(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a comma-separated origin list, skipping invalid entries.
pub fn parse_allowed_origins(origins: &str) -> Vec<HeaderValue> {
    origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}

/// Global rate limit settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Requests allowed per period.
    pub requests: u32,
    pub period_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests: 100,
            period_secs: 60,
        }
    }
}

impl RateLimitConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("RATE_LIMIT_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.enabled),
            requests: std::env::var("RATE_LIMIT_REQUESTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.requests),
            period_secs: std::env::var("RATE_LIMIT_PERIOD_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.period_secs),
        }
    }

    /// Build the limiter. `None` when disabled or when the quota is zero.
    ///
    /// The bucket holds `requests` cells and refills one cell every
    /// `period_secs / requests`, so a drained limiter is back to full
    /// capacity after one period.
    pub fn limiter(&self) -> Option<Arc<GlobalRateLimiter>> {
        if !self.enabled {
            return None;
        }
        let burst = NonZeroU32::new(self.requests)?;
        let replenish = Duration::from_secs(self.period_secs) / self.requests;
        let quota = Quota::with_period(replenish)?.allow_burst(burst);
        Some(Arc::new(RateLimiter::direct(quota)))
    }
}
