//! Shared handler state.

use std::sync::Arc;

use dadaba_core::{NotificationRepository, OrderRepository};
use dadaba_notify::{FanoutEmitter, PushGateway};

use crate::config::{GlobalRateLimiter, RateLimitConfig};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub notifications: Arc<dyn NotificationRepository>,
    pub orders: Arc<dyn OrderRepository>,
    /// Live connections; also verifies bearer credentials.
    pub gateway: PushGateway,
    pub emitter: FanoutEmitter,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

impl AppState {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        orders: Arc<dyn OrderRepository>,
        gateway: PushGateway,
        emitter: FanoutEmitter,
    ) -> Self {
        Self {
            notifications,
            orders,
            gateway,
            emitter,
            rate_limiter: None,
        }
    }

    pub fn with_rate_limit(mut self, config: &RateLimitConfig) -> Self {
        self.rate_limiter = config.limiter();
        self
    }
}
