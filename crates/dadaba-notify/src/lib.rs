//! # dadaba-notify
//!
//! Live push delivery and order notification fan-out for dadaba.
//!
//! This crate provides:
//! - [`PushGateway`]: authenticated live connections, one bounded outbox each
//! - [`FanoutEmitter`]: one persisted notification per administrator, pushed
//!   after it is stored, plus a best-effort email
//! - [`JwtVerifier`]: bearer credential verification against the user table
//! - SMTP and no-op [`Mailer`] implementations
//! - In-memory stores used by the test suites
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use dadaba_notify::{FanoutConfig, FanoutEmitter, GatewayConfig, JwtVerifier, PushGateway};
//!
//! let verifier = Arc::new(JwtVerifier::from_env(db.users.clone())?);
//! let gateway = PushGateway::new(verifier, GatewayConfig::from_env());
//! let emitter = FanoutEmitter::new(
//!     db.notifications.clone(),
//!     db.users.clone(),
//!     Arc::new(gateway.clone()),
//!     dadaba_notify::mailer_from_env(),
//!     FanoutConfig::from_env()?,
//! );
//!
//! // After an order commits:
//! emitter.spawn(OrderEvent::created(&order));
//! ```

pub mod auth;
pub mod emitter;
pub mod gateway;
pub mod mailer;
pub mod memory;

// Re-export core types
pub use dadaba_core::*;

pub use auth::{extract_bearer_token, Claims, JwtVerifier};
pub use emitter::{FanoutConfig, FanoutEmitter, FanoutReport, PushTargeting};
pub use gateway::{DeliveryReport, GatewayConfig, PushGateway, PushSession, PushSink};
pub use mailer::{mailer_from_env, order_email, NoopMailer, SmtpConfig, SmtpMailer};
pub use memory::{
    InMemoryNotificationStore, InMemoryOrderStore, InMemoryUserDirectory, RecordingMailer,
    StaticVerifier,
};
