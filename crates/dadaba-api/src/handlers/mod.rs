//! HTTP handlers for dadaba-api.

pub mod health;
pub mod notifications;
pub mod orders;
pub mod push;
