//! # dadaba-core
//!
//! Core types, traits, and abstractions for the dadaba order notification
//! subsystem.
//!
//! This crate provides the domain model shared by every other crate
//! (notifications, roles, orders, push messages), the repository and
//! collaborator traits that concrete backends implement, and the in-memory
//! [`SessionRegistry`] that tracks live push connections.

pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod registry;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{OrderEvent, OrderEventKind, PushMessage};
pub use models::*;
pub use registry::{ConnectionId, LiveSession, SessionRegistry, ADMINS_GROUP};
pub use traits::*;
pub use uuid_utils::{is_v7, new_v7};
