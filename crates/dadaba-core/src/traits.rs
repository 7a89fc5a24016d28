//! Core traits for the notification subsystem.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, so the Postgres backend and the in-memory backend used by
//! tests are interchangeable behind `Arc<dyn ...>`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// NOTIFICATION STORE
// =============================================================================

/// Durable per-user notification store.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persist a notification with `read = false` and store-assigned id and
    /// timestamps.
    async fn create(&self, req: NewNotification) -> Result<Notification>;

    /// Notifications addressed to `user_id`, newest first.
    async fn list_for_user(&self, user_id: Uuid, limit: Option<i64>) -> Result<Vec<Notification>>;

    /// Fetch a single notification.
    async fn get(&self, id: Uuid) -> Result<Option<Notification>>;

    /// Mark a notification read on behalf of `requesting_user`.
    ///
    /// Fails with `NotificationNotFound` for an unknown id and `Forbidden`
    /// when the requester is not the recipient. Marking an already read
    /// notification succeeds and leaves `updated_at` untouched.
    async fn mark_read(&self, id: Uuid, requesting_user: Uuid) -> Result<Notification>;

    /// Mark every unread notification of `user_id` read. Returns rows changed.
    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64>;

    /// Number of unread notifications addressed to `user_id`.
    async fn unread_count(&self, user_id: Uuid) -> Result<i64>;
}

// =============================================================================
// USERS
// =============================================================================

/// Read access to user accounts.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Every user whose role is administrative, as of the call.
    async fn list_administrators(&self) -> Result<Vec<Recipient>>;

    /// Current role of `user_id`, or `None` if the account does not exist.
    async fn get_identity(&self, user_id: Uuid) -> Result<Option<Identity>>;
}

// =============================================================================
// ORDERS
// =============================================================================

/// Order persistence and the two transitions that trigger notifications.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Price the requested items from the dish table, generate a unique
    /// secret code, and persist the order as PENDING.
    async fn create(&self, req: NewOrder) -> Result<Order>;

    async fn get(&self, id: Uuid) -> Result<Option<Order>>;

    /// Move a PENDING order to CONFIRMED.
    ///
    /// Fails with `OrderNotFound` for an unknown id and `Conflict` when the
    /// order is not pending.
    async fn confirm(&self, id: Uuid) -> Result<Order>;
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

/// Resolves a bearer credential to a verified identity.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Fails with `Unauthorized` when the credential is malformed, expired,
    /// badly signed, or names an unknown user.
    async fn verify(&self, credential: &str) -> Result<Identity>;
}

// =============================================================================
// EMAIL
// =============================================================================

/// A rendered outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Outbound email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<()>;
}
