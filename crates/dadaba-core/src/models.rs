//! Domain models shared across crates.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::defaults::{SECRET_CODE_PREFIX, SECRET_CODE_SUFFIX_LEN};
use crate::error::Error;

// =============================================================================
// ROLES AND IDENTITY
// =============================================================================

/// Account role stored on the user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Staff,
    Admin,
    SuperAdmin,
}

impl Role {
    /// Roles that receive order notifications and join the "admins" group.
    pub const fn is_administrative(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    /// Roles allowed to read any order.
    pub const fn can_view_all_orders(&self) -> bool {
        matches!(self, Role::Staff | Role::Admin | Role::SuperAdmin)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Staff => "STAFF",
            Role::Admin => "ADMIN",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "STAFF" => Ok(Role::Staff),
            "ADMIN" => Ok(Role::Admin),
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            other => Err(Error::InvalidInput(format!("Unknown role: {}", other))),
        }
    }
}

/// Verified identity resolved from a bearer credential.
///
/// Resolved once per request or per push connection and never refreshed for
/// the lifetime of that connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// An administrator who should be informed about order activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Kind of event a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    OrderCreated,
    OrderConfirmed,
    OrderUpdated,
    Generic,
}

impl NotificationType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            NotificationType::OrderCreated => "ORDER_CREATED",
            NotificationType::OrderConfirmed => "ORDER_CONFIRMED",
            NotificationType::OrderUpdated => "ORDER_UPDATED",
            NotificationType::Generic => "GENERIC",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ORDER_CREATED" => Ok(NotificationType::OrderCreated),
            "ORDER_CONFIRMED" => Ok(NotificationType::OrderConfirmed),
            "ORDER_UPDATED" => Ok(NotificationType::OrderUpdated),
            "GENERIC" => Ok(NotificationType::Generic),
            other => Err(Error::InvalidInput(format!(
                "Unknown notification type: {}",
                other
            ))),
        }
    }
}

/// A persisted notification addressed to one user.
///
/// The serialized form is shared by the pull API and the push channel so a
/// client can treat pushed and pulled objects interchangeably.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub read: bool,
    /// Recipient of the notification.
    pub user_id: Uuid,
    /// Order that triggered the notification (lookup only, not ownership).
    pub related_order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// True when `user_id` is the recipient of this notification.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Request for creating a notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub related_order_id: Option<Uuid>,
}

// =============================================================================
// ORDERS
// =============================================================================

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "PREPARING" => Ok(OrderStatus::Preparing),
            "READY" => Ok(OrderStatus::Ready),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(Error::InvalidInput(format!("Unknown order status: {}", other))),
        }
    }
}

/// A dish that can be ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
}

/// One line of an order, priced at the time the order was placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub dish_id: Uuid,
    pub quantity: i32,
    pub price: f64,
}

/// An order together with the name of the customer who placed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub customer_name: String,
    pub secret_code: String,
    pub total: f64,
    pub seats: i32,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub delivery_name: Option<String>,
    pub delivery_phone: Option<String>,
    pub delivery_location: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SECRET_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a customer-facing order code: `FF-<unix millis>-<6 uppercase alphanumerics>`.
///
/// Codes are unique in practice but not guaranteed; stores regenerate on
/// collision.
pub fn generate_secret_code() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SECRET_CODE_SUFFIX_LEN)
        .map(|_| SECRET_CODE_ALPHABET[rng.gen_range(0..SECRET_CODE_ALPHABET.len())] as char)
        .collect();
    format!(
        "{}-{}-{}",
        SECRET_CODE_PREFIX,
        Utc::now().timestamp_millis(),
        suffix
    )
}

/// Requested line of a new order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub dish_id: Uuid,
    pub quantity: i32,
}

/// Request for placing a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub items: Vec<OrderItemInput>,
    pub seats: i32,
    pub payment_method: Option<String>,
    pub delivery_name: String,
    pub delivery_phone: String,
    pub delivery_location: String,
}

impl NewOrder {
    /// Validate the request shape before touching storage.
    pub fn validate(&self) -> Result<(), Error> {
        if self.items.is_empty() {
            return Err(Error::InvalidInput(
                "At least one item is required".to_string(),
            ));
        }
        if let Some(bad) = self.items.iter().find(|i| i.quantity < 1) {
            return Err(Error::InvalidInput(format!(
                "Quantity must be at least 1 for dish {}",
                bad.dish_id
            )));
        }
        if self.seats < 1 {
            return Err(Error::InvalidInput("Seats must be at least 1".to_string()));
        }
        let missing_delivery = [
            &self.delivery_name,
            &self.delivery_phone,
            &self.delivery_location,
        ]
        .iter()
        .any(|v| v.trim().is_empty());
        if missing_delivery {
            return Err(Error::InvalidInput(
                "Delivery name, phone and location are required".to_string(),
            ));
        }
        Ok(())
    }

    /// Sum of `price × quantity` for every requested line.
    ///
    /// Returns `None` if a requested dish is missing from `dishes`.
    pub fn total_with(&self, dishes: &[Dish]) -> Option<f64> {
        self.items.iter().try_fold(0.0, |acc, item| {
            dishes
                .iter()
                .find(|d| d.id == item.dish_id)
                .map(|d| acc + d.price * f64::from(item.quantity))
        })
    }
}
