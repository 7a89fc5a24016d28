//! Domain events that trigger a notification fan-out, and the frames pushed
//! to live connections.
//!
//! An [`OrderEvent`] is produced by the order lifecycle right after an order
//! transitions to CREATED or CONFIRMED. The fan-out turns it into one
//! [`Notification`] row per administrator and one [`PushMessage`] per row.
//!
//! ## Push Wire Format
//!
//! ```text
//! {"event":"notification","data":{"id":"...","type":"ORDER_CREATED","title":"...",...}}
//! ```

use serde::Serialize;
use uuid::Uuid;

use crate::defaults::NOTIFICATION_EVENT;
use crate::models::{Notification, NotificationType, Order};

// ============================================================================
// Order events
// ============================================================================

/// Which order transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEventKind {
    Created,
    Confirmed,
}

impl OrderEventKind {
    pub const fn notification_type(&self) -> NotificationType {
        match self {
            OrderEventKind::Created => NotificationType::OrderCreated,
            OrderEventKind::Confirmed => NotificationType::OrderConfirmed,
        }
    }

    /// Namespaced name used in logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderEventKind::Created => "order.created",
            OrderEventKind::Confirmed => "order.confirmed",
        }
    }
}

/// Snapshot of the order fields the fan-out needs.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEvent {
    pub kind: OrderEventKind,
    pub order_id: Uuid,
    pub secret_code: String,
    pub total: f64,
    pub customer_name: String,
}

impl OrderEvent {
    pub fn created(order: &Order) -> Self {
        Self::from_order(OrderEventKind::Created, order)
    }

    pub fn confirmed(order: &Order) -> Self {
        Self::from_order(OrderEventKind::Confirmed, order)
    }

    fn from_order(kind: OrderEventKind, order: &Order) -> Self {
        Self {
            kind,
            order_id: order.id,
            secret_code: order.secret_code.clone(),
            total: order.total,
            customer_name: order.customer_name.clone(),
        }
    }

    /// Title shown on the notification.
    pub fn title(&self) -> &'static str {
        match self.kind {
            OrderEventKind::Created => "Nouvelle commande",
            OrderEventKind::Confirmed => "Commande confirmée",
        }
    }

    /// Human-readable notification body.
    pub fn message(&self) -> String {
        match self.kind {
            OrderEventKind::Created => format!(
                "Nouvelle commande {} par {}",
                self.secret_code, self.customer_name
            ),
            OrderEventKind::Confirmed => format!(
                "Commande {} confirmée par {}",
                self.secret_code, self.customer_name
            ),
        }
    }
}

// ============================================================================
// Push frames
// ============================================================================

/// A frame delivered over the push channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PushMessage {
    /// A freshly persisted notification, carrying its store-assigned id.
    Notification(Notification),
}

impl PushMessage {
    /// Event name of the frame (SSE `event:` field).
    pub fn event_name(&self) -> &'static str {
        match self {
            PushMessage::Notification(_) => NOTIFICATION_EVENT,
        }
    }

    /// The frame body without the event tag.
    pub fn data_json(&self) -> serde_json::Result<String> {
        match self {
            PushMessage::Notification(n) => serde_json::to_string(n),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderStatus, Order};
    use chrono::Utc;

    fn order() -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            customer_name: "Awa".to_string(),
            secret_code: "FF-1700000000000-ABC123".to_string(),
            total: 3000.0,
            seats: 2,
            status: OrderStatus::Pending,
            payment_method: None,
            delivery_name: None,
            delivery_phone: None,
            delivery_location: None,
            items: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_created_event_templates() {
        let event = OrderEvent::created(&order());
        assert_eq!(event.kind.notification_type(), NotificationType::OrderCreated);
        assert_eq!(event.title(), "Nouvelle commande");
        assert_eq!(
            event.message(),
            "Nouvelle commande FF-1700000000000-ABC123 par Awa"
        );
    }

    #[test]
    fn test_confirmed_event_templates() {
        let event = OrderEvent::confirmed(&order());
        assert_eq!(
            event.kind.notification_type(),
            NotificationType::OrderConfirmed
        );
        assert_eq!(event.title(), "Commande confirmée");
        assert_eq!(
            event.message(),
            "Commande FF-1700000000000-ABC123 confirmée par Awa"
        );
    }

    #[test]
    fn test_push_message_json_shape() {
        let now = Utc::now();
        let msg = PushMessage::Notification(Notification {
            id: Uuid::nil(),
            kind: NotificationType::OrderCreated,
            title: "t".to_string(),
            message: "m".to_string(),
            read: false,
            user_id: Uuid::nil(),
            related_order_id: None,
            created_at: now,
            updated_at: now,
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["event"], "notification");
        assert_eq!(json["data"]["type"], "ORDER_CREATED");
        assert_eq!(json["data"]["read"], false);
        assert!(json["data"]["relatedOrderId"].is_null());
        assert_eq!(msg.event_name(), "notification");
        assert!(msg.data_json().unwrap().starts_with('{'));
    }
}
