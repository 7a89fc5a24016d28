//! In-memory implementations of the storage and collaborator traits.
//!
//! These back the test suites (unit tests here and the API's end-to-end
//! tests) so the fan-out can be exercised without Postgres or SMTP.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use dadaba_core::defaults::SECRET_CODE_MAX_ATTEMPTS;
use dadaba_core::{
    generate_secret_code, new_v7, CredentialVerifier, Dish, Error, Identity, Mailer, NewNotification,
    NewOrder, Notification, NotificationRepository, Order, OrderItem, OrderRepository,
    OrderStatus, OutgoingEmail, Recipient, Result, Role, UserDirectory,
};

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Notification store kept in a vector. Recipient existence is not checked.
#[derive(Debug, Default)]
pub struct InMemoryNotificationStore {
    rows: RwLock<Vec<Notification>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row, in insertion order.
    pub async fn all(&self) -> Vec<Notification> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationStore {
    async fn create(&self, req: NewNotification) -> Result<Notification> {
        let now = Utc::now();
        let notification = Notification {
            id: new_v7(),
            kind: req.kind,
            title: req.title,
            message: req.message,
            read: false,
            user_id: req.recipient_id,
            related_order_id: req.related_order_id,
            created_at: now,
            updated_at: now,
        };
        self.rows.write().await.push(notification.clone());
        Ok(notification)
    }

    async fn list_for_user(&self, user_id: Uuid, limit: Option<i64>) -> Result<Vec<Notification>> {
        let mut rows: Vec<Notification> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        if let Some(limit) = limit {
            rows.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Notification>> {
        Ok(self.rows.read().await.iter().find(|n| n.id == id).cloned())
    }

    async fn mark_read(&self, id: Uuid, requesting_user: Uuid) -> Result<Notification> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(Error::NotificationNotFound(id))?;
        if !row.is_owned_by(requesting_user) {
            return Err(Error::Forbidden(format!(
                "Notification {} is addressed to another user",
                id
            )));
        }
        if !row.read {
            row.read = true;
            row.updated_at = Utc::now();
        }
        Ok(row.clone())
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let now = Utc::now();
        let mut changed = 0;
        for row in self
            .rows
            .write()
            .await
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.read)
        {
            row.read = true;
            row.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let count = self
            .rows
            .read()
            .await
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count();
        Ok(count as i64)
    }
}

// =============================================================================
// USERS
// =============================================================================

#[derive(Debug, Clone)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    role: Role,
}

/// User accounts kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account and return its id.
    pub async fn insert(&self, name: &str, email: &str, role: Role) -> Uuid {
        let id = new_v7();
        self.users.write().await.push(UserRecord {
            id,
            name: name.to_string(),
            email: email.to_string(),
            role,
        });
        id
    }

    pub async fn remove(&self, id: Uuid) {
        self.users.write().await.retain(|u| u.id != id);
    }

    pub async fn name_of(&self, id: Uuid) -> Option<String> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.name.clone())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn list_administrators(&self) -> Result<Vec<Recipient>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .filter(|u| u.role.is_administrative())
            .map(|u| Recipient {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
            })
            .collect())
    }

    async fn get_identity(&self, user_id: Uuid) -> Result<Option<Identity>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| Identity::new(u.id, u.role)))
    }
}

// =============================================================================
// ORDERS
// =============================================================================

/// Orders and dishes kept in maps. Customer names come from the directory.
#[derive(Debug)]
pub struct InMemoryOrderStore {
    users: std::sync::Arc<InMemoryUserDirectory>,
    dishes: RwLock<HashMap<Uuid, Dish>>,
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrderStore {
    pub fn new(users: std::sync::Arc<InMemoryUserDirectory>) -> Self {
        Self {
            users,
            dishes: RwLock::new(HashMap::new()),
            orders: RwLock::new(HashMap::new()),
        }
    }

    pub async fn add_dish(&self, name: &str, price: f64) -> Dish {
        let dish = Dish {
            id: new_v7(),
            name: name.to_string(),
            price,
        };
        self.dishes.write().await.insert(dish.id, dish.clone());
        dish
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderStore {
    async fn create(&self, req: NewOrder) -> Result<Order> {
        req.validate()?;

        let dishes: Vec<Dish> = self.dishes.read().await.values().cloned().collect();
        let total = req.total_with(&dishes).ok_or_else(|| {
            Error::InvalidInput("One or more dishes do not exist".to_string())
        })?;
        let customer_name = self
            .users
            .name_of(req.user_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("User {}", req.user_id)))?;

        let mut orders = self.orders.write().await;
        let secret_code = (0..SECRET_CODE_MAX_ATTEMPTS)
            .map(|_| generate_secret_code())
            .find(|code| !orders.values().any(|o| &o.secret_code == code))
            .ok_or_else(|| Error::Conflict("Could not generate a unique secret code".to_string()))?;

        let items = req
            .items
            .iter()
            .map(|item| OrderItem {
                id: new_v7(),
                dish_id: item.dish_id,
                quantity: item.quantity,
                price: dishes
                    .iter()
                    .find(|d| d.id == item.dish_id)
                    .map(|d| d.price)
                    .unwrap_or_default(),
            })
            .collect();

        let now = Utc::now();
        let order = Order {
            id: new_v7(),
            user_id: req.user_id,
            customer_name,
            secret_code,
            total,
            seats: req.seats,
            status: OrderStatus::Pending,
            payment_method: req.payment_method,
            delivery_name: Some(req.delivery_name),
            delivery_phone: Some(req.delivery_phone),
            delivery_location: Some(req.delivery_location),
            items,
            created_at: now,
            updated_at: now,
        };
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn confirm(&self, id: Uuid) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or(Error::OrderNotFound(id))?;
        if order.status != OrderStatus::Pending {
            return Err(Error::Conflict(format!(
                "Order {} is {}, only PENDING orders can be confirmed",
                id, order.status
            )));
        }
        order.status = OrderStatus::Confirmed;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

// =============================================================================
// AUTH AND MAIL DOUBLES
// =============================================================================

/// Verifier with a fixed token table.
#[derive(Debug, Default)]
pub struct StaticVerifier {
    tokens: HashMap<String, Identity>,
}

impl StaticVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, identity: Identity) -> Self {
        self.tokens.insert(token.to_string(), identity);
        self
    }
}

#[async_trait]
impl CredentialVerifier for StaticVerifier {
    async fn verify(&self, credential: &str) -> Result<Identity> {
        self.tokens
            .get(credential)
            .copied()
            .ok_or_else(|| Error::Unauthorized("Unknown token".to_string()))
    }
}

/// Mailer that records what it was asked to send.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: RwLock<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        self.sent.write().await.push(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dadaba_core::{NotificationType, OrderItemInput};
    use std::sync::Arc;

    fn new_notification(recipient_id: Uuid) -> NewNotification {
        NewNotification {
            recipient_id,
            kind: NotificationType::OrderCreated,
            title: "Nouvelle commande".to_string(),
            message: "m".to_string(),
            related_order_id: None,
        }
    }

    #[tokio::test]
    async fn test_mark_read_not_found_and_forbidden() {
        let store = InMemoryNotificationStore::new();
        let owner = Uuid::new_v4();
        let n = store.create(new_notification(owner)).await.unwrap();

        assert!(matches!(
            store.mark_read(Uuid::new_v4(), owner).await,
            Err(Error::NotificationNotFound(_))
        ));
        assert!(matches!(
            store.mark_read(n.id, Uuid::new_v4()).await,
            Err(Error::Forbidden(_))
        ));
        assert!(!store.get(n.id).await.unwrap().unwrap().read);
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent() {
        let store = InMemoryNotificationStore::new();
        let owner = Uuid::new_v4();
        let n = store.create(new_notification(owner)).await.unwrap();

        let first = store.mark_read(n.id, owner).await.unwrap();
        let second = store.mark_read(n.id, owner).await.unwrap();
        assert!(first.read && second.read);
        assert_eq!(first.updated_at, second.updated_at);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_limit() {
        let store = InMemoryNotificationStore::new();
        let owner = Uuid::new_v4();
        let a = store.create(new_notification(owner)).await.unwrap();
        let b = store.create(new_notification(owner)).await.unwrap();
        store.create(new_notification(Uuid::new_v4())).await.unwrap();

        let listed = store.list_for_user(owner, None).await.unwrap();
        assert_eq!(
            listed.iter().map(|n| n.id).collect::<Vec<_>>(),
            vec![b.id, a.id]
        );
        assert_eq!(store.list_for_user(owner, Some(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mark_all_read_and_unread_count() {
        let store = InMemoryNotificationStore::new();
        let owner = Uuid::new_v4();
        for _ in 0..3 {
            store.create(new_notification(owner)).await.unwrap();
        }
        assert_eq!(store.unread_count(owner).await.unwrap(), 3);
        assert_eq!(store.mark_all_read(owner).await.unwrap(), 3);
        assert_eq!(store.mark_all_read(owner).await.unwrap(), 0);
        assert_eq!(store.unread_count(owner).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_directory_lists_only_administrators() {
        let users = InMemoryUserDirectory::new();
        let admin = users.insert("A", "a@x", Role::Admin).await;
        let boss = users.insert("B", "b@x", Role::SuperAdmin).await;
        users.insert("S", "s@x", Role::Staff).await;
        users.insert("U", "u@x", Role::User).await;

        let ids: Vec<Uuid> = users
            .list_administrators()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![admin, boss]);
    }

    #[tokio::test]
    async fn test_order_create_and_confirm() {
        let users = Arc::new(InMemoryUserDirectory::new());
        let customer = users.insert("Awa", "awa@x", Role::User).await;
        let orders = InMemoryOrderStore::new(users);
        let dish = orders.add_dish("Garba", 1000.0).await;

        let order = orders
            .create(NewOrder {
                user_id: customer,
                items: vec![OrderItemInput {
                    dish_id: dish.id,
                    quantity: 3,
                }],
                seats: 1,
                payment_method: None,
                delivery_name: "Awa".to_string(),
                delivery_phone: "0700".to_string(),
                delivery_location: "Yopougon".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(order.total, 3000.0);
        assert_eq!(order.customer_name, "Awa");
        assert_eq!(order.status, OrderStatus::Pending);

        let confirmed = orders.confirm(order.id).await.unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);
        assert!(matches!(
            orders.confirm(order.id).await,
            Err(Error::Conflict(_))
        ));
        assert!(matches!(
            orders.confirm(Uuid::new_v4()).await,
            Err(Error::OrderNotFound(_))
        ));
    }
}
