//! Orders: placement and confirmation, the two transitions that trigger a
//! notification fan-out.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, warn};
use uuid::Uuid;

use dadaba_core::defaults::SECRET_CODE_MAX_ATTEMPTS;
use dadaba_core::{
    generate_secret_code, Dish, Error, NewOrder, Order, OrderItem, OrderRepository, OrderStatus,
    Result,
};

const ORDER_SELECT: &str = "SELECT o.id, o.user_id, u.name AS customer_name, o.secret_code,
        o.total, o.seats, o.status, o.payment_method, o.delivery_name,
        o.delivery_phone, o.delivery_location, o.created_at, o.updated_at
     FROM customer_order o
     JOIN app_user u ON u.id = o.user_id";

const SECRET_CODE_CONSTRAINT: &str = "customer_order_secret_code_key";

/// PostgreSQL order repository.
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: Pool<Postgres>,
}

impl PgOrderRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Add a dish to the menu. Menu management proper lives elsewhere; this
    /// exists for seeding and tests.
    pub async fn create_dish(&self, name: &str, price: f64) -> Result<Dish> {
        let id = dadaba_core::new_v7();
        sqlx::query("INSERT INTO dish (id, name, price) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(name)
            .bind(price)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(Dish {
            id,
            name: name.to_string(),
            price,
        })
    }

    async fn load_dishes(&self, ids: &[Uuid]) -> Result<Vec<Dish>> {
        let rows = sqlx::query("SELECT id, name, price FROM dish WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| Dish {
                id: r.get("id"),
                name: r.get("name"),
                price: r.get("price"),
            })
            .collect())
    }

    /// Price the order and insert it under the first secret code that is
    /// not taken. A code collision rolls back that attempt and moves on to
    /// the next candidate.
    async fn place(
        &self,
        req: NewOrder,
        mut codes: impl Iterator<Item = String> + Send,
    ) -> Result<Order> {
        req.validate()?;

        let dish_ids: Vec<Uuid> = req.items.iter().map(|i| i.dish_id).collect();
        let dishes = self.load_dishes(&dish_ids).await?;
        if let Some(missing) = dish_ids.iter().find(|id| !dishes.iter().any(|d| d.id == **id)) {
            return Err(Error::InvalidInput(format!("Dish not found: {}", missing)));
        }
        let total = req
            .total_with(&dishes)
            .ok_or_else(|| Error::InvalidInput("Dish not found".to_string()))?;

        for attempt in 1..=SECRET_CODE_MAX_ATTEMPTS {
            let Some(secret_code) = codes.next() else {
                break;
            };
            match self.insert_order(&req, &dishes, total, &secret_code).await {
                Ok(order_id) => {
                    debug!(
                        subsystem = "db",
                        component = "orders",
                        op = "create",
                        order_id = %order_id,
                        total,
                        attempt,
                        "Order placed"
                    );
                    return self
                        .get(order_id)
                        .await?
                        .ok_or(Error::OrderNotFound(order_id));
                }
                Err(e) if is_secret_code_collision(&e) => {
                    warn!(
                        subsystem = "db",
                        component = "orders",
                        attempt,
                        "Secret code collision, regenerating"
                    );
                }
                Err(e) => return Err(Error::Database(e)),
            }
        }

        Err(Error::Conflict(
            "Could not generate a unique secret code".to_string(),
        ))
    }

    /// One transaction: the order row and its items.
    async fn insert_order(
        &self,
        req: &NewOrder,
        dishes: &[Dish],
        total: f64,
        secret_code: &str,
    ) -> std::result::Result<Uuid, sqlx::Error> {
        let order_id = dadaba_core::new_v7();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO customer_order (id, user_id, secret_code, total, seats, status,
                 payment_method, delivery_name, delivery_phone, delivery_location)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(order_id)
        .bind(req.user_id)
        .bind(secret_code)
        .bind(total)
        .bind(req.seats)
        .bind(OrderStatus::Pending.as_str())
        .bind(&req.payment_method)
        .bind(&req.delivery_name)
        .bind(&req.delivery_phone)
        .bind(&req.delivery_location)
        .execute(&mut *tx)
        .await?;

        for item in &req.items {
            let price = dishes
                .iter()
                .find(|d| d.id == item.dish_id)
                .map(|d| d.price)
                .unwrap_or_default();
            sqlx::query(
                "INSERT INTO order_item (id, order_id, dish_id, quantity, price)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(dadaba_core::new_v7())
            .bind(order_id)
            .bind(item.dish_id)
            .bind(item.quantity)
            .bind(price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order_id)
    }

    async fn load_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            "SELECT id, dish_id, quantity, price FROM order_item WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| OrderItem {
                id: r.get("id"),
                dish_id: r.get("dish_id"),
                quantity: r.get("quantity"),
                price: r.get("price"),
            })
            .collect())
    }

    fn parse_row(row: &PgRow, items: Vec<OrderItem>) -> Result<Order> {
        let status: String = row.get("status");
        Ok(Order {
            id: row.get("id"),
            user_id: row.get("user_id"),
            customer_name: row.get("customer_name"),
            secret_code: row.get("secret_code"),
            total: row.get("total"),
            seats: row.get("seats"),
            status: status.parse()?,
            payment_method: row.get("payment_method"),
            delivery_name: row.get("delivery_name"),
            delivery_phone: row.get("delivery_phone"),
            delivery_location: row.get("delivery_location"),
            items,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create(&self, req: NewOrder) -> Result<Order> {
        self.place(req, std::iter::repeat_with(generate_secret_code)).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("{ORDER_SELECT} WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        match row {
            Some(row) => {
                let items = self.load_items(id).await?;
                Ok(Some(Self::parse_row(&row, items)?))
            }
            None => Ok(None),
        }
    }

    async fn confirm(&self, id: Uuid) -> Result<Order> {
        let updated = sqlx::query(
            "UPDATE customer_order SET status = $2, updated_at = now()
             WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(OrderStatus::Confirmed.as_str())
        .bind(OrderStatus::Pending.as_str())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        let order = self.get(id).await?.ok_or(Error::OrderNotFound(id))?;
        if updated.rows_affected() == 0 {
            return Err(Error::Conflict(format!(
                "Order {} is {}, only PENDING orders can be confirmed",
                id, order.status
            )));
        }

        debug!(
            subsystem = "db",
            component = "orders",
            op = "confirm",
            order_id = %id,
            "Order confirmed"
        );
        Ok(order)
    }
}

/// Unique violation on the secret code column, as opposed to any other key.
fn is_secret_code_collision(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
                && db_err.constraint() == Some(SECRET_CODE_CONSTRAINT)
        }
        _ => false,
    }
}
