//! Notification store backed by the `notification` table.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use dadaba_core::{Error, NewNotification, Notification, NotificationRepository, Result};

const COLUMNS: &str =
    "id, type, title, message, read, user_id, order_id, created_at, updated_at";

/// PostgreSQL notification repository.
#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: Pool<Postgres>,
}

impl PgNotificationRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: &PgRow) -> Result<Notification> {
        let kind: String = row.get("type");
        Ok(Notification {
            id: row.get("id"),
            kind: kind.parse()?,
            title: row.get("title"),
            message: row.get("message"),
            read: row.get("read"),
            user_id: row.get("user_id"),
            related_order_id: row.get("order_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, req: NewNotification) -> Result<Notification> {
        let id = dadaba_core::new_v7();
        let row = sqlx::query(&format!(
            "INSERT INTO notification (id, type, title, message, user_id, order_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(req.kind.as_str())
        .bind(&req.title)
        .bind(&req.message)
        .bind(req.recipient_id)
        .bind(req.related_order_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "notifications",
            op = "create",
            notification_id = %id,
            recipient_id = %req.recipient_id,
            "Notification persisted"
        );
        Self::parse_row(&row)
    }

    async fn list_for_user(&self, user_id: Uuid, limit: Option<i64>) -> Result<Vec<Notification>> {
        // LIMIT NULL means no limit.
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM notification
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(Self::parse_row).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Notification>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM notification WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.as_ref().map(Self::parse_row).transpose()
    }

    async fn mark_read(&self, id: Uuid, requesting_user: Uuid) -> Result<Notification> {
        let existing = self
            .get(id)
            .await?
            .ok_or(Error::NotificationNotFound(id))?;
        if !existing.is_owned_by(requesting_user) {
            return Err(Error::Forbidden(format!(
                "Notification {} is addressed to another user",
                id
            )));
        }
        if existing.read {
            return Ok(existing);
        }

        let row = sqlx::query(&format!(
            "UPDATE notification
             SET read = true,
                 updated_at = CASE WHEN read THEN updated_at ELSE now() END
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(requesting_user)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref()
            .map(Self::parse_row)
            .transpose()?
            .ok_or(Error::NotificationNotFound(id))
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notification SET read = true, updated_at = now()
             WHERE user_id = $1 AND read = false",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected())
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification WHERE user_id = $1 AND read = false",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(count)
    }
}
