//! User account lookups: recipient resolution and identity verification.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use dadaba_core::{Error, Identity, Recipient, Result, Role, UserDirectory};

/// PostgreSQL user repository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create a user account. Account management proper lives elsewhere;
    /// this exists for seeding and tests.
    pub async fn create(&self, name: &str, email: &str, role: Role) -> Result<Uuid> {
        let id = dadaba_core::new_v7();
        sqlx::query("INSERT INTO app_user (id, name, email, role) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(name)
            .bind(email)
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(id)
    }
}

#[async_trait]
impl UserDirectory for PgUserRepository {
    async fn list_administrators(&self) -> Result<Vec<Recipient>> {
        let rows = sqlx::query(
            "SELECT id, name, email FROM app_user
             WHERE role IN ('ADMIN', 'SUPER_ADMIN')
             ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| Recipient {
                id: r.get("id"),
                name: r.get("name"),
                email: r.get("email"),
            })
            .collect())
    }

    async fn get_identity(&self, user_id: Uuid) -> Result<Option<Identity>> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM app_user WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        match role {
            Some(r) => Ok(Some(Identity::new(user_id, r.parse()?))),
            None => Ok(None),
        }
    }
}
