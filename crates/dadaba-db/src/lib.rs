//! # dadaba-db
//!
//! PostgreSQL database layer for dadaba.
//!
//! This crate provides:
//! - Connection pool management
//! - The durable notification store
//! - Administrator resolution and identity lookup over user accounts
//! - Order placement and confirmation
//!
//! ## Example
//!
//! ```rust,ignore
//! use dadaba_db::{Database, NotificationRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/dadaba").await?;
//!     let unread = db.notifications.unread_count(user_id).await?;
//!     println!("{} unread", unread);
//!     Ok(())
//! }
//! ```

pub mod notifications;
pub mod orders;
pub mod pool;
pub mod users;

// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use dadaba_core::*;

pub use notifications::PgNotificationRepository;
pub use orders::PgOrderRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use users::PgUserRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Per-user notification store.
    pub notifications: PgNotificationRepository,
    /// User accounts (administrators, identity lookup).
    pub users: PgUserRepository,
    /// Orders and dishes.
    pub orders: PgOrderRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notifications: PgNotificationRepository::new(pool.clone()),
            users: PgUserRepository::new(pool.clone()),
            orders: PgOrderRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
