//! Error types for the notification subsystem.

use thiserror::Error;

/// Result type alias using dadaba's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dadaba operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Notification not found
    #[error("Notification not found: {0}")]
    NotificationNotFound(uuid::Uuid),

    /// Order not found
    #[error("Order not found: {0}")]
    OrderNotFound(uuid::Uuid),

    /// Credential missing, malformed, expired, or bound to an unknown user
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (authenticated but not the owner / not permitted)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Conflicting state (e.g. confirming an order that is not pending)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Push send to a live connection failed
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Outbound email failed
    #[error("Mail error: {0}")]
    Mail(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors that originate in the persistence layer.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Database(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_notification_not_found() {
        let id = Uuid::nil();
        let err = Error::NotificationNotFound(id);
        assert_eq!(err.to_string(), format!("Notification not found: {}", id));
    }

    #[test]
    fn test_error_display_order_not_found() {
        let id = Uuid::new_v4();
        let err = Error::OrderNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_error_display_unauthorized() {
        let err = Error::Unauthorized("invalid token".to_string());
        assert_eq!(err.to_string(), "Unauthorized: invalid token");
    }

    #[test]
    fn test_error_display_forbidden() {
        let err = Error::Forbidden("not the recipient".to_string());
        assert_eq!(err.to_string(), "Forbidden: not the recipient");
    }

    #[test]
    fn test_error_display_delivery() {
        let err = Error::Delivery("connection closed".to_string());
        assert_eq!(err.to_string(), "Delivery error: connection closed");
    }

    #[test]
    fn test_error_display_mail() {
        let err = Error::Mail("smtp refused".to_string());
        assert_eq!(err.to_string(), "Mail error: smtp refused");
    }

    #[test]
    fn test_error_display_conflict() {
        let err = Error::Conflict("order is not pending".to_string());
        assert_eq!(err.to_string(), "Conflict: order is not pending");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => {
                assert!(!msg.is_empty());
            }
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_database_error_is_persistence() {
        let err = Error::Database(sqlx::Error::RowNotFound);
        assert!(err.is_persistence());
        assert!(!Error::Delivery("x".into()).is_persistence());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
