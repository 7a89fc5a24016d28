//! Structured logging schema and field name constants.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query the fan-out path by recipient, order, or
//! connection across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable failure (one recipient, one frame, one email) |
//! | INFO  | Lifecycle events (startup, connection open/close, fan-out done) |
//! | DEBUG | Decision points, recipient sets, targeting mode |
//! | TRACE | Per-frame enqueueing |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the HTTP request.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "notify"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "gateway", "registry", "fanout", "mailer", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "deliver", "register", "fan_out", "mark_read"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Notification UUID being operated on.
pub const NOTIFICATION_ID: &str = "notification_id";

/// User the notification is addressed to.
pub const RECIPIENT_ID: &str = "recipient_id";

/// Order that triggered a fan-out.
pub const ORDER_ID: &str = "order_id";

/// Live push connection identifier.
pub const CONNECTION_ID: &str = "connection_id";

/// Broadcast group name.
pub const GROUP: &str = "group";

/// Authenticated user on a connection or request.
pub const USER_ID: &str = "user_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of recipients resolved for a fan-out.
pub const RECIPIENT_COUNT: &str = "recipient_count";

/// Number of frames enqueued by a delivery.
pub const DELIVERED: &str = "delivered";

/// Number of frames dropped by a delivery (full or closed queues).
pub const DROPPED: &str = "dropped";

/// Number of live connections after a registry change.
pub const ACTIVE: &str = "active";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
