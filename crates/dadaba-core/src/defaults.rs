//! Centralized default constants for the notification subsystem.
//!
//! Configuration constructors (`from_env`) fall back to these values when the
//! corresponding environment variable is unset or unparsable.

// =============================================================================
// PUSH CHANNEL
// =============================================================================

/// Capacity of the bounded outbound queue held for each live connection.
pub const PUSH_OUTBOX_CAPACITY: usize = 64;

/// Interval between WebSocket keepalive pings.
pub const PUSH_PING_INTERVAL_SECS: u64 = 30;

/// Interval between SSE keepalive comments.
pub const SSE_KEEPALIVE_SECS: u64 = 15;

/// Event name carried by notification frames on the push channel.
pub const NOTIFICATION_EVENT: &str = "notification";

// =============================================================================
// PULL API
// =============================================================================

/// Upper bound accepted for the `limit` query parameter of the pull API.
pub const NOTIFICATION_LIST_MAX_LIMIT: i64 = 500;

// =============================================================================
// ORDERS
// =============================================================================

/// Prefix of generated order secret codes.
pub const SECRET_CODE_PREFIX: &str = "FF";

/// Number of random characters in the suffix of a secret code.
pub const SECRET_CODE_SUFFIX_LEN: usize = 6;

/// Attempts at generating a secret code before giving up on collisions.
pub const SECRET_CODE_MAX_ATTEMPTS: usize = 5;

/// Currency label used in outbound emails.
pub const CURRENCY_LABEL: &str = "FCFA";

// =============================================================================
// AUTH
// =============================================================================

/// Lifetime of bearer tokens issued by the verifier (7 days).
pub const TOKEN_LIFETIME_SECS: i64 = 7 * 24 * 3600;
