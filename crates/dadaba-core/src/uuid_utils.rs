//! UUID v7 utilities for time-ordered identifiers.
//!
//! Notifications, orders, and live connections are all keyed by UUIDv7, so
//! identifiers sort in creation order and double as coarse timestamps in logs.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
///
/// # Example
///
/// ```
/// use dadaba_core::uuid_utils::new_v7;
///
/// let a = new_v7();
/// let b = new_v7();
/// assert!(b > a);
/// ```
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Check if a UUID is version 7.
#[inline]
pub fn is_v7(uuid: &Uuid) -> bool {
    uuid.get_version_num() == 7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_v7_is_v7() {
        assert!(is_v7(&new_v7()));
        assert!(!is_v7(&Uuid::new_v4()));
    }

    #[test]
    fn test_new_v7_is_monotonic() {
        let ids: Vec<Uuid> = (0..100).map(|_| new_v7()).collect();
        for pair in ids.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }
}
