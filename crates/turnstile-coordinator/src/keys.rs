//! Coordinator key builders.
//!
//! Centralising key construction prevents typos and makes it easy to find
//! every key the coordinator uses. The configured key prefix (default
//! `turnstile:`) is applied by the Redis client, not here.

use uuid::Uuid;

/// Sorted set of waiting users for an event. Score = enqueue time (ms).
pub fn waiting(event_id: Uuid) -> String {
    format!("queue:{event_id}:waiting")
}

/// Sorted set of active (admitted) users for an event. Score = expiry
/// deadline (ms) of the user's checkout window.
pub fn active(event_id: Uuid) -> String {
    format!("queue:{event_id}:active")
}

/// Reservation key for one admitted user. Carries the native TTL that
/// silently frees the slot when the checkout window lapses.
pub fn reservation(event_id: Uuid, user_id: Uuid) -> String {
    format!("{}{user_id}", reservation_prefix(event_id))
}

/// Prefix shared by all reservation keys of an event. Passed into Lua
/// scripts that derive per-user reservation keys server-side.
pub fn reservation_prefix(event_id: Uuid) -> String {
    format!("queue:{event_id}:rsv:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waiting_key() {
        let id = Uuid::nil();
        assert_eq!(
            waiting(id),
            "queue:00000000-0000-0000-0000-000000000000:waiting"
        );
    }

    #[test]
    fn test_reservation_key_extends_prefix() {
        let event = Uuid::nil();
        let user = Uuid::nil();
        assert_eq!(
            reservation(event, user),
            format!("{}{}", reservation_prefix(event), user)
        );
    }
}
