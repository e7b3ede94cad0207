//! Board object constants and request validation.
//!
//! Everything here runs before a board lock is taken, so malformed requests
//! never occupy the per-board serialization slot.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum length of a client-generated instance id (characters).
pub const MAX_INSTANCE_ID_LEN: usize = 128;

/// Maximum length of an object type discriminator (characters).
pub const MAX_OBJECT_TYPE_LEN: usize = 64;

/// Maximum serialized size of an object payload (1 MiB).
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Default number of log entries returned by a history read.
pub const DEFAULT_HISTORY_LIMIT: i64 = 100;

/// Upper bound on a single history read.
pub const MAX_HISTORY_LIMIT: i64 = 500;

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Validate a client-generated instance id.
pub fn validate_instance_id(instance_id: &str) -> Result<(), CoreError> {
    if instance_id.trim().is_empty() {
        return Err(CoreError::Validation(
            "instance_id must not be empty".to_string(),
        ));
    }
    if instance_id.chars().count() > MAX_INSTANCE_ID_LEN {
        return Err(CoreError::Validation(format!(
            "instance_id must be at most {MAX_INSTANCE_ID_LEN} characters"
        )));
    }
    if instance_id.chars().any(char::is_control) {
        return Err(CoreError::Validation(
            "instance_id must not contain control characters".to_string(),
        ));
    }
    Ok(())
}

/// Validate an object type discriminator such as `"shape"` or `"sticky_note"`.
pub fn validate_object_type(object_type: &str) -> Result<(), CoreError> {
    if object_type.is_empty() {
        return Err(CoreError::Validation(
            "object_type must not be empty".to_string(),
        ));
    }
    if object_type.len() > MAX_OBJECT_TYPE_LEN {
        return Err(CoreError::Validation(format!(
            "object_type must be at most {MAX_OBJECT_TYPE_LEN} characters"
        )));
    }
    let valid = object_type
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if !valid {
        return Err(CoreError::Validation(format!(
            "Invalid object_type '{object_type}'. Allowed characters: a-z, 0-9, '_', '-'"
        )));
    }
    Ok(())
}

/// Validate an object payload and return it unwrapped.
///
/// The payload is opaque to the server; only presence and size are checked.
pub fn validate_payload(
    payload: Option<&serde_json::Value>,
) -> Result<&serde_json::Value, CoreError> {
    let payload = match payload {
        None | Some(serde_json::Value::Null) => {
            return Err(CoreError::InvalidPayload(
                "payload is required for ADD and UPDATE".to_string(),
            ));
        }
        Some(value) => value,
    };

    let size = serde_json::to_vec(payload)
        .map_err(|e| CoreError::InvalidPayload(format!("payload is not serializable: {e}")))?
        .len();
    if size > MAX_PAYLOAD_BYTES {
        return Err(CoreError::InvalidPayload(format!(
            "payload is {size} bytes, limit is {MAX_PAYLOAD_BYTES}"
        )));
    }

    Ok(payload)
}

/// Clamp a requested history page size into `1..=MAX_HISTORY_LIMIT`.
pub fn clamp_history_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}
