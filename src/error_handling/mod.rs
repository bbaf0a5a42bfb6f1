//! Error taxonomies for initialization, storage, and notification dispatch.

mod types;

pub use types::{DatabaseError, InitializationError, NotifyError};

use crate::config::MAX_ERROR_MESSAGE_LENGTH;

/// Truncates an error message destined for the store.
///
/// Transport errors can drag whole response fragments along; unbounded
/// messages bloat the status and log tables.
pub fn truncate_error_message(message: &str) -> String {
    if message.len() <= MAX_ERROR_MESSAGE_LENGTH {
        return message.to_string();
    }
    let mut end = MAX_ERROR_MESSAGE_LENGTH;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}... (truncated, {} chars total)",
        &message[..end],
        message.len()
    )
}
