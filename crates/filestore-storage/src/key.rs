//! Storage key layout.
//!
//! Keys look like `u{owner}/{yyyyMMdd}/{uuid}_{name}`: an owner prefix and
//! a day partition for operational queries, a random component against
//! collisions, and a sanitized copy of the display name for humans.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Fallback when a display name sanitizes to nothing.
const FALLBACK_NAME: &str = "file";

/// Reduce a client-supplied file name to its final path segment.
pub fn clean_filename(raw: &str) -> String {
    raw.rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
pub fn sanitize_key_segment(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // A segment made only of dots would be a path traversal on disk.
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        FALLBACK_NAME.to_string()
    } else {
        sanitized
    }
}

/// Derive the object key for a new upload.
pub fn storage_key(owner_id: Uuid, display_name: &str, now: DateTime<Utc>, nonce: Uuid) -> String {
    format!(
        "u{owner_id}/{}/{nonce}_{}",
        now.format("%Y%m%d"),
        sanitize_key_segment(display_name)
    )
}
