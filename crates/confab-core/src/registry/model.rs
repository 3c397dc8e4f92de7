//! Registry-level session metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum title length derived from a first message before truncation.
const TITLE_MAX_CHARS: usize = 40;

/// Bookkeeping record for one session.
///
/// Lives in the durable registry, keyed by the same opaque id space as
/// the session actor's `ChatState.session_id`. `last_active` is bumped on
/// every chat turn and drives the listing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Opaque session identifier.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent chat turn.
    pub last_active: DateTime<Utc>,
}

impl SessionInfo {
    /// Creates a record with `created_at == last_active == now`.
    pub fn new(id: impl Into<String>, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at: now,
            last_active: now,
        }
    }

    /// Default title for a session created without one, e.g. `Chat 08/06 14:30`.
    pub fn default_title(now: DateTime<Utc>) -> String {
        format!("Chat {}", now.format("%m/%d %H:%M"))
    }

    /// Derives a title from the first user message, e.g.
    /// `What secrets do you seek in the celest... — 08/06 14:30`.
    ///
    /// Whitespace runs are collapsed and the message is truncated to
    /// 40 characters. Falls back to [`SessionInfo::default_title`] when
    /// the message is blank.
    pub fn title_from_first_message(message: &str, now: DateTime<Utc>) -> String {
        let cleaned = message.split_whitespace().collect::<Vec<_>>().join(" ");
        if cleaned.is_empty() {
            return Self::default_title(now);
        }
        let truncated = if cleaned.chars().count() > TITLE_MAX_CHARS {
            let head: String = cleaned.chars().take(TITLE_MAX_CHARS - 3).collect();
            format!("{head}...")
        } else {
            cleaned
        };
        format!("{truncated} — {}", now.format("%m/%d %H:%M"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 9, 41, 0).unwrap()
    }

    #[test]
    fn default_title_includes_date_and_time() {
        assert_eq!(SessionInfo::default_title(fixed_now()), "Chat 03/05 09:41");
    }

    #[test]
    fn short_first_message_is_kept_whole() {
        let title = SessionInfo::title_from_first_message("hello   there", fixed_now());
        assert_eq!(title, "hello there — 03/05 09:41");
    }

    #[test]
    fn long_first_message_is_truncated() {
        let message = "a".repeat(80);
        let title = SessionInfo::title_from_first_message(&message, fixed_now());
        assert!(title.starts_with(&format!("{}...", "a".repeat(37))));
        assert!(title.ends_with("03/05 09:41"));
    }

    #[test]
    fn blank_first_message_falls_back_to_default() {
        let title = SessionInfo::title_from_first_message("   \n ", fixed_now());
        assert_eq!(title, SessionInfo::default_title(fixed_now()));
    }
}
