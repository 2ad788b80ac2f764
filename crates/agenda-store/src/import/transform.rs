//! Pure document-to-row conversions. Nothing here touches a database.

use agenda_shared::constants::{DEFAULT_NOTIFY_MINUTES_BEFORE, DEFAULT_TIMEZONE};
use agenda_shared::legacy::{LegacyEntryRef, LegacyItem, LegacyNote, LegacyUser};
use agenda_shared::types::{FriendshipStatus, Permission};
use chrono::{DateTime, NaiveDate, Utc};

use super::RecordTransformError;
use crate::models::{Item, Note, Ownership, User};

fn malformed(field: &'static str, reason: impl Into<String>) -> RecordTransformError {
    RecordTransformError::Malformed {
        field,
        reason: reason.into(),
    }
}

fn require_id(id: &str) -> Result<(), RecordTransformError> {
    if id.trim().is_empty() {
        return Err(malformed("_id", "empty identifier"));
    }
    Ok(())
}

/// Trimmed text, with blank strings treated as absent.
fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn timestamp(
    field: &'static str,
    raw: Option<&str>,
    fallback: DateTime<Utc>,
) -> Result<DateTime<Utc>, RecordTransformError> {
    match non_empty(raw) {
        None => Ok(fallback),
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| malformed(field, format!("{s:?}: {e}"))),
    }
}

/// Calendar day of an item. The legacy client wrote either a bare
/// `YYYY-MM-DD` or a full RFC-3339 timestamp; the latter is taken in UTC.
fn item_date(raw: Option<&str>) -> Result<Option<NaiveDate>, RecordTransformError> {
    let Some(s) = non_empty(raw) else {
        return Ok(None);
    };
    if let Ok(day) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        return Ok(Some(day));
    }
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| Some(dt.with_timezone(&Utc).date_naive()))
        .map_err(|_| malformed("date", format!("{s:?} is neither a date nor a timestamp")))
}

/// Unparseable or negative lead times fall back to the default.
fn notify_minutes(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|minutes| *minutes >= 0)
        .unwrap_or(DEFAULT_NOTIFY_MINUTES_BEFORE)
}

pub fn user_row(doc: &LegacyUser, fallback: DateTime<Utc>) -> Result<User, RecordTransformError> {
    require_id(&doc.id)?;
    let username = non_empty(Some(&doc.username)).ok_or_else(|| malformed("username", "empty"))?;

    Ok(User {
        id: doc.id.clone(),
        username,
        email: non_empty(doc.email.as_deref()),
        password_hash: doc.password.clone(),
        timezone: non_empty(doc.timezone.as_deref())
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        notify_minutes_before: notify_minutes(doc.notify_before.as_deref()),
        created_at: timestamp("createdAt", doc.created_at.as_deref(), fallback)?,
    })
}

/// The template reference is carried as-is; whether it resolves is decided
/// at write time.
pub fn item_row(doc: &LegacyItem, fallback: DateTime<Utc>) -> Result<Item, RecordTransformError> {
    require_id(&doc.id)?;
    let name = non_empty(Some(&doc.name)).ok_or_else(|| malformed("name", "empty"))?;
    if let Some(minutes) = doc.duration.filter(|m| *m < 0) {
        return Err(malformed("duration", format!("negative duration {minutes}")));
    }

    Ok(Item {
        id: doc.id.clone(),
        name,
        description: non_empty(doc.description.as_deref()),
        date: item_date(doc.date.as_deref())?,
        time: non_empty(doc.time.as_deref()),
        duration_minutes: doc.duration,
        repeat_rule: non_empty(doc.repeat.as_deref()),
        done: doc.done,
        template_id: non_empty(doc.template.as_deref()),
        created_at: timestamp("createdAt", doc.created_at.as_deref(), fallback)?,
    })
}

pub fn note_row(doc: &LegacyNote, fallback: DateTime<Utc>) -> Result<Note, RecordTransformError> {
    require_id(&doc.id)?;
    let created_at = timestamp("createdAt", doc.created_at.as_deref(), fallback)?;

    Ok(Note {
        id: doc.id.clone(),
        title: doc.title.trim().to_string(),
        content: doc.content.clone(),
        created_at,
        updated_at: timestamp("updatedAt", doc.updated_at.as_deref(), created_at)?,
    })
}

/// Link row for the entry at position `rank` of a user's array.
pub fn ownership_row(
    entry: &LegacyEntryRef,
    user_id: &str,
    rank: usize,
) -> Result<Ownership, RecordTransformError> {
    require_id(&entry.id)?;
    let permission = Permission::from_legacy(entry.permission.as_deref())
        .map_err(|e| malformed("permission", e.to_string()))?;

    Ok(Ownership {
        entity_id: entry.id.clone(),
        user_id: user_id.to_string(),
        permission,
        invite_pending: entry.pending,
        sorting_rank: rank as i64,
    })
}

/// Every relation a user's social arrays claim, with the status it maps to
/// from this user's point of view.
pub fn friendship_candidates(user: &LegacyUser) -> Vec<(&str, FriendshipStatus)> {
    let social = &user.social;
    let friends = social.friends.iter().map(|id| (id.as_str(), FriendshipStatus::Friends));
    let outgoing = social
        .outgoing
        .iter()
        .map(|id| (id.as_str(), FriendshipStatus::PendingFirst));
    let incoming = social
        .incoming
        .iter()
        .map(|id| (id.as_str(), FriendshipStatus::PendingSecond));

    friends.chain(outgoing).chain(incoming).collect()
}
