//! Row structs persisted in the relational schema.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the API layer.

use agenda_shared::types::{FriendshipStatus, Permission};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Identifier carried over from the legacy store.
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    /// IANA zone name.
    pub timezone: String,
    /// How long before an item starts its reminder fires.
    pub notify_minutes_before: i64,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// An agenda entry. Recurring templates have no `template_id`; generated
/// instances point at their template and are unique per `(template, date)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    /// Wall-clock start, `HH:MM`.
    pub time: Option<String>,
    pub duration_minutes: Option<i64>,
    pub repeat_rule: Option<String>,
    pub done: bool,
    pub template_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Note
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Ownership (item-on-user, note-on-user)
// ---------------------------------------------------------------------------

/// Link between a user and an item or note they can see.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ownership {
    pub entity_id: String,
    pub user_id: String,
    pub permission: Permission,
    /// The user was invited but has not accepted yet.
    pub invite_pending: bool,
    /// Position in the user's own ordering of their entries.
    pub sorting_rank: i64,
}

// ---------------------------------------------------------------------------
// Friendship
// ---------------------------------------------------------------------------

/// One row per unordered pair of users, always with `user1_id < user2_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Friendship {
    pub user1_id: String,
    pub user2_id: String,
    pub status: FriendshipStatus,
}

impl Friendship {
    /// Build the row for `a` and `b` if they are already in canonical order.
    ///
    /// Returns `None` when `a >= b`: the pair belongs to `b`'s side, or is a
    /// self-reference that must never be stored.
    pub fn canonical(a: &str, b: &str, status: FriendshipStatus) -> Option<Self> {
        (a < b).then(|| Self {
            user1_id: a.to_string(),
            user2_id: b.to_string(),
            status,
        })
    }
}
