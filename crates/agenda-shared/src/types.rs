use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AgendaError;

/// Access level a user holds on a shared item or note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    Owner,
    Write,
    Read,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Owner => "Owner",
            Permission::Write => "Write",
            Permission::Read => "Read",
        }
    }

    /// Map a permission string as written by the legacy application.
    ///
    /// A missing value means the entry predates sharing and is treated as
    /// ownership.
    pub fn from_legacy(raw: Option<&str>) -> Result<Self, AgendaError> {
        let Some(raw) = raw else {
            return Ok(Permission::Owner);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "owner" => Ok(Permission::Owner),
            "write" | "edit" => Ok(Permission::Write),
            "read" | "view" => Ok(Permission::Read),
            _ => Err(AgendaError::UnknownPermission(raw.to_string())),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AgendaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Owner" => Ok(Permission::Owner),
            "Write" => Ok(Permission::Write),
            "Read" => Ok(Permission::Read),
            other => Err(AgendaError::UnknownPermission(other.to_string())),
        }
    }
}

/// State of the relationship between `user1` and `user2` of a friendship
/// row. "First" and "Second" always refer to the canonical column order,
/// where `user1_id_fk < user2_id_fk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FriendshipStatus {
    /// `user1` sent a request that `user2` has not answered.
    PendingFirst,
    /// `user2` sent a request that `user1` has not answered.
    PendingSecond,
    Friends,
    /// `user1` blocked `user2`.
    BlockedFirst,
    /// `user2` blocked `user1`.
    BlockedSecond,
    BlockedBoth,
}

impl FriendshipStatus {
    pub const ALL: [FriendshipStatus; 6] = [
        FriendshipStatus::PendingFirst,
        FriendshipStatus::PendingSecond,
        FriendshipStatus::Friends,
        FriendshipStatus::BlockedFirst,
        FriendshipStatus::BlockedSecond,
        FriendshipStatus::BlockedBoth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::PendingFirst => "PendingFirst",
            FriendshipStatus::PendingSecond => "PendingSecond",
            FriendshipStatus::Friends => "Friends",
            FriendshipStatus::BlockedFirst => "BlockedFirst",
            FriendshipStatus::BlockedSecond => "BlockedSecond",
            FriendshipStatus::BlockedBoth => "BlockedBoth",
        }
    }
}

impl fmt::Display for FriendshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FriendshipStatus {
    type Err = AgendaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FriendshipStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AgendaError::UnknownFriendshipStatus(s.to_string()))
    }
}
