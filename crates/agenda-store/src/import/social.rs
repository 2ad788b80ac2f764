//! Friendships from the per-user social arrays.
//!
//! Both users of a pair list each other, so every relation is seen twice.
//! Only the side with the lexically smaller id writes the row; the other
//! side's view is dropped, including its status when the two disagree.

use agenda_shared::types::FriendshipStatus;
use rusqlite::Connection;

use super::{transform, ImportReport, RecordTransformError};
use crate::error::Result;
use crate::legacy_store::LegacyStore;
use crate::models::Friendship;
use crate::{friendships, users};

enum Linked {
    Inserted,
    Deferred,
}

pub fn import_friendships(conn: &Connection, legacy: &dyn LegacyStore) -> Result<ImportReport> {
    let mut report = ImportReport::new("friendship");

    for user in legacy.find_all_users()? {
        for (other, status) in transform::friendship_candidates(&user) {
            match link_pair(conn, &user.id, other, status) {
                Ok(Linked::Inserted) => report.imported += 1,
                Ok(Linked::Deferred) => report.deferred += 1,
                Err(e) => report.skip(format!("{}/{other}", user.id), e),
            }
        }
    }

    Ok(report)
}

fn link_pair(
    conn: &Connection,
    user_id: &str,
    other_id: &str,
    status: FriendshipStatus,
) -> std::result::Result<Linked, RecordTransformError> {
    if user_id == other_id {
        return Err(RecordTransformError::Malformed {
            field: "social",
            reason: "user lists itself".to_string(),
        });
    }
    for id in [user_id, other_id] {
        if !users::user_exists(conn, id)? {
            return Err(RecordTransformError::MissingReference {
                entity: "user",
                id: id.to_string(),
            });
        }
    }

    let Some(row) = Friendship::canonical(user_id, other_id, status) else {
        return Ok(Linked::Deferred);
    };
    friendships::insert_friendship(conn, &row)?;
    Ok(Linked::Inserted)
}
