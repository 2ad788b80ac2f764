use agenda_shared::types::FriendshipStatus;
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::models::Friendship;
use crate::sql;

pub fn insert_friendship(conn: &Connection, row: &Friendship) -> Result<()> {
    conn.execute(
        "INSERT INTO friendships (user1_id_fk, user2_id_fk, status) VALUES (?1, ?2, ?3)",
        params![row.user1_id, row.user2_id, row.status.as_str()],
    )?;
    Ok(())
}

/// Look up the row for an unordered pair.
pub fn get_friendship(conn: &Connection, a: &str, b: &str) -> Result<Friendship> {
    let (first, second) = if a < b { (a, b) } else { (b, a) };
    conn.query_row(
        "SELECT user1_id_fk, user2_id_fk, status FROM friendships
         WHERE user1_id_fk = ?1 AND user2_id_fk = ?2",
        params![first, second],
        row_to_friendship,
    )
    .map_err(sql::not_found)
}

/// All friendship rows, ordered by pair.
pub fn list_friendships(conn: &Connection) -> Result<Vec<Friendship>> {
    let mut stmt = conn.prepare(
        "SELECT user1_id_fk, user2_id_fk, status FROM friendships
         ORDER BY user1_id_fk ASC, user2_id_fk ASC",
    )?;
    let rows = stmt.query_map([], row_to_friendship)?;

    let mut friendships = Vec::new();
    for row in rows {
        friendships.push(row?);
    }
    Ok(friendships)
}

pub fn delete_friendship(conn: &Connection, a: &str, b: &str) -> Result<bool> {
    let (first, second) = if a < b { (a, b) } else { (b, a) };
    let affected = conn.execute(
        "DELETE FROM friendships WHERE user1_id_fk = ?1 AND user2_id_fk = ?2",
        params![first, second],
    )?;
    Ok(affected > 0)
}

fn row_to_friendship(row: &rusqlite::Row<'_>) -> rusqlite::Result<Friendship> {
    let status: String = row.get(2)?;
    Ok(Friendship {
        user1_id: row.get(0)?,
        user2_id: row.get(1)?,
        status: status
            .parse::<FriendshipStatus>()
            .map_err(|e| sql::conversion_error(2, e))?,
    })
}
