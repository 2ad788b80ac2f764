use rusqlite::{params, Connection};

use crate::error::Result;
use crate::models::User;
use crate::sql;

pub fn insert_user(conn: &Connection, user: &User) -> Result<()> {
    conn.execute(
        "INSERT INTO users
             (id, username, email, password_hash, timezone, notify_minutes_before, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id,
            user.username,
            user.email,
            user.password_hash,
            user.timezone,
            user.notify_minutes_before,
            user.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn user_exists(conn: &Connection, id: &str) -> Result<bool> {
    sql::id_exists(conn, "users", id)
}

pub fn get_user(conn: &Connection, id: &str) -> Result<User> {
    conn.query_row(
        "SELECT id, username, email, password_hash, timezone, notify_minutes_before, created_at
         FROM users WHERE id = ?1",
        params![id],
        row_to_user,
    )
    .map_err(sql::not_found)
}

/// Delete a user and, through cascading keys, their ownership and friendship
/// rows. Returns `true` if a row was deleted.
pub fn delete_user(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let created_str: String = row.get(6)?;

    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        timezone: row.get(4)?,
        notify_minutes_before: row.get(5)?,
        created_at: sql::timestamp(6, &created_str)?,
    })
}
