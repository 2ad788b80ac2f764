use rusqlite::{params, Connection};

use crate::error::Result;
use crate::models::Note;
use crate::sql;

pub fn insert_note(conn: &Connection, note: &Note) -> Result<()> {
    conn.execute(
        "INSERT INTO notes (id, title, content, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            note.id,
            note.title,
            note.content,
            note.created_at.to_rfc3339(),
            note.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn note_exists(conn: &Connection, id: &str) -> Result<bool> {
    sql::id_exists(conn, "notes", id)
}

pub fn get_note(conn: &Connection, id: &str) -> Result<Note> {
    conn.query_row(
        "SELECT id, title, content, created_at, updated_at FROM notes WHERE id = ?1",
        params![id],
        |row| {
            let created_str: String = row.get(3)?;
            let updated_str: String = row.get(4)?;
            Ok(Note {
                id: row.get(0)?,
                title: row.get(1)?,
                content: row.get(2)?,
                created_at: sql::timestamp(3, &created_str)?,
                updated_at: sql::timestamp(4, &updated_str)?,
            })
        },
    )
    .map_err(sql::not_found)
}

pub fn delete_note(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute("DELETE FROM notes WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}
