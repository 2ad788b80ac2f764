use rusqlite::{params, Connection};

use crate::error::Result;
use crate::models::Item;
use crate::sql;

const ITEM_COLUMNS: &str = "id, name, description, date, time, duration_minutes, repeat_rule, \
                            done, template_id_fk, created_at";

pub fn insert_item(conn: &Connection, item: &Item) -> Result<()> {
    conn.execute(
        "INSERT INTO items
             (id, name, description, date, time, duration_minutes, repeat_rule, done,
              template_id_fk, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            item.id,
            item.name,
            item.description,
            item.date.map(|d| d.format(sql::DATE_FORMAT).to_string()),
            item.time,
            item.duration_minutes,
            item.repeat_rule,
            item.done,
            item.template_id,
            item.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn item_exists(conn: &Connection, id: &str) -> Result<bool> {
    sql::id_exists(conn, "items", id)
}

pub fn get_item(conn: &Connection, id: &str) -> Result<Item> {
    conn.query_row(
        &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
        params![id],
        row_to_item,
    )
    .map_err(sql::not_found)
}

/// All items, ordered by id.
pub fn list_items(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id ASC"))?;
    let rows = stmt.query_map([], row_to_item)?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }
    Ok(items)
}

/// Delete an item. Instances of a deleted template keep existing with a null
/// template reference.
pub fn delete_item(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute("DELETE FROM items WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    let created_str: String = row.get(9)?;

    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        date: sql::date(3, row.get(3)?)?,
        time: row.get(4)?,
        duration_minutes: row.get(5)?,
        repeat_rule: row.get(6)?,
        done: row.get(7)?,
        template_id: row.get(8)?,
        created_at: sql::timestamp(9, &created_str)?,
    })
}
