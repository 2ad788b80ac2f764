use agenda_shared::types::Permission;
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::models::Ownership;
use crate::sql;

/// Which join table an [`Ownership`] row lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipKind {
    Item,
    Note,
}

impl OwnershipKind {
    /// Singular name of the owned entity, for logs and errors.
    pub fn entity(&self) -> &'static str {
        match self {
            OwnershipKind::Item => "item",
            OwnershipKind::Note => "note",
        }
    }

    fn table(&self) -> &'static str {
        match self {
            OwnershipKind::Item => "item_on_user",
            OwnershipKind::Note => "note_on_user",
        }
    }

    fn entity_column(&self) -> &'static str {
        match self {
            OwnershipKind::Item => "item_id_fk",
            OwnershipKind::Note => "note_id_fk",
        }
    }
}

pub fn insert_ownership(conn: &Connection, kind: OwnershipKind, row: &Ownership) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {} ({}, user_id_fk, permission, invite_pending, sorting_rank)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            kind.table(),
            kind.entity_column()
        ),
        params![
            row.entity_id,
            row.user_id,
            row.permission.as_str(),
            row.invite_pending,
            row.sorting_rank,
        ],
    )?;
    Ok(())
}

pub fn delete_ownership(
    conn: &Connection,
    kind: OwnershipKind,
    entity_id: &str,
    user_id: &str,
) -> Result<bool> {
    let affected = conn.execute(
        &format!(
            "DELETE FROM {} WHERE {} = ?1 AND user_id_fk = ?2",
            kind.table(),
            kind.entity_column()
        ),
        params![entity_id, user_id],
    )?;
    Ok(affected > 0)
}

/// A user's entries of one kind, in their own sort order.
pub fn list_for_user(
    conn: &Connection,
    kind: OwnershipKind,
    user_id: &str,
) -> Result<Vec<Ownership>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {}, user_id_fk, permission, invite_pending, sorting_rank
         FROM {}
         WHERE user_id_fk = ?1
         ORDER BY sorting_rank ASC",
        kind.entity_column(),
        kind.table()
    ))?;

    let rows = stmt.query_map(params![user_id], |row| {
        let permission: String = row.get(2)?;
        Ok(Ownership {
            entity_id: row.get(0)?,
            user_id: row.get(1)?,
            permission: permission
                .parse::<Permission>()
                .map_err(|e| sql::conversion_error(2, e))?,
            invite_pending: row.get(3)?,
            sorting_rank: row.get(4)?,
        })
    })?;

    let mut owned = Vec::new();
    for row in rows {
        owned.push(row?);
    }
    Ok(owned)
}
