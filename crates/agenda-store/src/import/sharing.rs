//! Item and note ownership, healing missing entities on write.
//!
//! The legacy store kept writing while it was being exported, so a user can
//! reference an item or note that was created after the bulk entity pass.
//! Such entities are fetched individually and inserted before the link.

use agenda_shared::legacy::LegacyEntryRef;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::info;

use super::entities::{write_item, write_note};
use super::{transform, ImportReport, RecordTransformError};
use crate::error::Result;
use crate::legacy_store::LegacyStore;
use crate::ownership::{self, OwnershipKind};
use crate::{items, notes, users};

type RecordResult<T> = std::result::Result<T, RecordTransformError>;

pub fn import_ownership(
    conn: &Connection,
    legacy: &dyn LegacyStore,
    kind: OwnershipKind,
) -> Result<ImportReport> {
    let now = Utc::now();
    let mut report = ImportReport::new(match kind {
        OwnershipKind::Item => "item ownership",
        OwnershipKind::Note => "note ownership",
    });

    for user in legacy.find_all_users()? {
        let entries = match kind {
            OwnershipKind::Item => &user.items,
            OwnershipKind::Note => &user.notes,
        };
        if entries.is_empty() {
            continue;
        }
        let user_present = users::user_exists(conn, &user.id)?;

        for (rank, entry) in entries.iter().enumerate() {
            let linked = if user_present {
                link(conn, legacy, kind, &user.id, rank, entry, now, &mut report)
            } else {
                Err(RecordTransformError::MissingReference {
                    entity: "user",
                    id: user.id.clone(),
                })
            };
            match linked {
                Ok(()) => report.imported += 1,
                Err(e) => report.skip(format!("{}/{}", user.id, entry.id), e),
            }
        }
    }

    Ok(report)
}

#[allow(clippy::too_many_arguments)]
fn link(
    conn: &Connection,
    legacy: &dyn LegacyStore,
    kind: OwnershipKind,
    user_id: &str,
    rank: usize,
    entry: &LegacyEntryRef,
    fallback: DateTime<Utc>,
    report: &mut ImportReport,
) -> RecordResult<()> {
    let row = transform::ownership_row(entry, user_id, rank)?;
    ensure_entity(conn, legacy, kind, &row.entity_id, fallback, report)?;
    ownership::insert_ownership(conn, kind, &row)?;
    Ok(())
}

fn ensure_entity(
    conn: &Connection,
    legacy: &dyn LegacyStore,
    kind: OwnershipKind,
    id: &str,
    fallback: DateTime<Utc>,
    report: &mut ImportReport,
) -> RecordResult<()> {
    let present = match kind {
        OwnershipKind::Item => items::item_exists(conn, id)?,
        OwnershipKind::Note => notes::note_exists(conn, id)?,
    };
    if present {
        return Ok(());
    }

    let missing = || RecordTransformError::MissingReference {
        entity: kind.entity(),
        id: id.to_string(),
    };
    match kind {
        OwnershipKind::Item => {
            let doc = legacy.get_item(id, false)?.ok_or_else(missing)?;
            write_item(conn, &doc, fallback, report)?;
        }
        OwnershipKind::Note => {
            let doc = legacy.get_note(id, false)?.ok_or_else(missing)?;
            write_note(conn, &doc, fallback)?;
        }
    }

    report.healed += 1;
    info!(entity = kind.entity(), id, "inserted missing entity before linking it");
    Ok(())
}
