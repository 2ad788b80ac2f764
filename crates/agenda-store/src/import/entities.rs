use agenda_shared::legacy::{LegacyDocument, LegacyItem, LegacyNote, LegacyUser};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::warn;

use super::{transform, ImportReport, RecordTransformError};
use crate::error::Result;
use crate::legacy_store::LegacyStore;
use crate::{items, notes, users};

/// Which half of the item collection an import pass covers. Templates go
/// first so instances can reference them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSelection {
    Templates,
    Instances,
}

impl ItemSelection {
    fn matches(&self, doc: &LegacyItem) -> bool {
        match self {
            ItemSelection::Templates => doc.is_template(),
            ItemSelection::Instances => !doc.is_template(),
        }
    }
}

pub fn import_users(conn: &Connection, legacy: &dyn LegacyStore) -> Result<ImportReport> {
    let now = Utc::now();
    let mut report = ImportReport::new("user");
    report.skip_rejected(legacy.rejected(LegacyUser::COLLECTION));

    for doc in legacy.find_all_users()? {
        let written = transform::user_row(&doc, now)
            .and_then(|row| users::insert_user(conn, &row).map_err(RecordTransformError::from));
        match written {
            Ok(()) => report.imported += 1,
            Err(e) => report.skip(doc.id, e),
        }
    }

    Ok(report)
}

pub fn import_items(
    conn: &Connection,
    legacy: &dyn LegacyStore,
    selection: ItemSelection,
) -> Result<ImportReport> {
    let now = Utc::now();
    let mut report = ImportReport::new(match selection {
        ItemSelection::Templates => "template item",
        ItemSelection::Instances => "instance item",
    });
    // Undecodable items cannot be told apart, so the first pass reports them.
    if selection == ItemSelection::Templates {
        report.skip_rejected(legacy.rejected(LegacyItem::COLLECTION));
    }

    for doc in legacy.find_all_items()? {
        if !selection.matches(&doc) {
            continue;
        }
        match write_item(conn, &doc, now, &mut report) {
            Ok(()) => report.imported += 1,
            Err(e) => report.skip(doc.id, e),
        }
    }

    Ok(report)
}

pub fn import_notes(conn: &Connection, legacy: &dyn LegacyStore) -> Result<ImportReport> {
    let now = Utc::now();
    let mut report = ImportReport::new("note");
    report.skip_rejected(legacy.rejected(LegacyNote::COLLECTION));

    for doc in legacy.find_all_notes()? {
        match write_note(conn, &doc, now) {
            Ok(()) => report.imported += 1,
            Err(e) => report.skip(doc.id, e),
        }
    }

    Ok(report)
}

/// Insert one legacy item. A template reference that does not resolve in
/// the relational store is dropped and counted instead of failing the row.
pub(super) fn write_item(
    conn: &Connection,
    doc: &LegacyItem,
    fallback: DateTime<Utc>,
    report: &mut ImportReport,
) -> std::result::Result<(), RecordTransformError> {
    let mut row = transform::item_row(doc, fallback)?;

    let unresolved = match row.template_id.as_deref() {
        Some(template) => !items::item_exists(conn, template)?,
        None => false,
    };
    if unresolved {
        warn!(
            item = %row.id,
            template = ?row.template_id,
            "template not found, importing item without it"
        );
        row.template_id = None;
    }

    items::insert_item(conn, &row)?;
    if unresolved {
        report.unresolved_references += 1;
    }
    Ok(())
}

pub(super) fn write_note(
    conn: &Connection,
    doc: &LegacyNote,
    fallback: DateTime<Utc>,
) -> std::result::Result<(), RecordTransformError> {
    let row = transform::note_row(doc, fallback)?;
    notes::insert_note(conn, &row)?;
    Ok(())
}
