//! Data units: the one-time import of the legacy store.
//!
//! Each unit imports one entity kind. Names sort so that rows exist before
//! anything that references them: users, template items, instance items,
//! notes, then the ownership links and finally friendships.

use std::sync::Arc;

use rusqlite::Transaction;
use tracing::info;

use crate::error::Result;
use crate::import::{self, ItemSelection};
use crate::legacy_store::LegacyStore;
use crate::migrations::Migration;
use crate::ownership::{self, OwnershipKind};
use crate::{friendships, items, notes, users};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImportStep {
    Users,
    TemplateItems,
    InstanceItems,
    Notes,
    ItemOwnership,
    NoteOwnership,
    Friendships,
}

const STEPS: [(&str, ImportStep); 7] = [
    ("2023-09-01_001_import_users", ImportStep::Users),
    ("2023-09-01_002_import_template_items", ImportStep::TemplateItems),
    ("2023-09-01_003_import_instance_items", ImportStep::InstanceItems),
    ("2023-09-01_004_import_notes", ImportStep::Notes),
    ("2023-09-01_005_import_item_ownership", ImportStep::ItemOwnership),
    ("2023-09-01_006_import_note_ownership", ImportStep::NoteOwnership),
    ("2023-09-01_007_import_friendships", ImportStep::Friendships),
];

pub fn unit_names() -> impl Iterator<Item = &'static str> {
    STEPS.iter().map(|(name, _)| *name)
}

/// Every data unit, each holding a handle to `legacy`.
pub fn units(legacy: Arc<dyn LegacyStore>) -> Vec<Box<dyn Migration>> {
    STEPS
        .iter()
        .map(|&(name, step)| {
            Box::new(LegacyImport {
                name,
                step,
                legacy: Arc::clone(&legacy),
            }) as Box<dyn Migration>
        })
        .collect()
}

struct LegacyImport {
    name: &'static str,
    step: ImportStep,
    legacy: Arc<dyn LegacyStore>,
}

impl Migration for LegacyImport {
    fn name(&self) -> &str {
        self.name
    }

    fn up(&self, tx: &Transaction<'_>) -> Result<()> {
        let legacy = self.legacy.as_ref();
        let report = match self.step {
            ImportStep::Users => import::import_users(tx, legacy)?,
            ImportStep::TemplateItems => {
                import::import_items(tx, legacy, ItemSelection::Templates)?
            }
            ImportStep::InstanceItems => {
                import::import_items(tx, legacy, ItemSelection::Instances)?
            }
            ImportStep::Notes => import::import_notes(tx, legacy)?,
            ImportStep::ItemOwnership => import::import_ownership(tx, legacy, OwnershipKind::Item)?,
            ImportStep::NoteOwnership => import::import_ownership(tx, legacy, OwnershipKind::Note)?,
            ImportStep::Friendships => import::import_friendships(tx, legacy)?,
        };
        report.log(self.name);
        Ok(())
    }

    /// Remove the rows this unit derives from the legacy store. Entities
    /// healed while importing ownership stay; they belong to the item and
    /// note units' id space.
    fn down(&self, tx: &Transaction<'_>) -> Result<()> {
        let legacy = self.legacy.as_ref();
        let mut removed = 0usize;

        match self.step {
            ImportStep::Users => {
                for doc in legacy.find_all_users()? {
                    removed += usize::from(users::delete_user(tx, &doc.id)?);
                }
            }
            ImportStep::TemplateItems | ImportStep::InstanceItems => {
                let templates = self.step == ImportStep::TemplateItems;
                for doc in legacy.find_all_items()? {
                    if doc.is_template() == templates {
                        removed += usize::from(items::delete_item(tx, &doc.id)?);
                    }
                }
            }
            ImportStep::Notes => {
                for doc in legacy.find_all_notes()? {
                    removed += usize::from(notes::delete_note(tx, &doc.id)?);
                }
            }
            ImportStep::ItemOwnership | ImportStep::NoteOwnership => {
                let kind = if self.step == ImportStep::ItemOwnership {
                    OwnershipKind::Item
                } else {
                    OwnershipKind::Note
                };
                for user in legacy.find_all_users()? {
                    let entries = match kind {
                        OwnershipKind::Item => &user.items,
                        OwnershipKind::Note => &user.notes,
                    };
                    for entry in entries {
                        let deleted = ownership::delete_ownership(tx, kind, &entry.id, &user.id)?;
                        removed += usize::from(deleted);
                    }
                }
            }
            ImportStep::Friendships => {
                for user in legacy.find_all_users()? {
                    for (other, _) in import::transform::friendship_candidates(&user) {
                        let deleted = friendships::delete_friendship(tx, &user.id, other)?;
                        removed += usize::from(deleted);
                    }
                }
            }
        }

        info!(unit = self.name, removed, "reverted legacy import");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use agenda_shared::constants::SEED_CHECKPOINT;
    use agenda_shared::legacy::LegacyEntryRef;
    use agenda_shared::types::FriendshipStatus;

    use super::*;
    use crate::error::StoreError;
    use crate::import::test_support::{item, migrated_db, note, store, user};
    use crate::migrations::ledger::Ledger;
    use crate::migrations::runner::MigrationRunner;

    fn owned(id: &str) -> LegacyEntryRef {
        LegacyEntryRef {
            id: id.to_string(),
            permission: None,
            pending: false,
        }
    }

    fn fixture() -> Arc<dyn LegacyStore> {
        let mut a = user("a");
        a.social.friends = vec!["b".into()];
        a.items = vec![owned("t1"), owned("i1"), owned("i2")];
        a.notes = vec![owned("n1")];
        let mut b = user("b");
        b.social.friends = vec!["a".into()];
        b.items = vec![owned("t1")];

        Arc::new(store(
            vec![b, a],
            vec![item("i1", Some("t1")), item("t1", None), item("i2", Some("gone"))],
            vec![note("n1")],
        ))
    }

    fn count(db: &crate::database::Database, table: &str) -> i64 {
        db.conn()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn checkpoint_is_the_last_unit() {
        assert_eq!(unit_names().last(), Some(SEED_CHECKPOINT));
        let mut sorted: Vec<_> = unit_names().collect();
        sorted.sort();
        assert_eq!(sorted, unit_names().collect::<Vec<_>>());
    }

    #[test]
    fn seed_imports_every_entity() {
        let mut db = migrated_db();

        let result = db.seed(fixture(), SEED_CHECKPOINT).unwrap().into_result().unwrap();

        assert_eq!(result.applied(), unit_names().collect::<Vec<_>>());
        assert_eq!(count(&db, "users"), 2);
        assert_eq!(count(&db, "items"), 3);
        assert_eq!(count(&db, "notes"), 1);
        assert_eq!(count(&db, "item_on_user"), 4);
        assert_eq!(count(&db, "note_on_user"), 1);

        assert_eq!(items::get_item(db.conn(), "i1").unwrap().template_id.as_deref(), Some("t1"));
        assert_eq!(items::get_item(db.conn(), "i2").unwrap().template_id, None);

        let friends = friendships::list_friendships(db.conn()).unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].status, FriendshipStatus::Friends);
    }

    #[test]
    fn second_seed_is_a_no_op() {
        let mut db = migrated_db();
        let legacy = fixture();
        db.seed(Arc::clone(&legacy), SEED_CHECKPOINT).unwrap();

        let again = db.seed(legacy, SEED_CHECKPOINT).unwrap();

        assert!(again.is_success());
        assert!(again.applied().is_empty());
        assert_eq!(again.skipped().len(), 7);
        assert_eq!(count(&db, "users"), 2);
        assert_eq!(count(&db, "item_on_user"), 4);
    }

    #[test]
    fn earlier_checkpoint_leaves_later_units_pending() {
        let mut db = migrated_db();

        db.seed(fixture(), "2023-09-01_004_import_notes")
            .unwrap()
            .into_result()
            .unwrap();

        let status = db.data_status().unwrap();
        assert_eq!(status.applied.len(), 4);
        assert_eq!(
            status.pending,
            vec![
                "2023-09-01_005_import_item_ownership",
                "2023-09-01_006_import_note_ownership",
                "2023-09-01_007_import_friendships",
            ]
        );
        assert_eq!(count(&db, "item_on_user"), 0);
    }

    #[test]
    fn unknown_checkpoint_is_rejected_before_importing() {
        let mut db = migrated_db();

        let err = db.seed(fixture(), "2023-09-01_999_nothing").unwrap_err();

        assert!(matches!(err, StoreError::UnknownCheckpoint(_)));
        assert_eq!(count(&db, "users"), 0);
    }

    #[test]
    fn rollback_reverts_units_newest_first() {
        let mut db = migrated_db();
        let legacy = fixture();
        let runner = MigrationRunner::new(Ledger::DATA, units(Arc::clone(&legacy))).unwrap();
        runner.apply_all(db.conn_mut()).unwrap().into_result().unwrap();

        assert_eq!(
            runner.rollback_last(db.conn_mut()).unwrap().as_deref(),
            Some("2023-09-01_007_import_friendships")
        );
        assert_eq!(count(&db, "friendships"), 0);
        assert_eq!(count(&db, "note_on_user"), 1);

        runner.rollback_last(db.conn_mut()).unwrap();
        assert_eq!(count(&db, "note_on_user"), 0);
        assert_eq!(count(&db, "item_on_user"), 4);

        // Reapplying picks up exactly what was reverted.
        let result = runner.apply_all(db.conn_mut()).unwrap();
        assert_eq!(result.applied().len(), 2);
        assert_eq!(count(&db, "friendships"), 1);
    }
}
