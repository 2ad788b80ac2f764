//! One instance per template and day.
//!
//! Earlier clients could generate the same recurring instance twice. Before
//! the unique index can exist, every duplicate group is reduced to the row
//! with the lowest id. Both phases share the unit's transaction: if the index
//! cannot be created, nothing is deleted either.

use rusqlite::Transaction;
use tracing::{info, warn};

use crate::error::Result;
use crate::migrations::Migration;

pub const NAME: &str = "2024-03-11_001_unique_item_instances";

const DUPLICATE_GROUPS_SQL: &str = r#"
SELECT template_id_fk, date, COUNT(*)
FROM items
WHERE template_id_fk IS NOT NULL AND date IS NOT NULL
GROUP BY template_id_fk, date
HAVING COUNT(*) > 1
ORDER BY template_id_fk, date
"#;

const PRUNE_SQL: &str = r#"
DELETE FROM items
WHERE template_id_fk IS NOT NULL
  AND date IS NOT NULL
  AND EXISTS (
      SELECT 1 FROM items AS keeper
      WHERE keeper.template_id_fk = items.template_id_fk
        AND keeper.date = items.date
        AND keeper.id < items.id
  )
"#;

const UP_SQL: &str =
    "CREATE UNIQUE INDEX idx_items_template_date ON items(template_id_fk, date);";

// Pruned rows are gone for good; only the constraint is reverted.
const DOWN_SQL: &str = "DROP INDEX idx_items_template_date;";

pub struct UniqueItemInstances;

impl Migration for UniqueItemInstances {
    fn name(&self) -> &str {
        NAME
    }

    fn up(&self, tx: &Transaction<'_>) -> Result<()> {
        let mut stmt = tx.prepare(DUPLICATE_GROUPS_SQL)?;
        let groups = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut group_count = 0usize;
        for group in groups {
            let (template, date, rows) = group?;
            warn!(template = %template, date = %date, rows, "duplicate item instances");
            group_count += 1;
        }
        drop(stmt);

        let removed = tx.execute(PRUNE_SQL, [])?;
        tx.execute_batch(UP_SQL)?;

        info!(groups = group_count, removed, "pruned duplicate item instances");
        Ok(())
    }

    fn down(&self, tx: &Transaction<'_>) -> Result<()> {
        tx.execute_batch(DOWN_SQL)?;
        Ok(())
    }
}
