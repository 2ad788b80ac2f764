//! Database preparation before the listener binds.
//!
//! Schema units run on every start. The legacy seed runs only when a dump
//! directory is configured, and is a no-op once its checkpoint is in the
//! data ledger. Any failure here is fatal: the server never serves a
//! partially migrated database.

use std::sync::Arc;

use agenda_store::{Database, JsonDumpStore, RunResult};
use anyhow::Context;
use tracing::{error, info};

use crate::config::ServerConfig;

pub fn prepare_database(config: &ServerConfig) -> anyhow::Result<Database> {
    let mut db = match &config.database_path {
        Some(path) => Database::open_at(path)
            .with_context(|| format!("opening database at {}", path.display()))?,
        None => Database::new().context("opening default database")?,
    };
    info!(path = ?db.path(), "Opened database");

    let result = db.migrate().context("preparing schema migrations")?;
    ensure_success("schema", result)?;

    if let Some(dir) = &config.legacy_dump_dir {
        let legacy = JsonDumpStore::open_dir(dir)
            .with_context(|| format!("loading legacy dump from {}", dir.display()))?;
        let result = db
            .seed(Arc::new(legacy), &config.seed_checkpoint)
            .context("preparing legacy seed")?;
        ensure_success("data", result)?;
    }

    Ok(db)
}

/// Log the failed unit and turn a halted run into an error.
fn ensure_success(family: &str, result: RunResult) -> anyhow::Result<()> {
    if let Some(failure) = &result.failure {
        error!(
            family,
            unit = %failure.name,
            error = %failure.error,
            "Migration failed, refusing to start"
        );
    } else {
        info!(
            family,
            applied = result.applied().len(),
            skipped = result.skipped().len(),
            "Migrations up to date"
        );
    }

    result.into_result()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use agenda_shared::constants::{LEGACY_ITEMS_FILE, LEGACY_NOTES_FILE, LEGACY_USERS_FILE};

    use super::*;

    fn write_dump(dir: &Path) {
        std::fs::write(
            dir.join(LEGACY_USERS_FILE),
            r#"[
                {"_id": {"$oid": "a"}, "username": "ada", "social": {"friends": ["b"]},
                 "items": [{"item": "t1"}]},
                {"_id": {"$oid": "b"}, "username": "bea", "social": {"friends": ["a"]}}
            ]"#,
        )
        .unwrap();
        std::fs::write(
            dir.join(LEGACY_ITEMS_FILE),
            r#"[{"_id": "t1", "name": "Gym", "repeat": "weekly"}]"#,
        )
        .unwrap();
        std::fs::write(dir.join(LEGACY_NOTES_FILE), "[]").unwrap();
    }

    fn config(db: &Path, dump: Option<&Path>) -> ServerConfig {
        ServerConfig {
            database_path: Some(db.to_path_buf()),
            legacy_dump_dir: dump.map(Path::to_path_buf),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn migrates_without_a_dump() {
        let dir = tempfile::tempdir().unwrap();
        let db = prepare_database(&config(&dir.path().join("agenda.db"), None)).unwrap();

        assert!(db.schema_status().unwrap().pending.is_empty());
        assert_eq!(db.data_status().unwrap().pending.len(), 7);
    }

    #[test]
    fn seeds_once_from_a_dump() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dir.path().join("dump");
        std::fs::create_dir(&dump).unwrap();
        write_dump(&dump);
        let cfg = config(&dir.path().join("agenda.db"), Some(&dump));

        let db = prepare_database(&cfg).unwrap();
        assert!(db.data_status().unwrap().pending.is_empty());
        assert_eq!(agenda_store::friendships::list_friendships(db.conn()).unwrap().len(), 1);
        drop(db);

        // Restarting against the same database changes nothing.
        let db = prepare_database(&cfg).unwrap();
        assert_eq!(db.data_status().unwrap().applied.len(), 7);
        assert_eq!(agenda_store::items::list_items(db.conn()).unwrap().len(), 1);
    }

    #[test]
    fn malformed_documents_do_not_stop_the_seed() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dir.path().join("dump");
        std::fs::create_dir(&dump).unwrap();
        write_dump(&dump);
        std::fs::write(
            dump.join(LEGACY_ITEMS_FILE),
            r#"[
                {"_id": "t1", "name": "Gym", "repeat": "weekly"},
                {"_id": "t2", "name": "Run", "duration": "30"},
                {"_id": "t3", "name": null, "done": null}
            ]"#,
        )
        .unwrap();

        let db = prepare_database(&config(&dir.path().join("agenda.db"), Some(&dump))).unwrap();

        assert!(db.data_status().unwrap().pending.is_empty());
        let items = agenda_store::items::list_items(db.conn()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "t1");
    }

    #[test]
    fn unreadable_dump_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");

        assert!(prepare_database(&config(&dir.path().join("agenda.db"), Some(&missing))).is_err());
    }

    #[test]
    fn unknown_checkpoint_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dir.path().join("dump");
        std::fs::create_dir(&dump).unwrap();
        write_dump(&dump);
        let mut cfg = config(&dir.path().join("agenda.db"), Some(&dump));
        cfg.seed_checkpoint = "2023-09-01_999_nothing".to_string();

        assert!(prepare_database(&cfg).is_err());
    }
}
