//! Ordered, ledger-backed application of migration units.
//!
//! Units run strictly one after another in name order. Each unit gets its own
//! transaction holding both its effects and its ledger entry. The first
//! failing unit ends the run: later units depend on the state earlier ones
//! leave behind, so nothing after it is attempted.

use std::collections::HashSet;
use std::sync::Arc;

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{Result, StoreError};
use crate::legacy_store::LegacyStore;
use crate::migrations::data;
use crate::migrations::ledger::{Ledger, LedgerEntry};
use crate::migrations::Migration;

// ---------------------------------------------------------------------------
// Run result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnitStatus {
    /// A ledger entry already existed.
    Skipped,
    Applied,
    /// The unit's transaction was rolled back and the run halted.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitOutcome {
    pub name: String,
    pub status: UnitStatus,
}

#[derive(Debug)]
pub struct UnitFailure {
    pub name: String,
    pub error: StoreError,
}

/// What happened to each unit the run reached, in order.
#[derive(Debug, Default)]
pub struct RunResult {
    pub outcomes: Vec<UnitOutcome>,
    pub failure: Option<UnitFailure>,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn applied(&self) -> Vec<&str> {
        self.names_with(UnitStatus::Applied)
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.names_with(UnitStatus::Skipped)
    }

    fn names_with(&self, status: UnitStatus) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.status == status)
            .map(|o| o.name.as_str())
            .collect()
    }

    /// Turn a halted run into an error naming the failed unit.
    pub fn into_result(self) -> Result<Self> {
        match self.failure {
            Some(UnitFailure { name, error }) => Err(StoreError::Migration {
                name,
                message: error.to_string(),
            }),
            None => Ok(self),
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Ledger state of one family compared with the units the binary knows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub applied: Vec<LedgerEntry>,
    /// Known units without a ledger entry, in application order.
    pub pending: Vec<String>,
    /// Ledger entries no known unit carries.
    pub unknown: Vec<String>,
}

impl MigrationStatus {
    pub fn read(conn: &Connection, ledger: Ledger, unit_names: &[String]) -> Result<Self> {
        let applied = ledger.entries(conn)?;

        let applied_names: HashSet<&str> =
            applied.iter().map(|e| e.migration_name.as_str()).collect();
        let known: HashSet<&str> = unit_names.iter().map(String::as_str).collect();

        let mut pending: Vec<String> = unit_names
            .iter()
            .filter(|name| !applied_names.contains(name.as_str()))
            .cloned()
            .collect();
        pending.sort();

        let unknown = applied
            .iter()
            .filter(|e| !known.contains(e.migration_name.as_str()))
            .map(|e| e.migration_name.clone())
            .collect();

        Ok(Self {
            applied,
            pending,
            unknown,
        })
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

pub struct MigrationRunner {
    ledger: Ledger,
    /// Sorted by name, names unique.
    units: Vec<Box<dyn Migration>>,
}

impl MigrationRunner {
    /// Build a runner for one family.
    ///
    /// # Errors
    /// [`StoreError::DuplicateMigration`] if two units share a name.
    pub fn new(ledger: Ledger, mut units: Vec<Box<dyn Migration>>) -> Result<Self> {
        units.sort_by(|a, b| a.name().cmp(b.name()));

        if let Some(pair) = units.windows(2).find(|w| w[0].name() == w[1].name()) {
            return Err(StoreError::DuplicateMigration(pair[0].name().to_string()));
        }

        Ok(Self { ledger, units })
    }

    pub fn ledger(&self) -> Ledger {
        self.ledger
    }

    pub fn unit_names(&self) -> Vec<String> {
        self.units.iter().map(|u| u.name().to_string()).collect()
    }

    /// Apply every unit without a ledger entry.
    ///
    /// `Err` only when the ledger itself cannot be prepared or read; a unit
    /// failure is reported through [`RunResult::failure`].
    pub fn apply_all(&self, conn: &mut Connection) -> Result<RunResult> {
        self.run(conn, &self.units)
    }

    /// Apply units up to and including `checkpoint`. Units named after it are
    /// never attempted.
    ///
    /// # Errors
    /// [`StoreError::UnknownCheckpoint`] if no unit carries that name.
    pub fn apply_up_to(&self, conn: &mut Connection, checkpoint: &str) -> Result<RunResult> {
        let end = self
            .units
            .iter()
            .position(|u| u.name() == checkpoint)
            .ok_or_else(|| StoreError::UnknownCheckpoint(checkpoint.to_string()))?;

        self.run(conn, &self.units[..=end])
    }

    /// Run the backward operation of the most recently applied unit and drop
    /// its ledger entry, in one transaction. Returns the reverted unit's name,
    /// or `None` when nothing of this family is applied.
    pub fn rollback_last(&self, conn: &mut Connection) -> Result<Option<String>> {
        self.ledger.ensure(conn)?;

        let applied: HashSet<String> = self
            .ledger
            .entries(conn)?
            .into_iter()
            .map(|e| e.migration_name)
            .collect();

        let Some(unit) = self.units.iter().rev().find(|u| applied.contains(u.name())) else {
            return Ok(None);
        };
        let name = unit.name().to_string();

        let tx = conn.transaction()?;
        unit.down(&tx).map_err(|e| StoreError::Migration {
            name: name.clone(),
            message: e.to_string(),
        })?;
        self.ledger.remove(&tx, &name)?;
        tx.commit()?;

        info!(ledger = self.ledger.table(), unit = %name, "rolled back migration");
        Ok(Some(name))
    }

    pub fn status(&self, conn: &Connection) -> Result<MigrationStatus> {
        MigrationStatus::read(conn, self.ledger, &self.unit_names())
    }

    fn run(&self, conn: &mut Connection, units: &[Box<dyn Migration>]) -> Result<RunResult> {
        self.ledger.ensure(conn)?;

        for name in self.status(conn)?.unknown {
            warn!(
                ledger = self.ledger.table(),
                unit = %name,
                "ledger entry does not match any known migration"
            );
        }

        let mut result = RunResult::default();

        for unit in units {
            let name = unit.name().to_string();

            match self.apply_unit(conn, unit.as_ref()) {
                Ok(true) => {
                    info!(ledger = self.ledger.table(), unit = %name, "applied migration");
                    result.outcomes.push(UnitOutcome {
                        name,
                        status: UnitStatus::Applied,
                    });
                }
                Ok(false) => {
                    debug!(ledger = self.ledger.table(), unit = %name, "already applied");
                    result.outcomes.push(UnitOutcome {
                        name,
                        status: UnitStatus::Skipped,
                    });
                }
                Err(e) => {
                    error!(
                        ledger = self.ledger.table(),
                        unit = %name,
                        error = %e,
                        "migration failed, halting run"
                    );
                    result.outcomes.push(UnitOutcome {
                        name: name.clone(),
                        status: UnitStatus::Failed,
                    });
                    result.failure = Some(UnitFailure { name, error: e });
                    break;
                }
            }
        }

        info!(
            ledger = self.ledger.table(),
            applied = result.applied().len(),
            skipped = result.skipped().len(),
            failed = result.failure.is_some(),
            "migration run finished"
        );

        Ok(result)
    }

    /// `Ok(false)` when the unit was already applied.
    fn apply_unit(&self, conn: &mut Connection, unit: &dyn Migration) -> Result<bool> {
        if self.ledger.is_applied(conn, unit.name())? {
            return Ok(false);
        }

        let tx = conn.transaction()?;
        unit.up(&tx)?;
        self.ledger.record(&tx, unit.name())?;
        tx.commit()?;

        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Seed runner
// ---------------------------------------------------------------------------

/// Runs data units up to a fixed checkpoint. Meant to be invoked once, at
/// the cutover from the legacy store; afterwards every call is a no-op.
pub struct SeedRunner {
    runner: MigrationRunner,
}

impl SeedRunner {
    pub fn new(runner: MigrationRunner) -> Self {
        Self { runner }
    }

    /// The import units reading from `legacy`, tracked in the data ledger.
    pub fn for_legacy(legacy: Arc<dyn LegacyStore>) -> Result<Self> {
        Ok(Self::new(MigrationRunner::new(Ledger::DATA, data::units(legacy))?))
    }

    pub fn seed_up_to(&self, conn: &mut Connection, checkpoint: &str) -> Result<RunResult> {
        info!(checkpoint, "seeding from legacy store");

        let result = self.runner.apply_up_to(conn, checkpoint)?;

        if result.is_success() && result.applied().is_empty() {
            info!(checkpoint, "seed checkpoint already reached, nothing imported");
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rusqlite::Transaction;

    use super::*;
    use crate::migrations::SqlMigration;

    fn sql_unit(name: &'static str, up_sql: &'static str) -> Box<dyn Migration> {
        Box::new(SqlMigration {
            name,
            up_sql,
            down_sql: "",
        })
    }

    /// Records the order in which units are attempted.
    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl Migration for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn up(&self, tx: &Transaction<'_>) -> Result<()> {
            self.log.lock().unwrap().push(self.name.to_string());
            tx.execute(
                "INSERT INTO journal (name) VALUES (?1)",
                rusqlite::params![self.name],
            )?;
            if self.fail {
                return Err(StoreError::Legacy(format!("{} exploded", self.name)));
            }
            Ok(())
        }

        fn down(&self, tx: &Transaction<'_>) -> Result<()> {
            tx.execute(
                "DELETE FROM journal WHERE name = ?1",
                rusqlite::params![self.name],
            )?;
            Ok(())
        }
    }

    fn recorder_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE journal (name TEXT NOT NULL);")
            .unwrap();
        conn
    }

    fn recorders(
        log: &Arc<Mutex<Vec<String>>>,
        names: &[&'static str],
        failing: Option<&str>,
    ) -> Vec<Box<dyn Migration>> {
        names
            .iter()
            .map(|&name| {
                Box::new(Recorder {
                    name,
                    log: log.clone(),
                    fail: failing == Some(name),
                }) as Box<dyn Migration>
            })
            .collect()
    }

    fn recorded_rows(conn: &Connection) -> Vec<String> {
        let mut stmt = conn.prepare("SELECT name FROM journal ORDER BY rowid").unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }

    fn ledger_names(conn: &Connection, ledger: Ledger) -> Vec<String> {
        ledger
            .entries(conn)
            .unwrap()
            .into_iter()
            .map(|e| e.migration_name)
            .collect()
    }

    #[test]
    fn applies_in_name_order_regardless_of_input_order() {
        let mut conn = recorder_conn();
        let log = Arc::new(Mutex::new(Vec::new()));
        let runner = MigrationRunner::new(
            Ledger::SCHEMA,
            recorders(
                &log,
                &["2024-02-01_001_c", "2023-01-01_001_a", "2023-01-01_002_b"],
                None,
            ),
        )
        .unwrap();

        let result = runner.apply_all(&mut conn).unwrap();

        assert!(result.is_success());
        let expected = vec!["2023-01-01_001_a", "2023-01-01_002_b", "2024-02-01_001_c"];
        assert_eq!(*log.lock().unwrap(), expected);
        assert_eq!(result.applied(), expected);
        assert_eq!(ledger_names(&conn, Ledger::SCHEMA), expected);
    }

    #[test]
    fn second_run_skips_everything_and_changes_nothing() {
        let mut conn = recorder_conn();
        let log = Arc::new(Mutex::new(Vec::new()));
        let runner =
            MigrationRunner::new(Ledger::SCHEMA, recorders(&log, &["a", "b", "c"], None)).unwrap();

        runner.apply_all(&mut conn).unwrap();
        let ledger_before = Ledger::SCHEMA.entries(&conn).unwrap();
        let rows_before = recorded_rows(&conn);

        let second = runner.apply_all(&mut conn).unwrap();

        assert!(second.is_success());
        assert!(second.applied().is_empty());
        assert_eq!(second.skipped(), vec!["a", "b", "c"]);
        assert_eq!(Ledger::SCHEMA.entries(&conn).unwrap(), ledger_before);
        assert_eq!(recorded_rows(&conn), rows_before);
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[test]
    fn failure_halts_run_and_rolls_back_the_failing_unit() {
        let mut conn = recorder_conn();
        let log = Arc::new(Mutex::new(Vec::new()));
        let runner = MigrationRunner::new(
            Ledger::SCHEMA,
            recorders(&log, &["u1", "u2", "u3", "u4"], Some("u3")),
        )
        .unwrap();

        let result = runner.apply_all(&mut conn).unwrap();

        assert!(!result.is_success());
        assert_eq!(*log.lock().unwrap(), vec!["u1", "u2", "u3"]);
        assert_eq!(ledger_names(&conn, Ledger::SCHEMA), vec!["u1", "u2"]);
        // u3's own insert was part of its transaction
        assert_eq!(recorded_rows(&conn), vec!["u1", "u2"]);

        let failure = result.failure.as_ref().unwrap();
        assert_eq!(failure.name, "u3");
        assert_eq!(result.outcomes.last().unwrap().status, UnitStatus::Failed);
        assert!(result.outcomes.iter().all(|o| o.name != "u4"));

        match result.into_result() {
            Err(StoreError::Migration { name, message }) => {
                assert_eq!(name, "u3");
                assert!(message.contains("exploded"));
            }
            other => panic!("expected migration error, got {other:?}"),
        }
    }

    #[test]
    fn sql_errors_fail_the_unit() {
        let mut conn = Connection::open_in_memory().unwrap();
        let runner = MigrationRunner::new(
            Ledger::SCHEMA,
            vec![
                sql_unit("1_ok", "CREATE TABLE t (x INTEGER);"),
                sql_unit("2_bad", "CREATE TABLE u (x INTEGER); INSERT INTO missing VALUES (1);"),
                sql_unit("3_never", "CREATE TABLE v (x INTEGER);"),
            ],
        )
        .unwrap();

        let result = runner.apply_all(&mut conn).unwrap();

        assert_eq!(result.failure.as_ref().unwrap().name, "2_bad");
        let tables: Vec<String> = conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name IN ('t', 'u', 'v')",
            )
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(tables, vec!["t"]);
    }

    #[test]
    fn duplicate_names_are_a_configuration_error() {
        let err = MigrationRunner::new(
            Ledger::SCHEMA,
            vec![sql_unit("same", ""), sql_unit("other", ""), sql_unit("same", "")],
        )
        .err()
        .unwrap();

        assert!(matches!(err, StoreError::DuplicateMigration(ref n) if n == "same"));
        assert!(err.is_configuration());
    }

    #[test]
    fn apply_up_to_stops_at_checkpoint() {
        let mut conn = recorder_conn();
        let log = Arc::new(Mutex::new(Vec::new()));
        let runner =
            MigrationRunner::new(Ledger::DATA, recorders(&log, &["d1", "d2", "d3"], None)).unwrap();

        let result = runner.apply_up_to(&mut conn, "d2").unwrap();

        assert_eq!(result.applied(), vec!["d1", "d2"]);
        assert_eq!(ledger_names(&conn, Ledger::DATA), vec!["d1", "d2"]);
    }

    #[test]
    fn unknown_checkpoint_is_rejected_before_running() {
        let mut conn = recorder_conn();
        let log = Arc::new(Mutex::new(Vec::new()));
        let runner = MigrationRunner::new(Ledger::DATA, recorders(&log, &["d1"], None)).unwrap();

        let err = runner.apply_up_to(&mut conn, "nope").err().unwrap();

        assert!(matches!(err, StoreError::UnknownCheckpoint(_)));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn seed_runner_is_a_no_op_once_checkpoint_is_reached() {
        let mut conn = recorder_conn();
        let log = Arc::new(Mutex::new(Vec::new()));
        let seeder = SeedRunner::new(
            MigrationRunner::new(Ledger::DATA, recorders(&log, &["d1", "d2", "d3"], None)).unwrap(),
        );

        let first = seeder.seed_up_to(&mut conn, "d2").unwrap();
        assert_eq!(first.applied(), vec!["d1", "d2"]);

        let second = seeder.seed_up_to(&mut conn, "d2").unwrap();
        assert!(second.applied().is_empty());
        assert_eq!(second.skipped(), vec!["d1", "d2"]);
        assert_eq!(*log.lock().unwrap(), vec!["d1", "d2"]);
    }

    #[test]
    fn rollback_last_reverts_newest_applied_unit() {
        let mut conn = recorder_conn();
        let log = Arc::new(Mutex::new(Vec::new()));
        let runner =
            MigrationRunner::new(Ledger::SCHEMA, recorders(&log, &["a", "b", "c"], None)).unwrap();
        runner.apply_up_to(&mut conn, "b").unwrap();

        assert_eq!(runner.rollback_last(&mut conn).unwrap().as_deref(), Some("b"));
        assert_eq!(ledger_names(&conn, Ledger::SCHEMA), vec!["a"]);
        assert_eq!(recorded_rows(&conn), vec!["a"]);

        assert_eq!(runner.rollback_last(&mut conn).unwrap().as_deref(), Some("a"));
        assert_eq!(runner.rollback_last(&mut conn).unwrap(), None);

        // Reverted units are pending again.
        let rerun = runner.apply_all(&mut conn).unwrap();
        assert_eq!(rerun.applied(), vec!["a", "b", "c"]);
    }

    #[test]
    fn status_reports_pending_and_unknown_entries() {
        let mut conn = recorder_conn();
        let log = Arc::new(Mutex::new(Vec::new()));
        let runner =
            MigrationRunner::new(Ledger::SCHEMA, recorders(&log, &["a", "b"], None)).unwrap();
        Ledger::SCHEMA.ensure(&conn).unwrap();
        Ledger::SCHEMA.record(&conn, "retired").unwrap();

        runner.apply_up_to(&mut conn, "a").unwrap();
        let status = runner.status(&conn).unwrap();

        assert_eq!(status.pending, vec!["b"]);
        assert_eq!(status.unknown, vec!["retired"]);
        assert_eq!(status.applied.len(), 2);
    }
}
