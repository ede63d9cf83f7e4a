//! Database Connection Management
//!
//! This module provides the database connection, schema initialization and
//! the SQL behind every tree operation, using libsql (embedded SQLite).
//!
//! # Architecture
//!
//! - **Single table**: `animals(id, label, parent_id)` with a self-referencing
//!   foreign key on `parent_id`
//! - **Foreign keys**: Enabled on every connection (SQLite scopes the pragma
//!   to the connection, not the file)
//! - **WAL mode**: Readers never block the single writer
//! - **Immediate transactions**: Every mutation takes the write lock at
//!   `BEGIN`, so check-then-act sequences cannot interleave with other writers
//!
//! # Database Connection Patterns
//!
//! **ALWAYS use `connect_with_timeout()` in async functions.** The 5-second
//! busy timeout lets concurrent writers wait for the lock instead of failing
//! immediately with `SQLITE_BUSY`.
//!
//! ```no_run
//! # use animaltree_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let db_service = DatabaseService::new(PathBuf::from("./data/animals.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::{is_constraint_violation, DatabaseError};
use crate::models::{AnimalId, AnimalRecord, IntegrityReport};
use libsql::{Builder, Connection, Database, Row};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Label given to the root animal when bootstrapping an empty store
pub const ROOT_LABEL: &str = "root";

/// Recursive closure from the unique parentless row, ordered by identity.
const CLOSURE_QUERY: &str = "WITH RECURSIVE tree(id, label, parent_id) AS (
        SELECT id, label, parent_id FROM animals WHERE parent_id IS NULL
        UNION ALL
        SELECT a.id, a.label, a.parent_id
        FROM animals a
        INNER JOIN tree t ON a.parent_id = t.id
    )
    SELECT id, label, parent_id FROM tree ORDER BY id";

/// Moves `?2` under `?1` unless `?2` is `?1` itself or one of its ancestors.
///
/// The ancestor walk uses `UNION` so it terminates even on corrupted data.
const REPARENT_QUERY: &str = "UPDATE animals SET parent_id = ?1
    WHERE id = ?2
      AND ?2 NOT IN (
        WITH RECURSIVE ancestors(id, parent_id) AS (
            SELECT id, parent_id FROM animals WHERE id = ?1
            UNION
            SELECT a.id, a.parent_id
            FROM animals a
            INNER JOIN ancestors s ON a.id = s.parent_id
        )
        SELECT id FROM ancestors
      )";

const INTEGRITY_QUERY: &str = "SELECT
        (SELECT COUNT(*) FROM animals),
        (SELECT COUNT(*) FROM animals WHERE parent_id IS NULL),
        (SELECT COUNT(*) FROM animals a
            WHERE a.parent_id IS NOT NULL
              AND NOT EXISTS (SELECT 1 FROM animals p WHERE p.id = a.parent_id)),
        (WITH RECURSIVE reach(id) AS (
            SELECT id FROM animals WHERE parent_id IS NULL
            UNION
            SELECT a.id FROM animals a INNER JOIN reach r ON a.parent_id = r.id
        ) SELECT COUNT(*) FROM reach)";

/// Result of inserting a child animal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(AnimalId),
    ParentMissing,
}

/// Result of deleting an animal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    HasChildren,
    Missing,
}

/// Result of moving an animal under a new parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReparentOutcome {
    Reparented,
    Missing,
    ParentMissing,
    /// The new parent is the animal itself or one of its descendants
    WouldCycle,
}

/// Decides whether a transaction ends in `COMMIT` or `ROLLBACK`
trait TxOutcome {
    fn commits(&self) -> bool;
}

impl TxOutcome for InsertOutcome {
    fn commits(&self) -> bool {
        matches!(self, InsertOutcome::Inserted(_))
    }
}

impl TxOutcome for DeleteOutcome {
    fn commits(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted)
    }
}

impl TxOutcome for ReparentOutcome {
    fn commits(&self) -> bool {
        matches!(self, ReparentOutcome::Reparented)
    }
}

impl TxOutcome for AnimalId {
    fn commits(&self) -> bool {
        true
    }
}

/// Database service for managing the libsql connection and schema
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    db: Arc<Database>,

    /// Path to the database file
    db_path: PathBuf,
}

impl DatabaseService {
    /// Open (or create) the database at `db_path` and initialize the schema
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Enable WAL mode and create the `animals` table if absent
    ///
    /// Bootstrapping the root row is a separate step, see
    /// [`DatabaseService::ensure_root`].
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema().await?;

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements may return rows, so we must use query() instead of execute().
    async fn execute_pragma(&self, conn: &Connection, pragma: &str) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// Idempotent: safe to call on every startup.
    ///
    /// # Schema
    ///
    /// - `animals.id`: `INTEGER PRIMARY KEY AUTOINCREMENT`, so identities are
    ///   never reused and ascending identity is creation order
    /// - `animals.parent_id`: nullable self-reference without cascade; deleting
    ///   a referenced row is refused by storage
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS animals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                label TEXT NOT NULL,
                parent_id INTEGER NULL,
                FOREIGN KEY (parent_id) REFERENCES animals(id)
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create animals table: {}", e))
        })?;

        // Index on parent_id (closure joins and is-parent checks)
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_animals_parent ON animals(parent_id)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create index 'idx_animals_parent': {}",
                e
            ))
        })?;

        Ok(())
    }

    /// Path of the database file this service was opened on
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Raw connection; foreign keys are NOT enabled on it
    fn connect(&self) -> Result<Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get a connection with busy timeout and foreign keys configured
    ///
    /// **✅ RECOMMENDED**: Use this for all async functions.
    pub async fn connect_with_timeout(&self) -> Result<Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        Ok(conn)
    }

    async fn begin_immediate(&self, conn: &Connection) -> Result<(), DatabaseError> {
        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;
        Ok(())
    }

    /// Commit or roll back depending on the outcome of the transaction body
    async fn finish<T: TxOutcome>(
        &self,
        conn: &Connection,
        result: Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        match result {
            Ok(outcome) if outcome.commits() => {
                if let Err(e) = conn.execute("COMMIT", ()).await {
                    let _rollback = conn.execute("ROLLBACK", ()).await;
                    return Err(DatabaseError::sql_execution(format!(
                        "Failed to commit transaction: {}",
                        e
                    )));
                }
                Ok(outcome)
            }
            Ok(outcome) => {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                Ok(outcome)
            }
            Err(e) => {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    fn row_to_record(row: &Row) -> Result<AnimalRecord, DatabaseError> {
        Ok(AnimalRecord {
            id: row.get::<i64>(0)?,
            label: row.get::<String>(1)?,
            parent_id: row.get::<Option<i64>>(2)?,
        })
    }

    async fn exists(conn: &Connection, id: AnimalId) -> Result<bool, DatabaseError> {
        let mut rows = conn
            .query("SELECT 1 FROM animals WHERE id = ?", [id])
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to look up animal {}: {}", id, e))
            })?;
        Ok(rows.next().await?.is_some())
    }

    async fn count_single(&self, sql: &str) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        let mut rows = conn
            .query(sql, ())
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to count animals: {}", e)))?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)?.max(0) as u64),
            None => Ok(0),
        }
    }

    /// Bootstrap the root row if the store is empty and return the root identity
    ///
    /// The emptiness check and the insert run in one immediate transaction,
    /// so two processes starting against the same file cannot both seed.
    pub async fn ensure_root(&self) -> Result<AnimalId, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        self.begin_immediate(&conn).await?;

        let body: Result<AnimalId, DatabaseError> = async {
            let mut rows = conn.query("SELECT COUNT(*) FROM animals", ()).await?;
            let count = match rows.next().await? {
                Some(row) => row.get::<i64>(0)?,
                None => 0,
            };
            if count == 0 {
                conn.execute(
                    "INSERT INTO animals (label, parent_id) VALUES (?, NULL)",
                    [ROOT_LABEL],
                )
                .await
                .map_err(|e| {
                    DatabaseError::initialization_failed(format!(
                        "Failed to insert root animal: {}",
                        e
                    ))
                })?;
                tracing::info!("Bootstrapped empty store with root animal");
            }

            let mut rows = conn
                .query(
                    "SELECT id FROM animals WHERE parent_id IS NULL ORDER BY id LIMIT 1",
                    (),
                )
                .await?;
            match rows.next().await? {
                Some(row) => Ok(row.get::<i64>(0)?),
                None => Err(DatabaseError::initialization_failed(
                    "Store holds animals but none of them is parentless",
                )),
            }
        }
        .await;

        self.finish(&conn, body).await
    }

    /// Fetch every animal reachable from the root in one recursive query
    ///
    /// The whole result set is collected before returning.
    pub async fn db_fetch_closure(&self) -> Result<Vec<AnimalRecord>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut rows = conn.query(CLOSURE_QUERY, ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute closure query: {}", e))
        })?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::row_to_record(&row)?);
        }

        Ok(records)
    }

    /// Retrieve a single animal by identity
    pub async fn db_get_animal(&self, id: AnimalId) -> Result<Option<AnimalRecord>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut rows = conn
            .query("SELECT id, label, parent_id FROM animals WHERE id = ?", [id])
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to execute get_animal query: {}", e))
            })?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_record(&row)?)),
            None => Ok(None),
        }
    }

    /// Insert a child under `parent_id`
    ///
    /// Runs as: `BEGIN IMMEDIATE` → parent lookup → insert → `COMMIT`.
    /// A missing parent rolls back without writing anything.
    pub async fn db_insert_child(
        &self,
        parent_id: AnimalId,
        label: &str,
    ) -> Result<InsertOutcome, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        self.begin_immediate(&conn).await?;

        let body: Result<InsertOutcome, DatabaseError> = async {
            if !Self::exists(&conn, parent_id).await? {
                return Ok(InsertOutcome::ParentMissing);
            }

            match conn
                .execute(
                    "INSERT INTO animals (label, parent_id) VALUES (?, ?)",
                    (label, parent_id),
                )
                .await
            {
                Ok(_) => Ok(InsertOutcome::Inserted(conn.last_insert_rowid())),
                Err(e) if is_constraint_violation(&e) => Ok(InsertOutcome::ParentMissing),
                Err(e) => Err(DatabaseError::sql_execution(format!(
                    "Failed to insert animal: {}",
                    e
                ))),
            }
        }
        .await;

        self.finish(&conn, body).await
    }

    /// Delete a leaf animal
    ///
    /// The is-parent check and the delete share one immediate transaction.
    /// The restrictive foreign key backs the check: if a child row exists the
    /// delete itself fails with a constraint violation.
    pub async fn db_delete_leaf(&self, id: AnimalId) -> Result<DeleteOutcome, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        self.begin_immediate(&conn).await?;

        let body: Result<DeleteOutcome, DatabaseError> = async {
            let mut rows = conn
                .query("SELECT 1 FROM animals WHERE parent_id = ? LIMIT 1", [id])
                .await
                .map_err(|e| {
                    DatabaseError::sql_execution(format!(
                        "Failed to check children of animal {}: {}",
                        id, e
                    ))
                })?;
            if rows.next().await?.is_some() {
                return Ok(DeleteOutcome::HasChildren);
            }

            match conn.execute("DELETE FROM animals WHERE id = ?", [id]).await {
                Ok(0) => Ok(DeleteOutcome::Missing),
                Ok(_) => Ok(DeleteOutcome::Deleted),
                Err(e) if is_constraint_violation(&e) => Ok(DeleteOutcome::HasChildren),
                Err(e) => Err(DatabaseError::sql_execution(format!(
                    "Failed to delete animal: {}",
                    e
                ))),
            }
        }
        .await;

        self.finish(&conn, body).await
    }

    /// Move `id` under `new_parent_id` with a single conditional update
    ///
    /// The foreign key rejects a nonexistent parent. When no row was updated
    /// an existence probe in the same transaction tells a missing animal from
    /// a move that would close a cycle.
    pub async fn db_reparent(
        &self,
        id: AnimalId,
        new_parent_id: AnimalId,
    ) -> Result<ReparentOutcome, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        self.begin_immediate(&conn).await?;

        let body: Result<ReparentOutcome, DatabaseError> = async {
            match conn.execute(REPARENT_QUERY, (new_parent_id, id)).await {
                Ok(0) => {
                    if Self::exists(&conn, id).await? {
                        Ok(ReparentOutcome::WouldCycle)
                    } else {
                        Ok(ReparentOutcome::Missing)
                    }
                }
                Ok(_) => Ok(ReparentOutcome::Reparented),
                Err(e) if is_constraint_violation(&e) => Ok(ReparentOutcome::ParentMissing),
                Err(e) => Err(DatabaseError::sql_execution(format!(
                    "Failed to reparent animal: {}",
                    e
                ))),
            }
        }
        .await;

        self.finish(&conn, body).await
    }

    /// Total number of stored animals
    pub async fn db_count_animals(&self) -> Result<u64, DatabaseError> {
        self.count_single("SELECT COUNT(*) FROM animals").await
    }

    /// Evaluate the structural invariants directly against storage
    pub async fn db_integrity_report(&self) -> Result<IntegrityReport, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut rows = conn.query(INTEGRITY_QUERY, ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute integrity query: {}", e))
        })?;

        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::sql_execution("Integrity query returned no rows"))?;

        let count =
            |idx: i32| -> Result<u64, DatabaseError> { Ok(row.get::<i64>(idx)?.max(0) as u64) };

        Ok(IntegrityReport {
            total: count(0)?,
            roots: count(1)?,
            dangling: count(2)?,
            reachable: count(3)?,
        })
    }
}
