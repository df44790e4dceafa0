//! Database Connection Management
//!
//! This module provides the core database connection and initialization
//! functionality using libsql/Turso for the relationship graph tables.
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any valid PathBuf
//! - **WAL mode**: Write-Ahead Logging for better concurrency
//! - **Foreign keys**: Enabled for referential integrity
//! - **Canonical edge identity**: UNIQUE constraints on
//!   `(project_id, source_task_id, target_task_id, link_type)` and on
//!   `(project_id, child_task_id)` back the validation layer at the storage
//!   level, so two racing writers cannot both commit conflicting rows
//! - **Paired writes**: link create/delete always touches the original row
//!   and its mirror inside one transaction
//!
//! # Database Connection Patterns
//!
//! **ALWAYS use `connect_with_timeout()` in async functions** to avoid SQLite
//! thread-safety violations when the Tokio runtime moves futures between
//! threads. The 5-second busy timeout allows concurrent operations to wait
//! and retry instead of failing immediately with `SQLITE_BUSY` errors.

use crate::db::error::DatabaseError;
use libsql::{Builder, Database, Row};
use std::path::PathBuf;
use std::sync::Arc;

/// Database service for managing the libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use tasklane_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db_path = PathBuf::from("/path/to/tasklane.db");
///     let db_service = DatabaseService::new(db_path).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database connection (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

/// Parameters for a stored link row (avoids too-many-arguments lint)
pub struct DbLinkRow<'a> {
    pub id: &'a str,
    pub project_id: &'a str,
    pub source_task_id: &'a str,
    pub target_task_id: &'a str,
    pub link_type: &'a str,
    pub created_at: &'a str,
}

/// Parameters for a stored hierarchy row
pub struct DbHierarchyRow<'a> {
    pub id: &'a str,
    pub project_id: &'a str,
    pub parent_task_id: &'a str,
    pub child_task_id: &'a str,
    pub created_at: &'a str,
}

/// Parameters for a task row (fixture/integration entry point)
pub struct DbTaskRow<'a> {
    pub id: &'a str,
    pub project_id: &'a str,
    pub title: &'a str,
    pub assignee_id: Option<&'a str>,
    pub created_at: &'a str,
}

impl DatabaseService {
    /// Create a new DatabaseService with the specified database path
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    /// 4. Enable SQLite features (WAL mode, foreign keys)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        let is_new_database = !db_path.exists();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
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

        service.initialize_schema(is_new_database).await?;

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so we must use query() instead of
    /// execute(). This helper encapsulates that pattern.
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
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
    /// Creates tables and indexes using CREATE TABLE IF NOT EXISTS, ensuring
    /// idempotent initialization (safe to call multiple times).
    ///
    /// # Schema
    ///
    /// - `tasks` table: task projections, owned by the task service
    /// - `task_links` table: mirrored typed edges between tasks
    /// - `task_hierarchy` table: single-row parent/child edges
    async fn initialize_schema(&self, is_new_database: bool) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        // Enable WAL mode for better concurrency
        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        // Wait up to 5s instead of failing immediately on lock
        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;

        // Enable foreign key constraints
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        // Task projections. The task service owns the full task records;
        // this table carries the slice the graph layer reads.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                assignee_id TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to create tasks table: {}", e))
        })?;

        // Link edges. Every logical relationship is two rows (original +
        // mirror); the UNIQUE constraint is the storage-level backstop
        // against racing duplicate writes.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS task_links (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                source_task_id TEXT NOT NULL,
                target_task_id TEXT NOT NULL,
                link_type TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (source_task_id) REFERENCES tasks(id) ON DELETE CASCADE,
                FOREIGN KEY (target_task_id) REFERENCES tasks(id) ON DELETE CASCADE,
                UNIQUE (project_id, source_task_id, target_task_id, link_type)
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to create task_links table: {}", e))
        })?;

        // Hierarchy edges. UNIQUE (project_id, child_task_id) enforces the
        // single-parent forest invariant at the storage level.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS task_hierarchy (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                parent_task_id TEXT NOT NULL,
                child_task_id TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (parent_task_id) REFERENCES tasks(id) ON DELETE CASCADE,
                FOREIGN KEY (child_task_id) REFERENCES tasks(id) ON DELETE CASCADE,
                UNIQUE (project_id, child_task_id)
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to create task_hierarchy table: {}", e))
        })?;

        self.create_core_indexes(&conn).await?;

        // Force WAL checkpoint only for newly created databases. This
        // prevents race conditions where rapid database swaps in tests cause
        // "no such table" errors due to WAL entries not being flushed.
        if is_new_database {
            self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
                .await?;
        }

        Ok(())
    }

    /// Create core indexes for the relationship tables
    ///
    /// These indexes never change (no ALTER TABLE required on user machines).
    async fn create_core_indexes(&self, conn: &libsql::Connection) -> Result<(), DatabaseError> {
        let indexes = [
            ("idx_tasks_project", "tasks(project_id)"),
            // All "links for task" reads key on source_task_id; mirroring
            // guarantees every logical link has one row per endpoint-as-source.
            ("idx_links_source", "task_links(source_task_id)"),
            ("idx_links_target", "task_links(target_task_id)"),
            ("idx_links_project", "task_links(project_id)"),
            ("idx_hierarchy_parent", "task_hierarchy(parent_task_id)"),
            ("idx_hierarchy_child", "task_hierarchy(child_task_id)"),
        ];

        for (name, columns) in indexes {
            conn.execute(
                &format!("CREATE INDEX IF NOT EXISTS {} ON {}", name, columns),
                (),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to create index '{}': {}", name, e))
            })?;
        }

        Ok(())
    }

    /// Get a synchronous connection to the database
    ///
    /// Only use this in synchronous, single-threaded contexts. In async
    /// functions, use `connect_with_timeout()` instead to avoid SQLite
    /// thread-safety violations.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get an async connection with busy timeout configured
    ///
    /// Sets a 5-second busy timeout so concurrent operations wait and retry
    /// instead of failing immediately when the database is locked. This is
    /// the safe default in async contexts, where the Tokio runtime may move
    /// futures between threads at `.await` points.
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;

        Ok(conn)
    }

    //
    // TASK OPERATIONS
    // Tasks are owned by the task service; create is the fixture/integration
    // entry point, the graph layer itself only reads.
    //

    /// Insert a task projection row
    pub async fn db_create_task(&self, params: DbTaskRow<'_>) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO tasks (id, project_id, title, assignee_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                params.id,
                params.project_id,
                params.title,
                params.assignee_id,
                params.created_at,
            ),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert task: {}", e)))?;

        Ok(())
    }

    /// Fetch a task scoped by project
    pub async fn db_get_task(
        &self,
        project_id: &str,
        task_id: &str,
    ) -> Result<Option<Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT id, project_id, title, assignee_id, created_at
                 FROM tasks WHERE id = ? AND project_id = ?",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare get_task query: {}", e))
            })?;

        let mut rows = stmt.query((task_id, project_id)).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute get_task query: {}", e))
        })?;

        rows.next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))
    }

    /// Fetch many tasks by id in one query
    pub async fn db_get_tasks(&self, task_ids: &[String]) -> Result<Vec<Row>, DatabaseError> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.connect_with_timeout().await?;

        let placeholders = vec!["?"; task_ids.len()].join(", ");
        let sql = format!(
            "SELECT id, project_id, title, assignee_id, created_at
             FROM tasks WHERE id IN ({})",
            placeholders
        );

        let mut stmt = conn.prepare(&sql).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to prepare get_tasks query: {}", e))
        })?;

        let mut rows = stmt
            .query(libsql::params_from_iter(task_ids.iter().cloned()))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to execute get_tasks query: {}", e))
            })?;

        let mut result = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            result.push(row);
        }
        eprintln!("DIAG get_tasks ids={:?} rows_returned={}", task_ids, result.len());
        Ok(result)
    }

    //
    // LINK OPERATIONS
    //

    /// Insert a link row and its mirror in a single transaction
    ///
    /// The paired write is all-or-nothing: a partial write would leave a
    /// relationship visible from one endpoint only, which later reads cannot
    /// detect.
    pub async fn db_insert_link_pair(
        &self,
        original: DbLinkRow<'_>,
        mirror: DbLinkRow<'_>,
    ) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute("BEGIN TRANSACTION", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        for row in [&original, &mirror] {
            let result = conn
                .execute(
                    "INSERT INTO task_links (id, project_id, source_task_id, target_task_id, link_type, created_at)
                     VALUES (?, ?, ?, ?, ?, ?)",
                    (
                        row.id,
                        row.project_id,
                        row.source_task_id,
                        row.target_task_id,
                        row.link_type,
                        row.created_at,
                    ),
                )
                .await;

            if let Err(e) = result {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                return Err(DatabaseError::sql_execution(format!(
                    "Failed to insert link {}: {}",
                    row.id, e
                )));
            }
        }

        conn.execute("COMMIT", ()).await.map_err(|e| {
            std::mem::drop(conn.execute("ROLLBACK", ()));
            DatabaseError::sql_execution(format!("Failed to commit link pair: {}", e))
        })?;

        Ok(())
    }

    /// Delete a link row and (when present) its mirror in one transaction
    ///
    /// Returns the number of rows deleted.
    pub async fn db_delete_link_pair(
        &self,
        link_id: &str,
        mirror_id: Option<&str>,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute("BEGIN TRANSACTION", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        let mut deleted = 0u64;
        let ids = std::iter::once(link_id).chain(mirror_id);

        for id in ids {
            match conn
                .execute("DELETE FROM task_links WHERE id = ?", [id])
                .await
            {
                Ok(affected) => deleted += affected,
                Err(e) => {
                    let _rollback = conn.execute("ROLLBACK", ()).await;
                    return Err(DatabaseError::sql_execution(format!(
                        "Failed to delete link {}: {}",
                        id, e
                    )));
                }
            }
        }

        conn.execute("COMMIT", ()).await.map_err(|e| {
            std::mem::drop(conn.execute("ROLLBACK", ()));
            DatabaseError::sql_execution(format!("Failed to commit link delete: {}", e))
        })?;

        Ok(deleted)
    }

    /// Fetch a link by id scoped to a project
    pub async fn db_get_link(
        &self,
        project_id: &str,
        link_id: &str,
    ) -> Result<Option<Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT id, project_id, source_task_id, target_task_id, link_type, created_at
                 FROM task_links WHERE id = ? AND project_id = ?",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare get_link query: {}", e))
            })?;

        let mut rows = stmt.query((link_id, project_id)).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute get_link query: {}", e))
        })?;

        rows.next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))
    }

    /// Fetch all link rows touching a task, newest first
    pub async fn db_links_for_task(&self, task_id: &str) -> Result<Vec<Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT id, project_id, source_task_id, target_task_id, link_type, created_at
                 FROM task_links
                 WHERE source_task_id = ? OR target_task_id = ?
                 ORDER BY created_at DESC, id",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!(
                    "Failed to prepare links_for_task query: {}",
                    e
                ))
            })?;

        let mut rows = stmt.query((task_id, task_id)).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute links_for_task query: {}", e))
        })?;

        let mut result = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            result.push(row);
        }
        Ok(result)
    }

    /// Fetch all link rows touching any of the given tasks in one query
    pub async fn db_links_for_tasks(&self, task_ids: &[String]) -> Result<Vec<Row>, DatabaseError> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.connect_with_timeout().await?;

        let placeholders = vec!["?"; task_ids.len()].join(", ");
        let sql = format!(
            "SELECT id, project_id, source_task_id, target_task_id, link_type, created_at
             FROM task_links
             WHERE source_task_id IN ({placeholders}) OR target_task_id IN ({placeholders})
             ORDER BY created_at DESC, id"
        );

        let mut stmt = conn.prepare(&sql).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to prepare links_for_tasks query: {}", e))
        })?;

        // Parameter list is the id set twice: once per IN clause.
        let params: Vec<String> = task_ids.iter().chain(task_ids.iter()).cloned().collect();
        let mut rows = stmt
            .query(libsql::params_from_iter(params))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!(
                    "Failed to execute links_for_tasks query: {}",
                    e
                ))
            })?;

        let mut result = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            result.push(row);
        }
        Ok(result)
    }

    /// Fetch all link rows between a pair of tasks (either direction)
    pub async fn db_links_between(
        &self,
        project_id: &str,
        task_a: &str,
        task_b: &str,
    ) -> Result<Vec<Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT id, project_id, source_task_id, target_task_id, link_type, created_at
                 FROM task_links
                 WHERE project_id = ?
                   AND ((source_task_id = ? AND target_task_id = ?)
                     OR (source_task_id = ? AND target_task_id = ?))
                 ORDER BY created_at DESC, id",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare links_between query: {}", e))
            })?;

        let mut rows = stmt
            .query((project_id, task_a, task_b, task_b, task_a))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to execute links_between query: {}", e))
            })?;

        let mut result = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            result.push(row);
        }
        Ok(result)
    }

    /// Count link rows with the task as source
    ///
    /// Mirroring guarantees every logical link touching a task stores exactly
    /// one row with that task as source, so this count equals the number of
    /// logical links touching the task.
    pub async fn db_count_links_from(&self, task_id: &str) -> Result<u32, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare("SELECT COUNT(*) FROM task_links WHERE source_task_id = ?")
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare link count query: {}", e))
            })?;

        let mut rows = stmt.query([task_id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute link count query: {}", e))
        })?;

        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
            .ok_or_else(|| DatabaseError::sql_execution("COUNT query returned no rows"))?;

        let count: i64 = row
            .get(0)
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to read count: {}", e)))?;

        Ok(count as u32)
    }

    /// Fetch target ids of typed outgoing rows from a task
    ///
    /// Serves the blocking-cycle walk (`link_type = 'BLOCKS'`) and the
    /// duplicates out-degree rule (`link_type = 'DUPLICATES'`).
    pub async fn db_link_targets_by_type(
        &self,
        task_id: &str,
        link_type: &str,
    ) -> Result<Vec<String>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT target_task_id FROM task_links
                 WHERE source_task_id = ? AND link_type = ?",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!(
                    "Failed to prepare link_targets_by_type query: {}",
                    e
                ))
            })?;

        let mut rows = stmt.query((task_id, link_type)).await.map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to execute link_targets_by_type query: {}",
                e
            ))
        })?;

        let mut result = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            let target: String = row.get(0).map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to read target_task_id: {}", e))
            })?;
            result.push(target);
        }
        Ok(result)
    }

    //
    // HIERARCHY OPERATIONS
    //

    /// Insert a hierarchy edge (single row, no mirror)
    pub async fn db_insert_hierarchy(
        &self,
        params: DbHierarchyRow<'_>,
    ) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO task_hierarchy (id, project_id, parent_task_id, child_task_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                params.id,
                params.project_id,
                params.parent_task_id,
                params.child_task_id,
                params.created_at,
            ),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to insert hierarchy edge: {}", e))
        })?;

        Ok(())
    }

    /// Delete a hierarchy edge by composite key
    ///
    /// Returns the number of rows affected (0 = edge didn't exist).
    pub async fn db_delete_hierarchy(
        &self,
        project_id: &str,
        parent_task_id: &str,
        child_task_id: &str,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let affected = conn
            .execute(
                "DELETE FROM task_hierarchy
                 WHERE project_id = ? AND parent_task_id = ? AND child_task_id = ?",
                (project_id, parent_task_id, child_task_id),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to delete hierarchy edge: {}", e))
            })?;

        Ok(affected)
    }

    /// Fetch the parent edge of a child task, if any
    pub async fn db_parent_edge(&self, child_task_id: &str) -> Result<Option<Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT id, project_id, parent_task_id, child_task_id, created_at
                 FROM task_hierarchy WHERE child_task_id = ?",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare parent_edge query: {}", e))
            })?;

        let mut rows = stmt.query([child_task_id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute parent_edge query: {}", e))
        })?;

        rows.next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))
    }

    /// Fetch the child edges of a parent task, oldest first
    pub async fn db_child_edges(&self, parent_task_id: &str) -> Result<Vec<Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT id, project_id, parent_task_id, child_task_id, created_at
                 FROM task_hierarchy WHERE parent_task_id = ?
                 ORDER BY created_at, id",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare child_edges query: {}", e))
            })?;

        let mut rows = stmt.query([parent_task_id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute child_edges query: {}", e))
        })?;

        let mut result = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            result.push(row);
        }
        Ok(result)
    }

    /// Fetch the hierarchy edge between a pair of tasks in either orientation
    pub async fn db_hierarchy_edge_between(
        &self,
        project_id: &str,
        task_a: &str,
        task_b: &str,
    ) -> Result<Option<Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(
                "SELECT id, project_id, parent_task_id, child_task_id, created_at
                 FROM task_hierarchy
                 WHERE project_id = ?
                   AND ((parent_task_id = ? AND child_task_id = ?)
                     OR (parent_task_id = ? AND child_task_id = ?))",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!(
                    "Failed to prepare hierarchy_edge_between query: {}",
                    e
                ))
            })?;

        let mut rows = stmt
            .query((project_id, task_a, task_b, task_b, task_a))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!(
                    "Failed to execute hierarchy_edge_between query: {}",
                    e
                ))
            })?;

        rows.next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))
    }
}
