//! TursoStore - RelationStore Implementation for Turso/libsql
//!
//! Thin wrapper over [`DatabaseService`]: delegates all SQL to the extracted
//! `db_*` methods and owns the libsql::Row → model conversions. No business
//! logic lives here; validation and graph semantics stay in the services.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tasklane_core::db::{DatabaseService, RelationStore, TursoStore};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/tasklane.db")).await?);
//!     let store: Arc<dyn RelationStore> = Arc::new(TursoStore::new(db));
//!
//!     let links = store.links_for_task("task-123").await?;
//!     println!("{} link rows", links.len());
//!     Ok(())
//! }
//! ```

use crate::db::relation_store::RelationStore;
use crate::db::{DatabaseService, DbHierarchyRow, DbLinkRow, DbTaskRow};
use crate::models::{LinkType, TaskHierarchy, TaskLink, TaskSummary};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use libsql::Row;
use std::sync::Arc;

/// RelationStore implementation backed by Turso/libsql
pub struct TursoStore {
    /// Underlying database service (extracted SQL operations)
    db: Arc<DatabaseService>,
}

impl TursoStore {
    /// Create a new TursoStore wrapper
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Parse timestamp from database - handles both SQLite and RFC3339 formats
    ///
    /// SQLite CURRENT_TIMESTAMP returns: "YYYY-MM-DD HH:MM:SS"
    /// Rows written by this store use RFC3339: "YYYY-MM-DDTHH:MM:SS.ssssssZ"
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }

        Err(anyhow::anyhow!(
            "Unable to parse timestamp '{}' as RFC3339 or SQLite format",
            s
        ))
    }

    /// Format a timestamp for storage
    ///
    /// Microsecond precision keeps `ORDER BY created_at` stable for rows
    /// created within the same second, and RFC3339 sorts lexicographically.
    fn format_timestamp(dt: DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Convert libsql::Row to TaskSummary
    ///
    /// Expected columns (in order): id, project_id, title, assignee_id,
    /// created_at
    fn row_to_task(row: &Row) -> Result<TaskSummary> {
        let id: String = row.get(0).context("Failed to get id")?;
        let project_id: String = row.get(1).context("Failed to get project_id")?;
        let title: String = row.get(2).context("Failed to get title")?;
        let assignee_id: Option<String> = row.get(3).context("Failed to get assignee_id")?;
        let created_at_str: String = row.get(4).context("Failed to get created_at")?;

        Ok(TaskSummary {
            id,
            project_id,
            title,
            assignee_id,
            created_at: Self::parse_timestamp(&created_at_str)
                .context("Failed to parse created_at")?,
        })
    }

    /// Convert libsql::Row to TaskLink
    ///
    /// Expected columns (in order): id, project_id, source_task_id,
    /// target_task_id, link_type, created_at
    fn row_to_link(row: &Row) -> Result<TaskLink> {
        let id: String = row.get(0).context("Failed to get id")?;
        let project_id: String = row.get(1).context("Failed to get project_id")?;
        let source_task_id: String = row.get(2).context("Failed to get source_task_id")?;
        let target_task_id: String = row.get(3).context("Failed to get target_task_id")?;
        let link_type_str: String = row.get(4).context("Failed to get link_type")?;
        let created_at_str: String = row.get(5).context("Failed to get created_at")?;

        Ok(TaskLink {
            id,
            project_id,
            source_task_id,
            target_task_id,
            link_type: link_type_str
                .parse()
                .context("Failed to parse link_type column")?,
            created_at: Self::parse_timestamp(&created_at_str)
                .context("Failed to parse created_at")?,
        })
    }

    /// Convert libsql::Row to TaskHierarchy
    ///
    /// Expected columns (in order): id, project_id, parent_task_id,
    /// child_task_id, created_at
    fn row_to_hierarchy(row: &Row) -> Result<TaskHierarchy> {
        let id: String = row.get(0).context("Failed to get id")?;
        let project_id: String = row.get(1).context("Failed to get project_id")?;
        let parent_task_id: String = row.get(2).context("Failed to get parent_task_id")?;
        let child_task_id: String = row.get(3).context("Failed to get child_task_id")?;
        let created_at_str: String = row.get(4).context("Failed to get created_at")?;

        Ok(TaskHierarchy {
            id,
            project_id,
            parent_task_id,
            child_task_id,
            created_at: Self::parse_timestamp(&created_at_str)
                .context("Failed to parse created_at")?,
        })
    }
}

#[async_trait::async_trait]
impl RelationStore for TursoStore {
    async fn find_task(&self, project_id: &str, task_id: &str) -> Result<Option<TaskSummary>> {
        match self
            .db
            .db_get_task(project_id, task_id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get task: {}", e))?
        {
            Some(row) => Ok(Some(Self::row_to_task(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_tasks(&self, task_ids: &[String]) -> Result<Vec<TaskSummary>> {
        let rows = self
            .db
            .db_get_tasks(task_ids)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get tasks: {}", e))?;

        rows.iter().map(Self::row_to_task).collect()
    }

    async fn create_task(&self, task: TaskSummary) -> Result<TaskSummary> {
        let created_at = Self::format_timestamp(task.created_at);
        self.db
            .db_create_task(DbTaskRow {
                id: &task.id,
                project_id: &task.project_id,
                title: &task.title,
                assignee_id: task.assignee_id.as_deref(),
                created_at: &created_at,
            })
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create task: {}", e))?;

        Ok(task)
    }

    async fn insert_link_pair(&self, original: TaskLink, mirror: TaskLink) -> Result<TaskLink> {
        let original_created = Self::format_timestamp(original.created_at);
        let mirror_created = Self::format_timestamp(mirror.created_at);

        self.db
            .db_insert_link_pair(
                DbLinkRow {
                    id: &original.id,
                    project_id: &original.project_id,
                    source_task_id: &original.source_task_id,
                    target_task_id: &original.target_task_id,
                    link_type: original.link_type.as_str(),
                    created_at: &original_created,
                },
                DbLinkRow {
                    id: &mirror.id,
                    project_id: &mirror.project_id,
                    source_task_id: &mirror.source_task_id,
                    target_task_id: &mirror.target_task_id,
                    link_type: mirror.link_type.as_str(),
                    created_at: &mirror_created,
                },
            )
            .await
            .map_err(|e| anyhow::anyhow!("Failed to insert link pair: {}", e))?;

        Ok(original)
    }

    async fn delete_link_pair(&self, link_id: &str, mirror_id: Option<&str>) -> Result<u64> {
        self.db
            .db_delete_link_pair(link_id, mirror_id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to delete link pair: {}", e))
    }

    async fn get_link(&self, project_id: &str, link_id: &str) -> Result<Option<TaskLink>> {
        match self
            .db
            .db_get_link(project_id, link_id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get link: {}", e))?
        {
            Some(row) => Ok(Some(Self::row_to_link(&row)?)),
            None => Ok(None),
        }
    }

    async fn links_for_task(&self, task_id: &str) -> Result<Vec<TaskLink>> {
        let rows = self
            .db
            .db_links_for_task(task_id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to list links for task: {}", e))?;

        rows.iter().map(Self::row_to_link).collect()
    }

    async fn links_for_tasks(&self, task_ids: &[String]) -> Result<Vec<TaskLink>> {
        let rows = self
            .db
            .db_links_for_tasks(task_ids)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to list links for tasks: {}", e))?;

        rows.iter().map(Self::row_to_link).collect()
    }

    async fn links_between(
        &self,
        project_id: &str,
        task_a: &str,
        task_b: &str,
    ) -> Result<Vec<TaskLink>> {
        let rows = self
            .db
            .db_links_between(project_id, task_a, task_b)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to list links between tasks: {}", e))?;

        rows.iter().map(Self::row_to_link).collect()
    }

    async fn count_links_for_task(&self, task_id: &str) -> Result<u32> {
        self.db
            .db_count_links_from(task_id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to count links: {}", e))
    }

    async fn link_targets_by_type(
        &self,
        task_id: &str,
        link_type: LinkType,
    ) -> Result<Vec<String>> {
        self.db
            .db_link_targets_by_type(task_id, link_type.as_str())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to list typed link targets: {}", e))
    }

    async fn insert_hierarchy(&self, edge: TaskHierarchy) -> Result<TaskHierarchy> {
        let created_at = Self::format_timestamp(edge.created_at);
        self.db
            .db_insert_hierarchy(DbHierarchyRow {
                id: &edge.id,
                project_id: &edge.project_id,
                parent_task_id: &edge.parent_task_id,
                child_task_id: &edge.child_task_id,
                created_at: &created_at,
            })
            .await
            .map_err(|e| anyhow::anyhow!("Failed to insert hierarchy edge: {}", e))?;

        Ok(edge)
    }

    async fn delete_hierarchy(
        &self,
        project_id: &str,
        parent_task_id: &str,
        child_task_id: &str,
    ) -> Result<u64> {
        self.db
            .db_delete_hierarchy(project_id, parent_task_id, child_task_id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to delete hierarchy edge: {}", e))
    }

    async fn parent_edge(&self, child_task_id: &str) -> Result<Option<TaskHierarchy>> {
        match self
            .db
            .db_parent_edge(child_task_id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get parent edge: {}", e))?
        {
            Some(row) => Ok(Some(Self::row_to_hierarchy(&row)?)),
            None => Ok(None),
        }
    }

    async fn child_edges(&self, parent_task_id: &str) -> Result<Vec<TaskHierarchy>> {
        let rows = self
            .db
            .db_child_edges(parent_task_id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to list child edges: {}", e))?;

        rows.iter().map(Self::row_to_hierarchy).collect()
    }

    async fn hierarchy_edge_between(
        &self,
        project_id: &str,
        task_a: &str,
        task_b: &str,
    ) -> Result<Option<TaskHierarchy>> {
        match self
            .db
            .db_hierarchy_edge_between(project_id, task_a, task_b)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get hierarchy edge between tasks: {}", e))?
        {
            Some(row) => Ok(Some(Self::row_to_hierarchy(&row)?)),
            None => Ok(None),
        }
    }
}
