//! RelationStore Trait - Database Abstraction Layer
//!
//! This module defines the `RelationStore` trait that abstracts persistence
//! for the relationship graph. The trait sits between the graph services
//! (business logic, validation) and the database implementation, so the
//! services and validation rules never see SQL.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async; the backing store is an
//!    embedded libsql database today but nothing in the services assumes it
//! 2. **Ownership Semantics**: Write methods take ownership of the rows to
//!    avoid unnecessary cloning (caller can clone if needed)
//! 3. **Error Handling**: Uses `anyhow::Result` for flexible error context;
//!    the services map failures into their own error taxonomy
//! 4. **Paired link writes**: `insert_link_pair` / `delete_link_pair` are the
//!    only link mutation points, keeping the mirrored-row invariant inside a
//!    single transactional call
//!
//! # Thread Safety
//!
//! Implementations must be `Send + Sync` to allow usage in async contexts
//! where futures may be moved between threads.

use crate::models::{LinkType, TaskHierarchy, TaskLink, TaskSummary};
use anyhow::Result;
use async_trait::async_trait;

/// Abstraction layer for relationship graph persistence
///
/// # Method Categories
///
/// - **Tasks**: read-only lookups (tasks are owned by the task service)
///   plus a fixture/integration create
/// - **Links**: paired mutation, lookups by id/endpoint/pair, typed-edge
///   queries for graph walks, fan-out counting
/// - **Hierarchy**: single-row mutation, parent/child edge lookups
#[async_trait]
pub trait RelationStore: Send + Sync {
    //
    // TASK LOOKUPS
    //

    /// Find a task scoped by project
    ///
    /// Returns `Ok(None)` when the task does not exist **or** belongs to a
    /// different project; callers cannot distinguish the two, by design.
    async fn find_task(&self, project_id: &str, task_id: &str) -> Result<Option<TaskSummary>>;

    /// Find many tasks by id in one query (unscoped; used for hydration of
    /// rows that already passed project checks at write time)
    async fn find_tasks(&self, task_ids: &[String]) -> Result<Vec<TaskSummary>>;

    /// Insert a task projection
    ///
    /// Entry point for the task-service integration and for test fixtures.
    /// The relationship services never call this.
    async fn create_task(&self, task: TaskSummary) -> Result<TaskSummary>;

    //
    // LINK GRAPH
    //

    /// Persist a link row and its mirror atomically, returning the original
    /// row as stored
    async fn insert_link_pair(&self, original: TaskLink, mirror: TaskLink) -> Result<TaskLink>;

    /// Delete a link row and (when located) its mirror atomically
    async fn delete_link_pair(&self, link_id: &str, mirror_id: Option<&str>) -> Result<u64>;

    /// Fetch a link by id scoped to a project
    async fn get_link(&self, project_id: &str, link_id: &str) -> Result<Option<TaskLink>>;

    /// All link rows where the task is either endpoint, newest first
    async fn links_for_task(&self, task_id: &str) -> Result<Vec<TaskLink>>;

    /// All link rows touching any of the given tasks, in one query
    async fn links_for_tasks(&self, task_ids: &[String]) -> Result<Vec<TaskLink>>;

    /// All link rows between a pair of tasks, either direction
    async fn links_between(&self, project_id: &str, task_a: &str, task_b: &str)
        -> Result<Vec<TaskLink>>;

    /// Number of logical links touching a task
    ///
    /// Counts rows with the task as source; the mirrored-pair invariant makes
    /// that exactly one row per logical link.
    async fn count_links_for_task(&self, task_id: &str) -> Result<u32>;

    /// Target ids of outgoing rows of one type from a task
    ///
    /// The successor function for graph walks over a typed subgraph (e.g.
    /// `BLOCKS` reachability).
    async fn link_targets_by_type(&self, task_id: &str, link_type: LinkType)
        -> Result<Vec<String>>;

    //
    // HIERARCHY GRAPH
    //

    /// Persist a hierarchy edge, returning it as stored
    async fn insert_hierarchy(&self, edge: TaskHierarchy) -> Result<TaskHierarchy>;

    /// Delete the edge matching `(project_id, parent, child)`; returns the
    /// number of rows affected (0 = no such edge)
    async fn delete_hierarchy(
        &self,
        project_id: &str,
        parent_task_id: &str,
        child_task_id: &str,
    ) -> Result<u64>;

    /// The parent edge of a task, if any (single-parent invariant)
    async fn parent_edge(&self, child_task_id: &str) -> Result<Option<TaskHierarchy>>;

    /// The child edges of a task, oldest first
    async fn child_edges(&self, parent_task_id: &str) -> Result<Vec<TaskHierarchy>>;

    /// The hierarchy edge between a pair of tasks in either orientation
    async fn hierarchy_edge_between(
        &self,
        project_id: &str,
        task_a: &str,
        task_b: &str,
    ) -> Result<Option<TaskHierarchy>>;
}
