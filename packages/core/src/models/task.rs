//! Task Projection
//!
//! Tasks are owned by the task service; the relationship core only ever reads
//! them. `TaskSummary` is the slice of a task the graph layer needs: identity,
//! project scope, and the presentation fields hydrated views attach to link
//! and hierarchy neighbors (title, assignee).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only projection of a task as consumed by the relationship graph.
///
/// The full task record (status workflow, comments, custom fields) lives in
/// the task service. Relationship operations load both endpoints through
/// `RelationStore::find_task` scoped by project and fail with `TaskNotFound`
/// when a task is missing or belongs to another project.
///
/// # Examples
///
/// ```rust
/// use tasklane_core::models::TaskSummary;
///
/// let task = TaskSummary::new("project-1", "Draft release notes");
/// assert_eq!(task.project_id, "project-1");
/// assert!(task.assignee_id.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    /// Unique task identifier (UUID)
    pub id: String,

    /// Project the task belongs to
    pub project_id: String,

    /// Task title for presentation in hydrated views
    pub title: String,

    /// Assigned contributor, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl TaskSummary {
    /// Create a new task projection with an auto-generated UUID.
    ///
    /// Used by test fixtures and the task-service integration point; the
    /// relationship core itself never creates tasks.
    pub fn new(project_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            title: title.into(),
            assignee_id: None,
            created_at: Utc::now(),
        }
    }

    /// Create a task projection with an explicit id.
    pub fn new_with_id(
        id: impl Into<String>,
        project_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            title: title.into(),
            assignee_id: None,
            created_at: Utc::now(),
        }
    }

    /// Attach an assignee to the projection (builder-style, for fixtures).
    pub fn with_assignee(mut self, assignee_id: impl Into<String>) -> Self {
        self.assignee_id = Some(assignee_id.into());
        self
    }
}
