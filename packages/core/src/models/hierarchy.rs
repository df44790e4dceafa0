//! Task Hierarchy Data Structures
//!
//! A hierarchy edge is a directed parent→child relationship. The set of all
//! hierarchy edges in a project forms a forest: every task has at most one
//! parent, reachability is acyclic, and root-to-leaf chains are depth-bounded.
//! Parent/child roles are asymmetric by construction, so unlike links a
//! hierarchy edge is stored as a single row with no mirror.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{LinkWithTasks, TaskSummary};

/// Stored parent→child edge.
///
/// Deletion is keyed by `(project_id, parent_task_id, child_task_id)`; the
/// row id exists for storage identity only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskHierarchy {
    /// Unique edge identifier (UUID)
    pub id: String,

    /// Project scope; both endpoints must belong to this project
    pub project_id: String,

    /// Parent task
    pub parent_task_id: String,

    /// Child task
    pub child_task_id: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl TaskHierarchy {
    /// Create a new hierarchy edge with an auto-generated UUID.
    pub fn new(
        project_id: impl Into<String>,
        parent_task_id: impl Into<String>,
        child_task_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            parent_task_id: parent_task_id.into(),
            child_task_id: child_task_id.into(),
            created_at: Utc::now(),
        }
    }

    /// The endpoint opposite to `task_id`, or `None` if `task_id` is not an
    /// endpoint of this edge.
    pub fn other_endpoint(&self, task_id: &str) -> Option<&str> {
        if self.parent_task_id == task_id {
            Some(&self.child_task_id)
        } else if self.child_task_id == task_id {
            Some(&self.parent_task_id)
        } else {
            None
        }
    }
}

/// A direct hierarchy neighbor hydrated for presentation: the edge, the
/// neighboring task projection, and that task's own links (attached through
/// the batch link API so a page of children costs one link query).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNeighbor {
    /// The parent→child edge connecting the queried task to `task`
    pub edge: TaskHierarchy,

    /// The neighboring task (the parent when listing parents, the child when
    /// listing children)
    pub task: TaskSummary,

    /// The neighbor's own hydrated links
    pub links: Vec<LinkWithTasks>,
}

/// Both sides of a task's immediate hierarchy.
///
/// `parents` holds at most one entry under the single-parent invariant; it is
/// a list so a structural defect in storage surfaces in reads instead of
/// being silently truncated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskHierarchyView {
    /// Direct parent(s) of the queried task
    pub parents: Vec<HierarchyNeighbor>,

    /// Direct children of the queried task
    pub children: Vec<HierarchyNeighbor>,
}

/// Read-side composition of everything relating a task to other tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRelationships {
    /// Hydrated links touching the task
    pub links: Vec<LinkWithTasks>,

    /// Immediate hierarchy around the task
    pub hierarchy: TaskHierarchyView,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_endpoint() {
        let edge = TaskHierarchy::new("p1", "parent", "child");
        assert_eq!(edge.other_endpoint("parent"), Some("child"));
        assert_eq!(edge.other_endpoint("child"), Some("parent"));
        assert_eq!(edge.other_endpoint("stranger"), None);
    }

    #[test]
    fn test_serialization_is_camel_case() {
        let edge = TaskHierarchy::new("p1", "parent", "child");
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["parentTaskId"], "parent");
        assert_eq!(json["childTaskId"], "child");
        assert_eq!(json["projectId"], "p1");
    }
}
