//! Relationship Hydrator
//!
//! Read-side composition over the two graph services: fetches a task's links
//! and hierarchy together, concurrently, for presentation. The multi-task
//! form goes through the batch link API so hydrating a page of tasks costs
//! one link query, not one per task.

use crate::models::{TaskHierarchyView, TaskRelationships};
use crate::services::error::TaskRelationError;
use crate::services::hierarchy_service::TaskHierarchyService;
use crate::services::link_service::TaskLinkService;
use std::collections::HashMap;
use std::sync::Arc;

/// Composes link and hierarchy reads into one relationship view
pub struct RelationshipHydrator {
    links: Arc<TaskLinkService>,
    hierarchy: Arc<TaskHierarchyService>,
}

impl RelationshipHydrator {
    pub fn new(links: Arc<TaskLinkService>, hierarchy: Arc<TaskHierarchyService>) -> Self {
        Self { links, hierarchy }
    }

    /// Everything relating one task to other tasks, fetched concurrently.
    pub async fn hydrate_task_relationships(
        &self,
        task_id: &str,
    ) -> Result<TaskRelationships, TaskRelationError> {
        let (links, hierarchy) = tokio::join!(
            self.links.list_links_with_tasks(task_id),
            self.hierarchy.get_hierarchy_for_task(task_id)
        );

        Ok(TaskRelationships {
            links: links?,
            hierarchy: hierarchy?,
        })
    }

    /// Relationship views for many tasks.
    ///
    /// Link hydration is batched into a single query covering every
    /// requested id; hierarchy neighbors (one parent edge, direct children)
    /// are fetched per task.
    pub async fn hydrate_multiple_task_relationships(
        &self,
        task_ids: &[String],
    ) -> Result<HashMap<String, TaskRelationships>, TaskRelationError> {
        let mut link_buckets = self.links.batch_list_links_with_tasks(task_ids).await?;

        let mut result = HashMap::with_capacity(task_ids.len());
        for task_id in task_ids {
            let hierarchy: TaskHierarchyView =
                self.hierarchy.get_hierarchy_for_task(task_id).await?;
            result.insert(
                task_id.clone(),
                TaskRelationships {
                    links: link_buckets.remove(task_id).unwrap_or_default(),
                    hierarchy,
                },
            );
        }

        Ok(result)
    }
}
