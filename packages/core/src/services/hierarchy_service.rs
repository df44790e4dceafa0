//! Hierarchy Graph Service
//!
//! Owns all reads and writes of `TaskHierarchy` rows and the traversal
//! queries over them (immediate neighbors, transitive ancestors and
//! descendants). Mutations run the hierarchy validation chain before the
//! single-row write; no mirror is needed because parent/child roles are
//! asymmetric by construction.
//!
//! Traversals are iterative with explicit visited-sets: even if a structural
//! defect slipped a cycle past the validators, reads terminate and return
//! each task once.

use crate::db::RelationStore;
use crate::models::{HierarchyNeighbor, TaskHierarchy, TaskHierarchyView, TaskSummary};
use crate::services::error::TaskRelationError;
use crate::services::link_service::TaskLinkService;
use crate::validation::{GraphLimits, HierarchyContext, HierarchyValidationChain};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Service for the parent/child task forest
pub struct TaskHierarchyService {
    store: Arc<dyn RelationStore>,
    links: Arc<TaskLinkService>,
    chain: HierarchyValidationChain,
    write_lock: Arc<Mutex<()>>,
}

impl TaskHierarchyService {
    /// Create the service with the standard validation chain.
    ///
    /// `links` is used to attach neighbor link views through the batch API;
    /// `write_lock` must be the same mutex handed to the link service.
    pub fn new(
        store: Arc<dyn RelationStore>,
        limits: GraphLimits,
        links: Arc<TaskLinkService>,
        write_lock: Arc<Mutex<()>>,
    ) -> Self {
        let chain = HierarchyValidationChain::standard(&limits);
        Self {
            store,
            links,
            chain,
            write_lock,
        }
    }

    /// Create a parent→child edge.
    ///
    /// # Errors
    ///
    /// - `TaskNotFound` - either endpoint missing or outside the project
    /// - `Validation` - self-parent, second parent, cycle, depth bound, or
    ///   a conflicting link between the pair
    pub async fn create_hierarchy(
        &self,
        project_id: &str,
        parent_task_id: &str,
        child_task_id: &str,
    ) -> Result<TaskHierarchy, TaskRelationError> {
        let _guard = self.write_lock.lock().await;

        let parent = self.require_task(project_id, parent_task_id).await?;
        let child = self.require_task(project_id, child_task_id).await?;

        let ctx = HierarchyContext {
            project_id,
            parent: &parent,
            child: &child,
        };
        if let Some(violation) = self.chain.run(&ctx, self.store.as_ref()).await? {
            return Err(TaskRelationError::Validation {
                code: violation.code,
                detail: violation.detail,
            });
        }

        let edge = TaskHierarchy::new(project_id, parent_task_id, child_task_id);
        let created = self.store.insert_hierarchy(edge).await?;

        tracing::info!(
            edge_id = %created.id,
            project_id,
            parent_task_id,
            child_task_id,
            "task hierarchy edge created"
        );

        Ok(created)
    }

    /// Delete the edge matching the composite key.
    ///
    /// # Errors
    ///
    /// `HierarchyNotFound` when no row matches.
    pub async fn delete_hierarchy(
        &self,
        project_id: &str,
        parent_task_id: &str,
        child_task_id: &str,
    ) -> Result<(), TaskRelationError> {
        let _guard = self.write_lock.lock().await;

        let affected = self
            .store
            .delete_hierarchy(project_id, parent_task_id, child_task_id)
            .await?;
        if affected == 0 {
            return Err(TaskRelationError::hierarchy_not_found(
                parent_task_id,
                child_task_id,
            ));
        }

        tracing::info!(
            project_id,
            parent_task_id,
            child_task_id,
            "task hierarchy edge deleted"
        );

        Ok(())
    }

    /// The direct parent of a task, hydrated.
    ///
    /// At most one entry under the single-parent invariant; returned as a
    /// list so a storage defect shows up in reads instead of being hidden.
    pub async fn get_parents_for_task(
        &self,
        task_id: &str,
    ) -> Result<Vec<HierarchyNeighbor>, TaskRelationError> {
        let edges = match self.store.parent_edge(task_id).await? {
            Some(edge) => vec![edge],
            None => Vec::new(),
        };
        self.hydrate_neighbors(edges, |edge| edge.parent_task_id.clone())
            .await
    }

    /// The direct children of a task, hydrated, oldest edge first.
    pub async fn get_children_for_task(
        &self,
        task_id: &str,
    ) -> Result<Vec<HierarchyNeighbor>, TaskRelationError> {
        let edges = self.store.child_edges(task_id).await?;
        self.hydrate_neighbors(edges, |edge| edge.child_task_id.clone())
            .await
    }

    /// Both sides of a task's immediate hierarchy in one call.
    pub async fn get_hierarchy_for_task(
        &self,
        task_id: &str,
    ) -> Result<TaskHierarchyView, TaskRelationError> {
        let (parents, children) = tokio::join!(
            self.get_parents_for_task(task_id),
            self.get_children_for_task(task_id)
        );

        Ok(TaskHierarchyView {
            parents: parents?,
            children: children?,
        })
    }

    /// All transitive ancestors of a task, nearest first.
    ///
    /// Walks up parent edges with a visited-set; a cycle in storage
    /// terminates the walk instead of looping.
    pub async fn get_all_parents_for_task(
        &self,
        task_id: &str,
    ) -> Result<Vec<TaskSummary>, TaskRelationError> {
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(task_id.to_string());

        let mut ancestor_ids: Vec<String> = Vec::new();
        let mut current = task_id.to_string();

        while let Some(edge) = self.store.parent_edge(&current).await? {
            if !visited.insert(edge.parent_task_id.clone()) {
                tracing::warn!(
                    task_id,
                    repeated = %edge.parent_task_id,
                    "cycle encountered while walking ancestors; stopping"
                );
                break;
            }
            ancestor_ids.push(edge.parent_task_id.clone());
            current = edge.parent_task_id;
        }

        self.resolve_in_order(&ancestor_ids).await
    }

    /// All transitive descendants of a task, breadth-first, each once.
    pub async fn get_all_children_for_task(
        &self,
        task_id: &str,
    ) -> Result<Vec<TaskSummary>, TaskRelationError> {
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(task_id.to_string());

        let mut descendant_ids: Vec<String> = Vec::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        queue.push_back(task_id.to_string());

        while let Some(current) = queue.pop_front() {
            for edge in self.store.child_edges(&current).await? {
                if visited.insert(edge.child_task_id.clone()) {
                    descendant_ids.push(edge.child_task_id.clone());
                    queue.push_back(edge.child_task_id);
                }
            }
        }

        self.resolve_in_order(&descendant_ids).await
    }

    /// Load a task scoped by project or fail with `TaskNotFound`.
    async fn require_task(
        &self,
        project_id: &str,
        task_id: &str,
    ) -> Result<TaskSummary, TaskRelationError> {
        self.store
            .find_task(project_id, task_id)
            .await?
            .ok_or_else(|| TaskRelationError::task_not_found(task_id))
    }

    /// Hydrate a set of edges into neighbor views.
    ///
    /// One batch task lookup plus one batch link query for all neighbors;
    /// edges whose neighbor task cannot be resolved are dropped with a
    /// warning.
    async fn hydrate_neighbors(
        &self,
        edges: Vec<TaskHierarchy>,
        neighbor_id: impl Fn(&TaskHierarchy) -> String,
    ) -> Result<Vec<HierarchyNeighbor>, TaskRelationError> {
        if edges.is_empty() {
            return Ok(Vec::new());
        }

        let neighbor_ids: Vec<String> = edges.iter().map(&neighbor_id).collect();

        let tasks: HashMap<String, TaskSummary> = self
            .store
            .find_tasks(&neighbor_ids)
            .await?
            .into_iter()
            .map(|task| (task.id.clone(), task))
            .collect();

        let mut link_buckets = self.links.batch_list_links_with_tasks(&neighbor_ids).await?;

        let mut neighbors = Vec::with_capacity(edges.len());
        for edge in edges {
            let id = neighbor_id(&edge);
            match tasks.get(&id) {
                Some(task) => neighbors.push(HierarchyNeighbor {
                    task: task.clone(),
                    links: link_buckets.remove(&id).unwrap_or_default(),
                    edge,
                }),
                None => {
                    tracing::warn!(
                        edge_id = %edge.id,
                        neighbor = %id,
                        "dropping hierarchy edge with unresolvable endpoint from hydrated view"
                    );
                }
            }
        }
        Ok(neighbors)
    }

    /// Resolve task projections preserving the traversal order of `ids`.
    async fn resolve_in_order(
        &self,
        ids: &[String],
    ) -> Result<Vec<TaskSummary>, TaskRelationError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_id: HashMap<String, TaskSummary> = self
            .store
            .find_tasks(ids)
            .await?
            .into_iter()
            .map(|task| (task.id.clone(), task))
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}
