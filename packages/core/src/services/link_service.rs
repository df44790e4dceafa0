//! Link Graph Service
//!
//! Owns all reads and writes of `TaskLink` rows, including the
//! bidirectional-storage invariant: every accepted relationship is persisted
//! as the requested row plus its mirror, atomically, and deleted the same
//! way. All mutations run the link validation chain against the currently
//! persisted edge set before anything is written.
//!
//! # Write serialization
//!
//! Validation reads and the subsequent write happen under a shared write
//! lock (shared with the hierarchy service, since the chains read both
//! graphs), so two concurrent creates over the same pair cannot both pass
//! validation. The UNIQUE constraint on the canonical edge identity backs
//! this up at the storage level.

use crate::db::RelationStore;
use crate::models::{LinkType, LinkWithTasks, TaskLink, TaskLinkPage, TaskSummary};
use crate::services::error::TaskRelationError;
use crate::validation::{GraphLimits, LinkContext, LinkValidationChain};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Service for typed task-to-task links
///
/// # Examples
///
/// ```no_run
/// # use tasklane_core::db::{DatabaseService, TursoStore};
/// # use tasklane_core::models::LinkType;
/// # use tasklane_core::services::RelationshipServices;
/// # use tasklane_core::validation::GraphLimits;
/// # use std::path::PathBuf;
/// # use std::sync::Arc;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let db = Arc::new(DatabaseService::new(PathBuf::from("./tasklane.db")).await?);
/// # let services = RelationshipServices::new(Arc::new(TursoStore::new(db)), GraphLimits::default());
/// let link = services
///     .links
///     .create_link("project-1", "task-a", "task-b", LinkType::Blocks)
///     .await?;
/// println!("created link {}", link.id);
/// # Ok(())
/// # }
/// ```
pub struct TaskLinkService {
    store: Arc<dyn RelationStore>,
    limits: GraphLimits,
    chain: LinkValidationChain,
    write_lock: Arc<Mutex<()>>,
}

impl TaskLinkService {
    /// Create the service with the standard validation chain.
    ///
    /// `write_lock` must be the same mutex handed to the hierarchy service;
    /// the validation chains read both graphs.
    pub fn new(
        store: Arc<dyn RelationStore>,
        limits: GraphLimits,
        write_lock: Arc<Mutex<()>>,
    ) -> Self {
        let chain = LinkValidationChain::standard(&limits);
        Self {
            store,
            limits,
            chain,
            write_lock,
        }
    }

    /// Create a link between two tasks.
    ///
    /// Loads both tasks scoped by project, rejects duplicates and exhausted
    /// capacity, runs the validation chain, then persists the row and its
    /// mirror atomically. Returns the originally-oriented row.
    ///
    /// # Errors
    ///
    /// - `TaskNotFound` - either endpoint missing or outside the project
    /// - `AlreadyExists` - an equivalent relationship is already stored
    /// - `LimitReached` - either endpoint is at the per-task link cap
    /// - `Validation` - a chain rule rejected the link
    pub async fn create_link(
        &self,
        project_id: &str,
        source_task_id: &str,
        target_task_id: &str,
        link_type: LinkType,
    ) -> Result<TaskLink, TaskRelationError> {
        let _guard = self.write_lock.lock().await;

        let source = self.require_task(project_id, source_task_id).await?;
        let target = self.require_task(project_id, target_task_id).await?;

        // Duplicate check: any stored row between the pair that encodes the
        // requested relationship (directly, type-inverted, or mirrored).
        let existing = self
            .store
            .links_between(project_id, source_task_id, target_task_id)
            .await?;
        if existing
            .iter()
            .any(|row| row.encodes_same_relationship(source_task_id, target_task_id, link_type))
        {
            return Err(TaskRelationError::already_exists(
                source_task_id,
                target_task_id,
            ));
        }

        // Capacity check, per endpoint. count_links_for_task counts logical
        // links, one row per link with the task as source.
        for task_id in [source_task_id, target_task_id] {
            let count = self.store.count_links_for_task(task_id).await?;
            if count >= self.limits.max_links_per_task {
                return Err(TaskRelationError::limit_reached(
                    task_id,
                    self.limits.max_links_per_task,
                ));
            }
        }

        let ctx = LinkContext {
            project_id,
            source: &source,
            target: &target,
            link_type,
        };
        if let Some(violation) = self.chain.run(&ctx, self.store.as_ref()).await? {
            return Err(TaskRelationError::Validation {
                code: violation.code,
                detail: violation.detail,
            });
        }

        let link = TaskLink::new(project_id, source_task_id, target_task_id, link_type);
        let mirror = link.mirror();
        let created = self.store.insert_link_pair(link, mirror).await?;

        tracing::info!(
            link_id = %created.id,
            project_id,
            source_task_id,
            target_task_id,
            link_type = %link_type,
            "task link created"
        );

        Ok(created)
    }

    /// Delete a link by id, matching `task_id` as either endpoint.
    ///
    /// Deletes the row and its mirror in one transaction. A missing mirror
    /// is a consistency defect in storage, not a caller mistake: the primary
    /// deletion still succeeds and the inconsistency is logged for
    /// out-of-band reconciliation.
    pub async fn delete_link(
        &self,
        project_id: &str,
        task_id: &str,
        link_id: &str,
    ) -> Result<(), TaskRelationError> {
        let _guard = self.write_lock.lock().await;

        let link = self
            .store
            .get_link(project_id, link_id)
            .await?
            .ok_or_else(|| TaskRelationError::link_not_found(link_id))?;

        if link.source_task_id != task_id && link.target_task_id != task_id {
            return Err(TaskRelationError::link_not_found(link_id));
        }

        // Locate the mirror among the rows between the pair: swapped
        // endpoints, inverted type, different row id.
        let rows = self
            .store
            .links_between(project_id, &link.source_task_id, &link.target_task_id)
            .await?;
        let mirror_id = rows
            .iter()
            .find(|row| {
                row.id != link.id
                    && row.source_task_id == link.target_task_id
                    && row.target_task_id == link.source_task_id
                    && row.link_type == link.link_type.inverse()
            })
            .map(|row| row.id.clone());

        if mirror_id.is_none() {
            tracing::warn!(
                link_id = %link.id,
                source_task_id = %link.source_task_id,
                target_task_id = %link.target_task_id,
                "mirror row missing on link deletion; deleting primary only"
            );
        }

        self.store
            .delete_link_pair(&link.id, mirror_id.as_deref())
            .await?;

        tracing::info!(
            link_id = %link.id,
            project_id,
            mirror_deleted = mirror_id.is_some(),
            "task link deleted"
        );

        Ok(())
    }

    /// All link rows touching a task, newest first, with the total count.
    pub async fn list_links_by_task(
        &self,
        task_id: &str,
    ) -> Result<TaskLinkPage, TaskRelationError> {
        let links = self.store.links_for_task(task_id).await?;
        let total = links.len();
        Ok(TaskLinkPage { links, total })
    }

    /// Deduplicated ids of tasks linked to `task_id` from either side.
    pub async fn list_related_task_ids(
        &self,
        task_id: &str,
    ) -> Result<HashSet<String>, TaskRelationError> {
        let links = self.store.links_for_task(task_id).await?;

        let mut related = HashSet::new();
        for link in links {
            if link.source_task_id == task_id {
                related.insert(link.target_task_id);
            } else {
                related.insert(link.source_task_id);
            }
        }
        Ok(related)
    }

    /// Links touching a task, hydrated with endpoint task projections.
    pub async fn list_links_with_tasks(
        &self,
        task_id: &str,
    ) -> Result<Vec<LinkWithTasks>, TaskRelationError> {
        let links = self.store.links_for_task(task_id).await?;
        self.hydrate_links(links).await
    }

    /// Hydrated links for many tasks in one link query.
    ///
    /// Issues a single query covering all requested ids and buckets each
    /// returned row onto every requested task it touches, so a page of N
    /// tasks costs one link query instead of N.
    pub async fn batch_list_links_with_tasks(
        &self,
        task_ids: &[String],
    ) -> Result<HashMap<String, Vec<LinkWithTasks>>, TaskRelationError> {
        let mut buckets: HashMap<String, Vec<LinkWithTasks>> = task_ids
            .iter()
            .map(|id| (id.clone(), Vec::new()))
            .collect();

        let links = self.store.links_for_tasks(task_ids).await?;
        let hydrated = self.hydrate_links(links).await?;

        for item in hydrated {
            for endpoint in [
                item.link.source_task_id.clone(),
                item.link.target_task_id.clone(),
            ] {
                if let Some(bucket) = buckets.get_mut(&endpoint) {
                    bucket.push(item.clone());
                }
            }
        }

        Ok(buckets)
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

    /// Attach endpoint projections to link rows with one batch task lookup.
    ///
    /// Rows whose endpoints can no longer be resolved (task deleted under a
    /// race) are dropped from the view with a warning rather than failing
    /// the whole read.
    async fn hydrate_links(
        &self,
        links: Vec<TaskLink>,
    ) -> Result<Vec<LinkWithTasks>, TaskRelationError> {
        if links.is_empty() {
            return Ok(Vec::new());
        }

        let endpoint_ids: Vec<String> = links
            .iter()
            .flat_map(|link| [link.source_task_id.clone(), link.target_task_id.clone()])
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let tasks: HashMap<String, TaskSummary> = self
            .store
            .find_tasks(&endpoint_ids)
            .await?
            .into_iter()
            .map(|task| (task.id.clone(), task))
            .collect();

        let mut hydrated = Vec::with_capacity(links.len());
        for link in links {
            match (
                tasks.get(&link.source_task_id),
                tasks.get(&link.target_task_id),
            ) {
                (Some(source), Some(target)) => hydrated.push(LinkWithTasks {
                    source_task: source.clone(),
                    target_task: target.clone(),
                    link,
                }),
                _ => {
                    tracing::warn!(
                        link_id = %link.id,
                        "dropping link row with unresolvable endpoint from hydrated view"
                    );
                }
            }
        }
        Ok(hydrated)
    }
}
