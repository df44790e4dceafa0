//! Hierarchy Validation Rules
//!
//! The independent checks composed into the standard hierarchy chain, in
//! their standard order: no-self-parent and single-parent (structural),
//! acyclicity and depth bound (graph shape), and cross-graph conflict with
//! the link graph.
//!
//! All walks are iterative with explicit visited-sets; traversal correctness
//! never depends on the invariants the rules themselves maintain.

use crate::db::RelationStore;
use crate::models::LinkType;
use crate::validation::{reason, HierarchyContext, HierarchyRule, Violation};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};

/// A task cannot be its own parent.
pub struct NoSelfParent;

#[async_trait]
impl HierarchyRule for NoSelfParent {
    fn name(&self) -> &'static str {
        "no_self_parent"
    }

    async fn check(
        &self,
        ctx: &HierarchyContext<'_>,
        _store: &dyn RelationStore,
    ) -> anyhow::Result<Option<Violation>> {
        if ctx.parent.id == ctx.child.id {
            return Ok(Some(Violation::new(
                reason::HIERARCHY_SELF,
                format!("task {} cannot be its own parent", ctx.child.id),
            )));
        }
        Ok(None)
    }
}

/// Every task has at most one parent (forest invariant).
pub struct SingleParent;

#[async_trait]
impl HierarchyRule for SingleParent {
    fn name(&self) -> &'static str {
        "single_parent"
    }

    async fn check(
        &self,
        ctx: &HierarchyContext<'_>,
        store: &dyn RelationStore,
    ) -> anyhow::Result<Option<Violation>> {
        if let Some(edge) = store.parent_edge(&ctx.child.id).await? {
            return Ok(Some(Violation::new(
                reason::HIERARCHY_MULTIPLE_PARENTS,
                format!(
                    "task {} already has parent {}",
                    ctx.child.id, edge.parent_task_id
                ),
            )));
        }
        Ok(None)
    }
}

/// Parent-to-child reachability must stay acyclic.
///
/// The new parent must not already be a descendant of the child; otherwise
/// the edge closes a cycle. Searches downward from the child with an
/// explicit queue and visited-set.
pub struct HierarchyAcyclic;

#[async_trait]
impl HierarchyRule for HierarchyAcyclic {
    fn name(&self) -> &'static str {
        "acyclic"
    }

    async fn check(
        &self,
        ctx: &HierarchyContext<'_>,
        store: &dyn RelationStore,
    ) -> anyhow::Result<Option<Violation>> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        queue.push_back(ctx.child.id.clone());

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if current == ctx.parent.id {
                return Ok(Some(Violation::new(
                    reason::HIERARCHY_CIRCULAR,
                    format!(
                        "task {} is already a descendant of task {}",
                        ctx.parent.id, ctx.child.id
                    ),
                )));
            }
            for edge in store.child_edges(&current).await? {
                if !visited.contains(&edge.child_task_id) {
                    queue.push_back(edge.child_task_id);
                }
            }
        }

        Ok(None)
    }
}

/// Root-to-leaf chains are depth-bounded.
///
/// Inserting `parent -> child` creates a chain of
/// `ancestors(parent) + parent + child + deepest-chain-below(child)` tasks;
/// the rule rejects when that exceeds the configured maximum.
pub struct HierarchyDepthBound {
    max_depth: u32,
}

impl HierarchyDepthBound {
    pub fn new(max_depth: u32) -> Self {
        Self { max_depth }
    }

    /// Number of ancestors above a task, walking up parent edges.
    ///
    /// The visited-set bounds the walk even if a cycle is already present in
    /// storage.
    async fn ancestors_above(
        &self,
        store: &dyn RelationStore,
        task_id: &str,
    ) -> anyhow::Result<u32> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = task_id.to_string();
        let mut count = 0u32;

        while visited.insert(current.clone()) {
            match store.parent_edge(&current).await? {
                Some(edge) => {
                    count += 1;
                    current = edge.parent_task_id;
                }
                None => break,
            }
        }

        Ok(count)
    }

    /// Length in tasks of the deepest chain strictly below a task.
    async fn deepest_chain_below(
        &self,
        store: &dyn RelationStore,
        task_id: &str,
    ) -> anyhow::Result<u32> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, u32)> = VecDeque::new();
        let mut deepest = 0u32;
        queue.push_back((task_id.to_string(), 0));

        while let Some((current, depth)) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            deepest = deepest.max(depth);
            for edge in store.child_edges(&current).await? {
                if !visited.contains(&edge.child_task_id) {
                    queue.push_back((edge.child_task_id, depth + 1));
                }
            }
        }

        Ok(deepest)
    }
}

#[async_trait]
impl HierarchyRule for HierarchyDepthBound {
    fn name(&self) -> &'static str {
        "depth_bound"
    }

    async fn check(
        &self,
        ctx: &HierarchyContext<'_>,
        store: &dyn RelationStore,
    ) -> anyhow::Result<Option<Violation>> {
        let above = self.ancestors_above(store, &ctx.parent.id).await?;
        let below = self.deepest_chain_below(store, &ctx.child.id).await?;

        // Chain through the new edge, counted in tasks: the parent's
        // ancestors, the parent, the child, and the deepest chain below.
        let chain_len = above + 2 + below;
        if chain_len > self.max_depth {
            return Ok(Some(Violation::new(
                reason::HIERARCHY_DEPTH,
                format!(
                    "edge {} -> {} would create a chain of {} tasks (maximum {})",
                    ctx.parent.id, ctx.child.id, chain_len, self.max_depth
                ),
            )));
        }
        Ok(None)
    }
}

/// A pair already connected in the link graph cannot also hold a hierarchy
/// edge.
///
/// Dependency-flavored links always conflict with a parent/child edge; a
/// plain `RELATES_TO` only does when the product runs with the
/// one-relationship-per-pair policy.
pub struct HierarchyLinkConflict {
    single_relationship_per_pair: bool,
}

impl HierarchyLinkConflict {
    pub fn new(single_relationship_per_pair: bool) -> Self {
        Self {
            single_relationship_per_pair,
        }
    }
}

#[async_trait]
impl HierarchyRule for HierarchyLinkConflict {
    fn name(&self) -> &'static str {
        "link_conflict"
    }

    async fn check(
        &self,
        ctx: &HierarchyContext<'_>,
        store: &dyn RelationStore,
    ) -> anyhow::Result<Option<Violation>> {
        let links = store
            .links_between(ctx.project_id, &ctx.parent.id, &ctx.child.id)
            .await?;

        let conflicting = links.iter().find(|link| {
            self.single_relationship_per_pair || link.link_type != LinkType::RelatesTo
        });

        if let Some(link) = conflicting {
            return Ok(Some(Violation::new(
                reason::HIERARCHY_LINK_CONFLICT,
                format!(
                    "tasks {} and {} already hold a {} link",
                    ctx.parent.id, ctx.child.id, link.link_type
                ),
            )));
        }
        Ok(None)
    }
}
