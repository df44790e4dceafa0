//! Link Validation Rules
//!
//! The independent checks composed into the standard link chain, in their
//! standard order: same-project and no-self-link (structural), blocking-graph
//! acyclicity (graph shape), cross-graph conflict with the hierarchy,
//! type-specific domain rules, and the optional one-relationship-per-pair
//! policy.

use crate::db::RelationStore;
use crate::models::LinkType;
use crate::validation::{reason, LinkContext, LinkRule, Violation};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};

/// Both endpoints must belong to the link's project.
pub struct SameProject;

#[async_trait]
impl LinkRule for SameProject {
    fn name(&self) -> &'static str {
        "same_project"
    }

    async fn check(
        &self,
        ctx: &LinkContext<'_>,
        _store: &dyn RelationStore,
    ) -> anyhow::Result<Option<Violation>> {
        if ctx.source.project_id != ctx.project_id || ctx.target.project_id != ctx.project_id {
            return Ok(Some(Violation::new(
                reason::LINK_CROSS_PROJECT,
                format!(
                    "tasks {} and {} must both belong to project {}",
                    ctx.source.id, ctx.target.id, ctx.project_id
                ),
            )));
        }
        Ok(None)
    }
}

/// A task cannot link to itself.
pub struct NoSelfLink;

#[async_trait]
impl LinkRule for NoSelfLink {
    fn name(&self) -> &'static str {
        "no_self_link"
    }

    async fn check(
        &self,
        ctx: &LinkContext<'_>,
        _store: &dyn RelationStore,
    ) -> anyhow::Result<Option<Violation>> {
        if ctx.source.id == ctx.target.id {
            return Ok(Some(Violation::new(
                reason::LINK_SELF,
                format!("task {} cannot be linked to itself", ctx.source.id),
            )));
        }
        Ok(None)
    }
}

/// The `BLOCKS` subgraph must stay acyclic.
///
/// Before accepting `A BLOCKS B` (or its inverse, normalized to blocking
/// direction), searches from the blocked task over existing `BLOCKS` edges;
/// if the blocker is reachable, the new edge would let a task transitively
/// block itself.
///
/// The walk is iterative (explicit queue) with a visited-set keyed by task
/// id, so it terminates even if a structural defect already put a cycle in
/// storage.
pub struct BlocksAcyclic;

#[async_trait]
impl LinkRule for BlocksAcyclic {
    fn name(&self) -> &'static str {
        "blocks_acyclic"
    }

    async fn check(
        &self,
        ctx: &LinkContext<'_>,
        store: &dyn RelationStore,
    ) -> anyhow::Result<Option<Violation>> {
        if !ctx.link_type.is_blocking() {
            return Ok(None);
        }

        // Normalize to blocking direction: A IS_BLOCKED_BY B means B BLOCKS A.
        let (blocker, blocked) = match ctx.link_type {
            LinkType::Blocks => (&ctx.source.id, &ctx.target.id),
            _ => (&ctx.target.id, &ctx.source.id),
        };

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        queue.push_back(blocked.clone());

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if &current == blocker {
                return Ok(Some(Violation::new(
                    reason::LINK_CIRCULAR,
                    format!(
                        "task {} already transitively blocks task {}",
                        blocked, blocker
                    ),
                )));
            }
            for next in store.link_targets_by_type(&current, LinkType::Blocks).await? {
                if !visited.contains(&next) {
                    queue.push_back(next);
                }
            }
        }

        Ok(None)
    }
}

/// A pair already connected in the hierarchy cannot also hold a dependency
/// link.
///
/// `RELATES_TO` is exempt here: an informational link alongside a
/// parent/child edge contradicts nothing. When the product runs with the
/// one-relationship-per-pair policy, the final chain rule rejects that
/// combination instead.
pub struct LinkHierarchyConflict;

#[async_trait]
impl LinkRule for LinkHierarchyConflict {
    fn name(&self) -> &'static str {
        "hierarchy_conflict"
    }

    async fn check(
        &self,
        ctx: &LinkContext<'_>,
        store: &dyn RelationStore,
    ) -> anyhow::Result<Option<Violation>> {
        if ctx.link_type == LinkType::RelatesTo {
            return Ok(None);
        }

        if let Some(edge) = store
            .hierarchy_edge_between(ctx.project_id, &ctx.source.id, &ctx.target.id)
            .await?
        {
            return Ok(Some(Violation::new(
                reason::LINK_HIERARCHY_CONFLICT,
                format!(
                    "tasks {} and {} already hold a parent/child edge ({} -> {})",
                    ctx.source.id, ctx.target.id, edge.parent_task_id, edge.child_task_id
                ),
            )));
        }
        Ok(None)
    }
}

/// Type-specific domain rules, keyed by the requested link type.
///
/// `DUPLICATES` carries an out-degree bound: a task marks at most one other
/// task as its canonical original. The remaining types carry no extra
/// constraint today.
pub struct LinkTypeRules;

#[async_trait]
impl LinkRule for LinkTypeRules {
    fn name(&self) -> &'static str {
        "type_rules"
    }

    async fn check(
        &self,
        ctx: &LinkContext<'_>,
        store: &dyn RelationStore,
    ) -> anyhow::Result<Option<Violation>> {
        // Normalize IS_DUPLICATED_BY: A IS_DUPLICATED_BY B means B DUPLICATES A,
        // so the out-degree bound applies to B.
        let duplicating_task = match ctx.link_type {
            LinkType::Duplicates => &ctx.source.id,
            LinkType::IsDuplicatedBy => &ctx.target.id,
            _ => return Ok(None),
        };

        let existing = store
            .link_targets_by_type(duplicating_task, LinkType::Duplicates)
            .await?;
        if !existing.is_empty() {
            return Ok(Some(Violation::new(
                reason::LINK_DUPLICATE_TARGET,
                format!(
                    "task {} already duplicates task {}",
                    duplicating_task, existing[0]
                ),
            )));
        }
        Ok(None)
    }
}

/// Optional policy: at most one relationship of any kind per pair.
///
/// When enabled, rejects a link if any link row or hierarchy edge already
/// connects the pair, regardless of type. The earlier rules have already
/// produced the more specific codes for equivalent links and dependency
/// conflicts; this is the catch-all for mixed-type pairs.
pub struct OneRelationshipPerPair {
    enabled: bool,
}

impl OneRelationshipPerPair {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl LinkRule for OneRelationshipPerPair {
    fn name(&self) -> &'static str {
        "one_relationship_per_pair"
    }

    async fn check(
        &self,
        ctx: &LinkContext<'_>,
        store: &dyn RelationStore,
    ) -> anyhow::Result<Option<Violation>> {
        if !self.enabled {
            return Ok(None);
        }

        let links = store
            .links_between(ctx.project_id, &ctx.source.id, &ctx.target.id)
            .await?;
        if !links.is_empty() {
            return Ok(Some(Violation::new(
                reason::LINK_PAIR_TAKEN,
                format!(
                    "tasks {} and {} are already related ({})",
                    ctx.source.id, ctx.target.id, links[0].link_type
                ),
            )));
        }

        if store
            .hierarchy_edge_between(ctx.project_id, &ctx.source.id, &ctx.target.id)
            .await?
            .is_some()
        {
            return Ok(Some(Violation::new(
                reason::LINK_PAIR_TAKEN,
                format!(
                    "tasks {} and {} are already related through the hierarchy",
                    ctx.source.id, ctx.target.id
                ),
            )));
        }

        Ok(None)
    }
}
