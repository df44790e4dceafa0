//! Graph Mutation Validation
//!
//! Every write to the link or hierarchy graph runs through an ordered,
//! fail-fast chain of independent rules before anything is persisted. Each
//! rule is a small struct implementing one trait over a shared context plus
//! read access to the persisted edge set; chains are built by explicit
//! factory functions taking an ordered list. There is no registry or
//! container: what runs is what the factory lists.
//!
//! Ordering is significant: structural checks (project scope, self-edges)
//! run before graph-shape checks (reachability), which run before domain
//! checks, so the most actionable reason code is always the one reported.
//!
//! Rules return `Ok(None)` for pass, `Ok(Some(Violation))` for a final,
//! client-correctable rejection, and `Err` only for storage failures. A
//! failed validation is a correct answer, never a transient condition.

mod hierarchy_rules;
mod link_rules;

pub use hierarchy_rules::{
    HierarchyAcyclic, HierarchyDepthBound, HierarchyLinkConflict, NoSelfParent, SingleParent,
};
pub use link_rules::{
    BlocksAcyclic, LinkHierarchyConflict, LinkTypeRules, NoSelfLink, OneRelationshipPerPair,
    SameProject,
};

use crate::db::RelationStore;
use crate::models::{LinkType, TaskSummary};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Stable machine reason codes surfaced with every rejection.
///
/// The core only ever produces these codes; turning a code into a localized
/// message is the caller's concern (see `services::MessageCatalog`).
pub mod reason {
    pub const TASK_NOT_FOUND: &str = "tasks.not_found";

    pub const LINK_ALREADY_EXISTS: &str = "task_links.already_exists";
    pub const LINK_LIMIT_REACHED: &str = "task_links.link_limit_reached";
    pub const LINK_NOT_FOUND: &str = "task_links.not_found";
    pub const LINK_CROSS_PROJECT: &str = "task_links.cross_project";
    pub const LINK_SELF: &str = "task_links.self_link";
    pub const LINK_CIRCULAR: &str = "task_links.circular_dependency";
    pub const LINK_HIERARCHY_CONFLICT: &str = "task_links.hierarchy_conflict";
    pub const LINK_DUPLICATE_TARGET: &str = "task_links.duplicate_target_exists";
    pub const LINK_PAIR_TAKEN: &str = "task_links.pair_already_related";

    pub const HIERARCHY_SELF: &str = "task_hierarchy.self_parent";
    pub const HIERARCHY_MULTIPLE_PARENTS: &str = "task_hierarchy.parent_already_assigned";
    pub const HIERARCHY_CIRCULAR: &str = "task_hierarchy.circular_dependency";
    pub const HIERARCHY_DEPTH: &str = "task_hierarchy.depth_limit_reached";
    pub const HIERARCHY_LINK_CONFLICT: &str = "task_hierarchy.link_conflict";
    pub const HIERARCHY_NOT_FOUND: &str = "task_hierarchy.not_found";
}

/// Configured bounds for the relationship graph
///
/// Deserializable so deployments can override the defaults from their config
/// file; the defaults match the product caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphLimits {
    /// Maximum logical links touching a single task
    pub max_links_per_task: u32,

    /// Maximum tasks on any root-to-leaf hierarchy chain
    pub max_hierarchy_depth: u32,

    /// Whether a pair of tasks may hold at most one relationship of any kind
    /// (link or hierarchy edge)
    pub single_relationship_per_pair: bool,
}

impl Default for GraphLimits {
    fn default() -> Self {
        Self {
            max_links_per_task: 20,
            max_hierarchy_depth: 10,
            single_relationship_per_pair: true,
        }
    }
}

/// A final, client-correctable rejection produced by a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Stable machine reason code (see [`reason`])
    pub code: &'static str,

    /// Human-oriented detail for logs; not localized
    pub detail: String,
}

impl Violation {
    pub fn new(code: &'static str, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }
}

/// Context shared by all link rules for one requested link
pub struct LinkContext<'a> {
    pub project_id: &'a str,
    pub source: &'a TaskSummary,
    pub target: &'a TaskSummary,
    pub link_type: LinkType,
}

/// Context shared by all hierarchy rules for one requested edge
pub struct HierarchyContext<'a> {
    pub project_id: &'a str,
    pub parent: &'a TaskSummary,
    pub child: &'a TaskSummary,
}

/// One independent check over a requested link
#[async_trait]
pub trait LinkRule: Send + Sync {
    /// Rule name for logging
    fn name(&self) -> &'static str;

    /// Pure decision given the context and the currently persisted edges
    async fn check(
        &self,
        ctx: &LinkContext<'_>,
        store: &dyn RelationStore,
    ) -> anyhow::Result<Option<Violation>>;
}

/// One independent check over a requested hierarchy edge
#[async_trait]
pub trait HierarchyRule: Send + Sync {
    /// Rule name for logging
    fn name(&self) -> &'static str;

    /// Pure decision given the context and the currently persisted edges
    async fn check(
        &self,
        ctx: &HierarchyContext<'_>,
        store: &dyn RelationStore,
    ) -> anyhow::Result<Option<Violation>>;
}

/// Ordered, fail-fast pipeline of link rules
pub struct LinkValidationChain {
    rules: Vec<Box<dyn LinkRule>>,
}

impl LinkValidationChain {
    /// Build a chain from an explicit ordered rule list
    pub fn new(rules: Vec<Box<dyn LinkRule>>) -> Self {
        Self { rules }
    }

    /// The standard chain: structural checks, then graph-shape checks, then
    /// domain checks
    pub fn standard(limits: &GraphLimits) -> Self {
        Self::new(vec![
            Box::new(SameProject),
            Box::new(NoSelfLink),
            Box::new(BlocksAcyclic),
            Box::new(LinkHierarchyConflict),
            Box::new(LinkTypeRules),
            Box::new(OneRelationshipPerPair::new(
                limits.single_relationship_per_pair,
            )),
        ])
    }

    /// Run every rule in order; the first violation wins
    pub async fn run(
        &self,
        ctx: &LinkContext<'_>,
        store: &dyn RelationStore,
    ) -> anyhow::Result<Option<Violation>> {
        for rule in &self.rules {
            if let Some(violation) = rule.check(ctx, store).await? {
                tracing::debug!(
                    rule = rule.name(),
                    code = violation.code,
                    "link validation failed"
                );
                return Ok(Some(violation));
            }
        }
        Ok(None)
    }
}

/// Ordered, fail-fast pipeline of hierarchy rules
pub struct HierarchyValidationChain {
    rules: Vec<Box<dyn HierarchyRule>>,
}

impl HierarchyValidationChain {
    /// Build a chain from an explicit ordered rule list
    pub fn new(rules: Vec<Box<dyn HierarchyRule>>) -> Self {
        Self { rules }
    }

    /// The standard chain for `create_hierarchy`
    pub fn standard(limits: &GraphLimits) -> Self {
        Self::new(vec![
            Box::new(NoSelfParent),
            Box::new(SingleParent),
            Box::new(HierarchyAcyclic),
            Box::new(HierarchyDepthBound::new(limits.max_hierarchy_depth)),
            Box::new(HierarchyLinkConflict::new(
                limits.single_relationship_per_pair,
            )),
        ])
    }

    /// Run every rule in order; the first violation wins
    pub async fn run(
        &self,
        ctx: &HierarchyContext<'_>,
        store: &dyn RelationStore,
    ) -> anyhow::Result<Option<Violation>> {
        for rule in &self.rules {
            if let Some(violation) = rule.check(ctx, store).await? {
                tracing::debug!(
                    rule = rule.name(),
                    code = violation.code,
                    "hierarchy validation failed"
                );
                return Ok(Some(violation));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = GraphLimits::default();
        assert_eq!(limits.max_links_per_task, 20);
        assert_eq!(limits.max_hierarchy_depth, 10);
        assert!(limits.single_relationship_per_pair);
    }

    #[test]
    fn test_limits_deserialize_partial_config() {
        let limits: GraphLimits = serde_json::from_str(r#"{"maxLinksPerTask": 5}"#).unwrap();
        assert_eq!(limits.max_links_per_task, 5);
        assert_eq!(limits.max_hierarchy_depth, 10);
    }

    #[test]
    fn test_violation_carries_code() {
        let violation = Violation::new(reason::LINK_SELF, "task t1 cannot link to itself");
        assert_eq!(violation.code, "task_links.self_link");
    }
}
