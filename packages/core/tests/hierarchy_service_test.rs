//! Integration tests for TaskHierarchyService
//!
//! Tests cover:
//! - Edge creation and the forest invariants (single parent, acyclicity)
//! - Depth bounding
//! - Cross-graph conflicts with the link graph
//! - Composite-key deletion
//! - Neighbor hydration and transitive traversal

use anyhow::Result;
use std::sync::Arc;
use tasklane_core::{
    db::{DatabaseService, RelationStore, TursoStore},
    models::{LinkType, TaskSummary},
    services::{RelationshipServices, TaskRelationError},
    validation::GraphLimits,
};
use tempfile::TempDir;

/// Test helper: Create a test environment with default limits
async fn create_test_env() -> Result<(Arc<TursoStore>, RelationshipServices, TempDir)> {
    create_test_env_with_limits(GraphLimits::default()).await
}

/// Test helper: Create a test environment with custom limits
async fn create_test_env_with_limits(
    limits: GraphLimits,
) -> Result<(Arc<TursoStore>, RelationshipServices, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db = Arc::new(DatabaseService::new(db_path).await?);
    let store = Arc::new(TursoStore::new(db));
    let services = RelationshipServices::new(store.clone(), limits);
    Ok((store, services, temp_dir))
}

/// Test helper: Seed a task projection
async fn seed_task(store: &Arc<TursoStore>, project_id: &str, title: &str) -> Result<TaskSummary> {
    store.create_task(TaskSummary::new(project_id, title)).await
}

// =========================================================================
// Creation & Forest Invariants
// =========================================================================

#[tokio::test]
async fn test_create_hierarchy_edge() -> Result<()> {
    let (store, services, _temp_dir) = create_test_env().await?;
    let parent = seed_task(&store, "p1", "parent").await?;
    let child = seed_task(&store, "p1", "child").await?;

    let edge = services
        .hierarchy
        .create_hierarchy("p1", &parent.id, &child.id)
        .await?;
    assert_eq!(edge.parent_task_id, parent.id);
    assert_eq!(edge.child_task_id, child.id);

    let parents = services.hierarchy.get_parents_for_task(&child.id).await?;
    assert_eq!(parents.len(), 1);
    assert_eq!(parents[0].task.id, parent.id);
    Ok(())
}

#[tokio::test]
async fn test_self_parent_rejected() -> Result<()> {
    let (store, services, _temp_dir) = create_test_env().await?;
    let task = seed_task(&store, "p1", "task").await?;

    let err = services
        .hierarchy
        .create_hierarchy("p1", &task.id, &task.id)
        .await
        .unwrap_err();
    assert_eq!(err.reason_code(), Some("task_hierarchy.self_parent"));
    Ok(())
}

#[tokio::test]
async fn test_second_parent_rejected() -> Result<()> {
    let (store, services, _temp_dir) = create_test_env().await?;
    let p1 = seed_task(&store, "p1", "first parent").await?;
    let p2 = seed_task(&store, "p1", "second parent").await?;
    let child = seed_task(&store, "p1", "child").await?;

    services
        .hierarchy
        .create_hierarchy("p1", &p1.id, &child.id)
        .await?;

    let err = services
        .hierarchy
        .create_hierarchy("p1", &p2.id, &child.id)
        .await
        .unwrap_err();
    assert_eq!(
        err.reason_code(),
        Some("task_hierarchy.parent_already_assigned")
    );
    Ok(())
}

#[tokio::test]
async fn test_direct_cycle_rejected() -> Result<()> {
    let (store, services, _temp_dir) = create_test_env().await?;
    let p = seed_task(&store, "p1", "p").await?;
    let c = seed_task(&store, "p1", "c").await?;

    services
        .hierarchy
        .create_hierarchy("p1", &p.id, &c.id)
        .await?;

    let err = services
        .hierarchy
        .create_hierarchy("p1", &c.id, &p.id)
        .await
        .unwrap_err();
    assert_eq!(
        err.reason_code(),
        Some("task_hierarchy.circular_dependency")
    );
    Ok(())
}

#[tokio::test]
async fn test_transitive_cycle_rejected() -> Result<()> {
    let (store, services, _temp_dir) = create_test_env().await?;
    let a = seed_task(&store, "p1", "a").await?;
    let b = seed_task(&store, "p1", "b").await?;
    let c = seed_task(&store, "p1", "c").await?;

    services
        .hierarchy
        .create_hierarchy("p1", &a.id, &b.id)
        .await?;
    services
        .hierarchy
        .create_hierarchy("p1", &b.id, &c.id)
        .await?;

    // c -> a would close the loop a -> b -> c -> a.
    let err = services
        .hierarchy
        .create_hierarchy("p1", &c.id, &a.id)
        .await
        .unwrap_err();
    assert_eq!(
        err.reason_code(),
        Some("task_hierarchy.circular_dependency")
    );
    Ok(())
}

#[tokio::test]
async fn test_unknown_task_rejected() -> Result<()> {
    let (store, services, _temp_dir) = create_test_env().await?;
    let parent = seed_task(&store, "p1", "parent").await?;

    let err = services
        .hierarchy
        .create_hierarchy("p1", &parent.id, "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, TaskRelationError::TaskNotFound { .. }));
    Ok(())
}

// =========================================================================
// Depth Bound
// =========================================================================

#[tokio::test]
async fn test_depth_bound_rejects_overlong_chain() -> Result<()> {
    let limits = GraphLimits {
        max_hierarchy_depth: 3,
        ..GraphLimits::default()
    };
    let (store, services, _temp_dir) = create_test_env_with_limits(limits).await?;
    let a = seed_task(&store, "p1", "a").await?;
    let b = seed_task(&store, "p1", "b").await?;
    let c = seed_task(&store, "p1", "c").await?;
    let d = seed_task(&store, "p1", "d").await?;

    services
        .hierarchy
        .create_hierarchy("p1", &a.id, &b.id)
        .await?;
    services
        .hierarchy
        .create_hierarchy("p1", &b.id, &c.id)
        .await?;

    // a -> b -> c -> d would be a chain of 4 tasks, over the bound of 3.
    let err = services
        .hierarchy
        .create_hierarchy("p1", &c.id, &d.id)
        .await
        .unwrap_err();
    assert_eq!(err.reason_code(), Some("task_hierarchy.depth_limit_reached"));
    Ok(())
}

#[tokio::test]
async fn test_depth_bound_counts_subtree_below_child() -> Result<()> {
    let limits = GraphLimits {
        max_hierarchy_depth: 3,
        ..GraphLimits::default()
    };
    let (store, services, _temp_dir) = create_test_env_with_limits(limits).await?;
    let root = seed_task(&store, "p1", "root").await?;
    let mid = seed_task(&store, "p1", "mid").await?;
    let leaf = seed_task(&store, "p1", "leaf").await?;
    let top = seed_task(&store, "p1", "top").await?;

    services
        .hierarchy
        .create_hierarchy("p1", &root.id, &mid.id)
        .await?;
    services
        .hierarchy
        .create_hierarchy("p1", &mid.id, &leaf.id)
        .await?;

    // Attaching the 3-task chain under a new root makes a 4-task chain even
    // though the new edge itself is at the top.
    let err = services
        .hierarchy
        .create_hierarchy("p1", &top.id, &root.id)
        .await
        .unwrap_err();
    assert_eq!(err.reason_code(), Some("task_hierarchy.depth_limit_reached"));
    Ok(())
}

// =========================================================================
// Cross-Graph Conflict
// =========================================================================

#[tokio::test]
async fn test_hierarchy_rejected_when_pair_holds_link() -> Result<()> {
    let (store, services, _temp_dir) = create_test_env().await?;
    let a = seed_task(&store, "p1", "a").await?;
    let b = seed_task(&store, "p1", "b").await?;

    services
        .links
        .create_link("p1", &a.id, &b.id, LinkType::SplitsTo)
        .await?;

    let err = services
        .hierarchy
        .create_hierarchy("p1", &a.id, &b.id)
        .await
        .unwrap_err();
    assert_eq!(err.reason_code(), Some("task_hierarchy.link_conflict"));
    Ok(())
}

// =========================================================================
// Deletion
// =========================================================================

#[tokio::test]
async fn test_delete_hierarchy_by_composite_key() -> Result<()> {
    let (store, services, _temp_dir) = create_test_env().await?;
    let parent = seed_task(&store, "p1", "parent").await?;
    let child = seed_task(&store, "p1", "child").await?;

    services
        .hierarchy
        .create_hierarchy("p1", &parent.id, &child.id)
        .await?;
    services
        .hierarchy
        .delete_hierarchy("p1", &parent.id, &child.id)
        .await?;

    assert!(services
        .hierarchy
        .get_parents_for_task(&child.id)
        .await?
        .is_empty());

    // Second delete finds nothing.
    let err = services
        .hierarchy
        .delete_hierarchy("p1", &parent.id, &child.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskRelationError::HierarchyNotFound { .. }));
    Ok(())
}

// =========================================================================
// Neighbor Hydration & Traversal
// =========================================================================

#[tokio::test]
async fn test_children_hydrated_with_tasks_and_links() -> Result<()> {
    let (store, services, _temp_dir) = create_test_env().await?;
    let parent = seed_task(&store, "p1", "parent").await?;
    let child_a = store
        .create_task(TaskSummary::new("p1", "child a").with_assignee("user-1"))
        .await?;
    let child_b = seed_task(&store, "p1", "child b").await?;
    let helper = seed_task(&store, "p1", "helper").await?;

    services
        .hierarchy
        .create_hierarchy("p1", &parent.id, &child_a.id)
        .await?;
    services
        .hierarchy
        .create_hierarchy("p1", &parent.id, &child_b.id)
        .await?;
    services
        .links
        .create_link("p1", &child_a.id, &helper.id, LinkType::Blocks)
        .await?;

    let children = services.hierarchy.get_children_for_task(&parent.id).await?;
    assert_eq!(children.len(), 2);

    let hydrated_a = children
        .iter()
        .find(|n| n.task.id == child_a.id)
        .expect("child a present");
    assert_eq!(hydrated_a.task.assignee_id.as_deref(), Some("user-1"));
    // child a's own links ride along (both rows of the pair).
    assert_eq!(hydrated_a.links.len(), 2);

    let hydrated_b = children
        .iter()
        .find(|n| n.task.id == child_b.id)
        .expect("child b present");
    assert!(hydrated_b.links.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_get_hierarchy_for_task_returns_both_sides() -> Result<()> {
    let (store, services, _temp_dir) = create_test_env().await?;
    let grandparent = seed_task(&store, "p1", "grandparent").await?;
    let parent = seed_task(&store, "p1", "parent").await?;
    let child = seed_task(&store, "p1", "child").await?;

    services
        .hierarchy
        .create_hierarchy("p1", &grandparent.id, &parent.id)
        .await?;
    services
        .hierarchy
        .create_hierarchy("p1", &parent.id, &child.id)
        .await?;

    let view = services.hierarchy.get_hierarchy_for_task(&parent.id).await?;
    assert_eq!(view.parents.len(), 1);
    assert_eq!(view.parents[0].task.id, grandparent.id);
    assert_eq!(view.children.len(), 1);
    assert_eq!(view.children[0].task.id, child.id);
    Ok(())
}

#[tokio::test]
async fn test_all_children_of_deep_chain() -> Result<()> {
    let (store, services, _temp_dir) = create_test_env().await?;
    let root = seed_task(&store, "p1", "root").await?;

    // Chain of depth 5 under the root.
    let mut current = root.clone();
    let mut chain_ids = Vec::new();
    for level in 1..=5 {
        let next = seed_task(&store, "p1", &format!("level {level}")).await?;
        services
            .hierarchy
            .create_hierarchy("p1", &current.id, &next.id)
            .await?;
        chain_ids.push(next.id.clone());
        current = next;
    }

    let descendants = services
        .hierarchy
        .get_all_children_for_task(&root.id)
        .await?;
    let ids: Vec<String> = descendants.iter().map(|t| t.id.clone()).collect();
    assert_eq!(ids, chain_ids, "each descendant exactly once, in order");
    Ok(())
}

#[tokio::test]
async fn test_all_parents_nearest_first() -> Result<()> {
    let (store, services, _temp_dir) = create_test_env().await?;
    let a = seed_task(&store, "p1", "a").await?;
    let b = seed_task(&store, "p1", "b").await?;
    let c = seed_task(&store, "p1", "c").await?;

    services
        .hierarchy
        .create_hierarchy("p1", &a.id, &b.id)
        .await?;
    services
        .hierarchy
        .create_hierarchy("p1", &b.id, &c.id)
        .await?;

    let ancestors = services.hierarchy.get_all_parents_for_task(&c.id).await?;
    let ids: Vec<String> = ancestors.iter().map(|t| t.id.clone()).collect();
    assert_eq!(ids, vec![b.id.clone(), a.id.clone()]);

    // A root has no ancestors.
    assert!(services
        .hierarchy
        .get_all_parents_for_task(&a.id)
        .await?
        .is_empty());
    Ok(())
}

#[tokio::test]
async fn test_branching_descendants_visited_once() -> Result<()> {
    let (store, services, _temp_dir) = create_test_env().await?;
    let root = seed_task(&store, "p1", "root").await?;
    let left = seed_task(&store, "p1", "left").await?;
    let right = seed_task(&store, "p1", "right").await?;
    let leaf_a = seed_task(&store, "p1", "leaf a").await?;
    let leaf_b = seed_task(&store, "p1", "leaf b").await?;

    services
        .hierarchy
        .create_hierarchy("p1", &root.id, &left.id)
        .await?;
    services
        .hierarchy
        .create_hierarchy("p1", &root.id, &right.id)
        .await?;
    services
        .hierarchy
        .create_hierarchy("p1", &left.id, &leaf_a.id)
        .await?;
    services
        .hierarchy
        .create_hierarchy("p1", &right.id, &leaf_b.id)
        .await?;

    let descendants = services
        .hierarchy
        .get_all_children_for_task(&root.id)
        .await?;
    assert_eq!(descendants.len(), 4);

    let mut ids: Vec<&str> = descendants.iter().map(|t| t.id.as_str()).collect();
    ids.sort_unstable();
    let mut expected = [
        left.id.as_str(),
        right.id.as_str(),
        leaf_a.id.as_str(),
        leaf_b.id.as_str(),
    ];
    expected.sort_unstable();
    assert_eq!(ids, expected);
    Ok(())
}
