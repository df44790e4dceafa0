//! Integration tests for RelationshipHydrator
//!
//! Tests cover:
//! - Single-task hydration combining links and hierarchy
//! - Multi-task hydration through the batch link query
//! - Empty-graph behavior

use anyhow::Result;
use std::sync::Arc;
use tasklane_core::{
    db::{DatabaseService, RelationStore, TursoStore},
    models::{LinkType, TaskSummary},
    services::RelationshipServices,
    validation::GraphLimits,
};
use tempfile::TempDir;

/// Test helper: Create a test environment
async fn create_test_env() -> Result<(Arc<TursoStore>, RelationshipServices, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db = Arc::new(DatabaseService::new(db_path).await?);
    let store = Arc::new(TursoStore::new(db));
    let services = RelationshipServices::new(store.clone(), GraphLimits::default());
    Ok((store, services, temp_dir))
}

/// Test helper: Seed a task projection
async fn seed_task(store: &Arc<TursoStore>, project_id: &str, title: &str) -> Result<TaskSummary> {
    store.create_task(TaskSummary::new(project_id, title)).await
}

#[tokio::test]
async fn test_hydrate_single_task() -> Result<()> {
    let (store, services, _temp_dir) = create_test_env().await?;
    let parent = seed_task(&store, "p1", "parent").await?;
    let task = seed_task(&store, "p1", "task").await?;
    let blocker = seed_task(&store, "p1", "blocker").await?;

    services
        .hierarchy
        .create_hierarchy("p1", &parent.id, &task.id)
        .await?;
    services
        .links
        .create_link("p1", &blocker.id, &task.id, LinkType::Blocks)
        .await?;

    let view = services.hydrator.hydrate_task_relationships(&task.id).await?;

    // Both rows of the blocking pair touch the task.
    assert_eq!(view.links.len(), 2);
    assert_eq!(view.hierarchy.parents.len(), 1);
    assert_eq!(view.hierarchy.parents[0].task.id, parent.id);
    assert!(view.hierarchy.children.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_hydrate_task_with_no_relationships() -> Result<()> {
    let (store, services, _temp_dir) = create_test_env().await?;
    let task = seed_task(&store, "p1", "loner").await?;

    let view = services.hydrator.hydrate_task_relationships(&task.id).await?;
    assert!(view.links.is_empty());
    assert!(view.hierarchy.parents.is_empty());
    assert!(view.hierarchy.children.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_hydrate_multiple_tasks() -> Result<()> {
    let (store, services, _temp_dir) = create_test_env().await?;
    let a = seed_task(&store, "p1", "a").await?;
    let b = seed_task(&store, "p1", "b").await?;
    let c = seed_task(&store, "p1", "c").await?;
    let lonely = seed_task(&store, "p1", "lonely").await?;

    services
        .links
        .create_link("p1", &a.id, &b.id, LinkType::RelatesTo)
        .await?;
    services
        .hierarchy
        .create_hierarchy("p1", &b.id, &c.id)
        .await?;

    let ids = vec![a.id.clone(), b.id.clone(), c.id.clone(), lonely.id.clone()];
    let views = services
        .hydrator
        .hydrate_multiple_task_relationships(&ids)
        .await?;

    // Every requested id gets an entry, related or not.
    assert_eq!(views.len(), 4);
    assert_eq!(views[&a.id].links.len(), 2);
    assert_eq!(views[&b.id].links.len(), 2);
    assert_eq!(views[&b.id].hierarchy.children.len(), 1);
    assert_eq!(views[&c.id].hierarchy.parents.len(), 1);
    assert_eq!(views[&c.id].hierarchy.parents[0].task.id, b.id);
    assert!(views[&lonely.id].links.is_empty());
    assert!(views[&lonely.id].hierarchy.parents.is_empty());
    Ok(())
}
