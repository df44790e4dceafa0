//! Business Services
//!
//! This module contains the graph services and their supporting pieces:
//!
//! - `TaskLinkService` - typed link CRUD and queries, mirrored-pair storage
//! - `TaskHierarchyService` - parent/child CRUD, neighbor and transitive
//!   traversal
//! - `RelationshipHydrator` - read-side composition of both graphs
//! - `TaskRelationError` - service error taxonomy with stable reason codes
//! - `MessageCatalog` - reason-code to localized-message seam
//!
//! Services coordinate between the validation chains and the store,
//! implementing the graph invariants and orchestrating paired writes.

pub mod catalog;
pub mod error;
pub mod hierarchy_service;
pub mod hydrator;
pub mod link_service;

pub use catalog::{EnglishCatalog, MessageCatalog};
pub use error::TaskRelationError;
pub use hierarchy_service::TaskHierarchyService;
pub use hydrator::RelationshipHydrator;
pub use link_service::TaskLinkService;

use crate::db::RelationStore;
use crate::validation::GraphLimits;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The wired-up relationship services over one store.
///
/// Explicit composition: the services share a single write lock (both
/// validation chains read both graphs) and the hierarchy service reuses the
/// link service for batch link hydration. No container, no registry; this
/// constructor is the whole wiring.
pub struct RelationshipServices {
    pub links: Arc<TaskLinkService>,
    pub hierarchy: Arc<TaskHierarchyService>,
    pub hydrator: RelationshipHydrator,
}

impl RelationshipServices {
    /// Build the services over a store with the given limits.
    pub fn new(store: Arc<dyn RelationStore>, limits: GraphLimits) -> Self {
        let write_lock = Arc::new(Mutex::new(()));

        let links = Arc::new(TaskLinkService::new(
            store.clone(),
            limits.clone(),
            write_lock.clone(),
        ));
        let hierarchy = Arc::new(TaskHierarchyService::new(
            store,
            limits,
            links.clone(),
            write_lock,
        ));
        let hydrator = RelationshipHydrator::new(links.clone(), hierarchy.clone());

        Self {
            links,
            hierarchy,
            hydrator,
        }
    }
}
