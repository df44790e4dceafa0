//! Database Layer
//!
//! This module handles all database interactions using libsql/Turso:
//!
//! - Database initialization and connection management
//! - Relationship graph tables (`tasks`, `task_links`, `task_hierarchy`)
//! - UNIQUE constraints backing the validation layer at storage level
//! - Transactional paired writes for mirrored link rows
//!
//! # Architecture
//!
//! `DatabaseService` owns the connection and the extracted SQL; `TursoStore`
//! wraps it behind the `RelationStore` trait so services and validation
//! rules stay backend-agnostic.

mod database;
mod error;
mod relation_store;
mod turso_store;

pub use database::{DatabaseService, DbHierarchyRow, DbLinkRow, DbTaskRow};
pub use error::DatabaseError;
pub use relation_store::RelationStore;
pub use turso_store::TursoStore;
