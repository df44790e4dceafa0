//! Tasklane Relationship Core
//!
//! This crate provides the task relationship graph engine for Tasklane:
//! typed links between tasks and the parent/child hierarchy, with the
//! validation machinery that keeps both graphs internally consistent and
//! consistent with each other.
//!
//! # Architecture
//!
//! - **Two coupled graphs**: a link graph (typed, direction-sensitive edges
//!   stored as mirrored row pairs) and a hierarchy graph (single-parent
//!   forest, bounded depth)
//! - **Validation chains**: every mutation runs an ordered, fail-fast list
//!   of independent rules before anything is persisted
//! - **libsql/Turso**: embedded SQLite-compatible storage; paired link
//!   writes are transactional, and UNIQUE constraints back the invariants
//!   at the storage level
//! - **Stable reason codes**: rejections carry machine codes
//!   (`task_links.*`, `task_hierarchy.*`); localization happens at the
//!   presentation seam
//!
//! # Modules
//!
//! - [`models`] - Data structures (TaskLink, TaskHierarchy, projections)
//! - [`validation`] - Rule traits, rule structs, and chain factories
//! - [`services`] - Graph services and the relationship hydrator
//! - [`db`] - Database layer with libsql integration

pub mod db;
pub mod models;
pub mod services;
pub mod validation;

// Re-export commonly used types
pub use models::*;
pub use services::*;
pub use validation::{GraphLimits, Violation};
