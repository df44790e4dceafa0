//! Service Layer Error Types
//!
//! This module defines the error taxonomy for graph service operations:
//!
//! - **Not found**: referenced task, link, or hierarchy edge absent or
//!   outside the declared project; surfaced to the caller, never retried
//! - **Conflict/validation**: duplicate edge, capacity, or a chain rule
//!   rejection; carries a stable machine reason code and is final
//! - **Storage**: database/transport failures, propagated as-is
//!
//! Missing-mirror on link deletion is deliberately *not* an error: the
//! services log a consistency warning and report success (see
//! `TaskLinkService::delete_link`).

use crate::validation::reason;
use thiserror::Error;

/// Graph service operation errors
#[derive(Error, Debug)]
pub enum TaskRelationError {
    /// Task absent or outside the declared project
    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    /// Link row absent, outside the project, or not touching the given task
    #[error("Link not found: {link_id}")]
    LinkNotFound { link_id: String },

    /// Hierarchy edge absent for the composite key
    #[error("Hierarchy edge not found: {parent_task_id} -> {child_task_id}")]
    HierarchyNotFound {
        parent_task_id: String,
        child_task_id: String,
    },

    /// An equivalent link already connects the pair
    #[error("Link already exists between {source_task_id} and {target_task_id}")]
    AlreadyExists {
        source_task_id: String,
        target_task_id: String,
    },

    /// The per-task link cap is exhausted
    #[error("Link limit reached for task {task_id} (cap {cap})")]
    LimitReached { task_id: String, cap: u32 },

    /// A validation chain rule rejected the mutation
    #[error("Validation failed ({code}): {detail}")]
    Validation { code: &'static str, detail: String },

    /// Storage failure; no partial state is assumed recoverable here
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl TaskRelationError {
    /// Create a task not found error
    pub fn task_not_found(task_id: impl Into<String>) -> Self {
        Self::TaskNotFound {
            task_id: task_id.into(),
        }
    }

    /// Create a link not found error
    pub fn link_not_found(link_id: impl Into<String>) -> Self {
        Self::LinkNotFound {
            link_id: link_id.into(),
        }
    }

    /// Create a hierarchy edge not found error
    pub fn hierarchy_not_found(
        parent_task_id: impl Into<String>,
        child_task_id: impl Into<String>,
    ) -> Self {
        Self::HierarchyNotFound {
            parent_task_id: parent_task_id.into(),
            child_task_id: child_task_id.into(),
        }
    }

    /// Create an already exists error
    pub fn already_exists(
        source_task_id: impl Into<String>,
        target_task_id: impl Into<String>,
    ) -> Self {
        Self::AlreadyExists {
            source_task_id: source_task_id.into(),
            target_task_id: target_task_id.into(),
        }
    }

    /// Create a limit reached error
    pub fn limit_reached(task_id: impl Into<String>, cap: u32) -> Self {
        Self::LimitReached {
            task_id: task_id.into(),
            cap,
        }
    }

    /// The stable machine reason code for this error, when one exists.
    ///
    /// Storage failures carry no code; they are not client-correctable.
    pub fn reason_code(&self) -> Option<&'static str> {
        match self {
            Self::TaskNotFound { .. } => Some(reason::TASK_NOT_FOUND),
            Self::LinkNotFound { .. } => Some(reason::LINK_NOT_FOUND),
            Self::HierarchyNotFound { .. } => Some(reason::HIERARCHY_NOT_FOUND),
            Self::AlreadyExists { .. } => Some(reason::LINK_ALREADY_EXISTS),
            Self::LimitReached { .. } => Some(reason::LINK_LIMIT_REACHED),
            Self::Validation { code, .. } => Some(code),
            Self::Storage(_) => None,
        }
    }
}
