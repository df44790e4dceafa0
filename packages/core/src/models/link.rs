//! Task Link Data Structures
//!
//! A link is a typed, direction-sensitive edge between two tasks in the same
//! project. Every accepted relationship is stored as **two** rows: the row as
//! requested plus its mirror (endpoints swapped, type inverted), so that all
//! "links for task X" reads are a single indexed scan on `source_task_id`.
//!
//! # Link types
//!
//! | Type              | Inverse           |
//! |-------------------|-------------------|
//! | `BLOCKS`          | `IS_BLOCKED_BY`   |
//! | `SPLITS_TO`       | `SPLITS_FROM`     |
//! | `DUPLICATES`      | `IS_DUPLICATED_BY`|
//! | `RELATES_TO`      | `RELATES_TO`      |
//!
//! `RELATES_TO` is its own inverse, so the mirror of a `RELATES_TO` row is the
//! direction-swapped row with the same type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::models::TaskSummary;

/// Error raised when a stored link type column holds an unknown value
#[derive(Error, Debug)]
#[error("Unknown link type: {0}")]
pub struct UnknownLinkType(pub String);

/// Typed, direction-sensitive relationship between two tasks.
///
/// Serialized in SCREAMING_SNAKE_CASE on the wire and in the `link_type`
/// column of the `task_links` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkType {
    Blocks,
    IsBlockedBy,
    SplitsTo,
    SplitsFrom,
    Duplicates,
    IsDuplicatedBy,
    RelatesTo,
}

impl LinkType {
    /// All link types, in declaration order. Used by exhaustive tests.
    pub const ALL: [LinkType; 7] = [
        LinkType::Blocks,
        LinkType::IsBlockedBy,
        LinkType::SplitsTo,
        LinkType::SplitsFrom,
        LinkType::Duplicates,
        LinkType::IsDuplicatedBy,
        LinkType::RelatesTo,
    ];

    /// Fixed inverse table.
    ///
    /// Applying `inverse` twice always returns the original type.
    pub fn inverse(self) -> Self {
        match self {
            LinkType::Blocks => LinkType::IsBlockedBy,
            LinkType::IsBlockedBy => LinkType::Blocks,
            LinkType::SplitsTo => LinkType::SplitsFrom,
            LinkType::SplitsFrom => LinkType::SplitsTo,
            LinkType::Duplicates => LinkType::IsDuplicatedBy,
            LinkType::IsDuplicatedBy => LinkType::Duplicates,
            LinkType::RelatesTo => LinkType::RelatesTo,
        }
    }

    /// Whether the type is its own inverse (`RELATES_TO`).
    pub fn is_symmetric(self) -> bool {
        self == self.inverse()
    }

    /// Whether the type participates in the blocking subgraph, which must
    /// stay acyclic.
    pub fn is_blocking(self) -> bool {
        matches!(self, LinkType::Blocks | LinkType::IsBlockedBy)
    }

    /// Stable column/wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            LinkType::Blocks => "BLOCKS",
            LinkType::IsBlockedBy => "IS_BLOCKED_BY",
            LinkType::SplitsTo => "SPLITS_TO",
            LinkType::SplitsFrom => "SPLITS_FROM",
            LinkType::Duplicates => "DUPLICATES",
            LinkType::IsDuplicatedBy => "IS_DUPLICATED_BY",
            LinkType::RelatesTo => "RELATES_TO",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkType {
    type Err = UnknownLinkType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BLOCKS" => Ok(LinkType::Blocks),
            "IS_BLOCKED_BY" => Ok(LinkType::IsBlockedBy),
            "SPLITS_TO" => Ok(LinkType::SplitsTo),
            "SPLITS_FROM" => Ok(LinkType::SplitsFrom),
            "DUPLICATES" => Ok(LinkType::Duplicates),
            "IS_DUPLICATED_BY" => Ok(LinkType::IsDuplicatedBy),
            "RELATES_TO" => Ok(LinkType::RelatesTo),
            other => Err(UnknownLinkType(other.to_string())),
        }
    }
}

/// Stored link row.
///
/// One logical relationship is always persisted as a pair: the row as created
/// by the caller plus its [`TaskLink::mirror`]. Rows are never updated in
/// place; a relationship change is a delete followed by a create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskLink {
    /// Unique link identifier (UUID)
    pub id: String,

    /// Project scope; both endpoints must belong to this project
    pub project_id: String,

    /// Edge source task
    pub source_task_id: String,

    /// Edge target task
    pub target_task_id: String,

    /// Relationship type as seen from the source
    pub link_type: LinkType,

    /// Creation timestamp (shared by a row and its mirror)
    pub created_at: DateTime<Utc>,
}

impl TaskLink {
    /// Create a new link row with an auto-generated UUID.
    pub fn new(
        project_id: impl Into<String>,
        source_task_id: impl Into<String>,
        target_task_id: impl Into<String>,
        link_type: LinkType,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            source_task_id: source_task_id.into(),
            target_task_id: target_task_id.into(),
            link_type,
            created_at: Utc::now(),
        }
    }

    /// Build the mirror row: endpoints swapped, type inverted, own UUID,
    /// same creation timestamp.
    pub fn mirror(&self) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id: self.project_id.clone(),
            source_task_id: self.target_task_id.clone(),
            target_task_id: self.source_task_id.clone(),
            link_type: self.link_type.inverse(),
            created_at: self.created_at,
        }
    }

    /// Whether this stored row encodes the same logical relationship as a
    /// requested `(source, target, link_type)` triple.
    ///
    /// Canonical equivalence is the 3-way check: a stored row is equivalent
    /// if it matches the request exactly, matches with the type inverted, or
    /// matches with both direction and type inverted (i.e. it is the mirror
    /// of the request). For the self-inverse `RELATES_TO` the mirrored form
    /// collapses onto the direction-swapped same-type row, which makes the
    /// symmetric duplicate a rejection as well.
    pub fn encodes_same_relationship(
        &self,
        source_task_id: &str,
        target_task_id: &str,
        link_type: LinkType,
    ) -> bool {
        let inverse = link_type.inverse();
        let forward = self.source_task_id == source_task_id && self.target_task_id == target_task_id;
        let swapped = self.source_task_id == target_task_id && self.target_task_id == source_task_id;

        (forward && (self.link_type == link_type || self.link_type == inverse))
            || (swapped && self.link_type == inverse)
    }
}

/// Link row hydrated with endpoint task projections for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkWithTasks {
    /// The stored link row, as oriented from the queried task
    pub link: TaskLink,

    /// Projection of the source endpoint
    pub source_task: TaskSummary,

    /// Projection of the target endpoint
    pub target_task: TaskSummary,
}

/// Page of links touching a task, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskLinkPage {
    /// Rows where the queried task is either endpoint
    pub links: Vec<TaskLink>,

    /// Total row count (equals `links.len()`; kept for list-response parity)
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_is_involution() {
        for link_type in LinkType::ALL {
            assert_eq!(link_type.inverse().inverse(), link_type);
        }
    }

    #[test]
    fn test_inverse_table() {
        assert_eq!(LinkType::Blocks.inverse(), LinkType::IsBlockedBy);
        assert_eq!(LinkType::SplitsTo.inverse(), LinkType::SplitsFrom);
        assert_eq!(LinkType::Duplicates.inverse(), LinkType::IsDuplicatedBy);
        assert_eq!(LinkType::RelatesTo.inverse(), LinkType::RelatesTo);
    }

    #[test]
    fn test_only_relates_to_is_symmetric() {
        for link_type in LinkType::ALL {
            assert_eq!(
                link_type.is_symmetric(),
                link_type == LinkType::RelatesTo,
                "unexpected symmetry for {link_type}"
            );
        }
    }

    #[test]
    fn test_round_trip_through_column_form() {
        for link_type in LinkType::ALL {
            let parsed: LinkType = link_type.as_str().parse().unwrap();
            assert_eq!(parsed, link_type);
        }
        assert!("BLOCKED".parse::<LinkType>().is_err());
    }

    #[test]
    fn test_serde_uses_screaming_snake_case() {
        let json = serde_json::to_value(LinkType::IsDuplicatedBy).unwrap();
        assert_eq!(json, "IS_DUPLICATED_BY");
        let back: LinkType = serde_json::from_value(json).unwrap();
        assert_eq!(back, LinkType::IsDuplicatedBy);
    }

    #[test]
    fn test_mirror_swaps_endpoints_and_inverts_type() {
        let link = TaskLink::new("p1", "a", "b", LinkType::Blocks);
        let mirror = link.mirror();
        assert_eq!(mirror.source_task_id, "b");
        assert_eq!(mirror.target_task_id, "a");
        assert_eq!(mirror.link_type, LinkType::IsBlockedBy);
        assert_eq!(mirror.created_at, link.created_at);
        assert_ne!(mirror.id, link.id);
    }

    #[test]
    fn test_equivalence_covers_all_three_encodings() {
        let stored = TaskLink::new("p1", "a", "b", LinkType::Blocks);

        // Exact request, inverse-typed same direction, and the mirror form
        // are all the same logical relationship.
        assert!(stored.encodes_same_relationship("a", "b", LinkType::Blocks));
        assert!(stored.encodes_same_relationship("a", "b", LinkType::IsBlockedBy));
        assert!(stored.encodes_same_relationship("b", "a", LinkType::IsBlockedBy));

        // Swapped direction with the *same* asymmetric type does not match
        // this row; at the pair level it is still rejected, because the
        // stored mirror row (b, a, IS_BLOCKED_BY) matches its inverse form.
        assert!(!stored.encodes_same_relationship("b", "a", LinkType::Blocks));
        assert!(stored
            .mirror()
            .encodes_same_relationship("b", "a", LinkType::Blocks));

        // Unrelated type or endpoints never match.
        assert!(!stored.encodes_same_relationship("a", "b", LinkType::RelatesTo));
        assert!(!stored.encodes_same_relationship("a", "c", LinkType::Blocks));
    }

    #[test]
    fn test_equivalence_symmetric_type() {
        let stored = TaskLink::new("p1", "a", "b", LinkType::RelatesTo);

        // RELATES_TO is self-inverse, so both directions are duplicates.
        assert!(stored.encodes_same_relationship("a", "b", LinkType::RelatesTo));
        assert!(stored.encodes_same_relationship("b", "a", LinkType::RelatesTo));
        assert!(!stored.encodes_same_relationship("a", "b", LinkType::Blocks));
    }

    #[test]
    fn test_equivalence_exhaustive_over_types() {
        // Once a relationship is stored as a mirrored pair, every request
        // over the same unordered pair within the same type family (the type
        // or its inverse, either direction) must hit at least one of the two
        // stored rows. This is what makes the row-level 3-way check behave
        // as the pair-level 4-way relation.
        for link_type in LinkType::ALL {
            let stored = TaskLink::new("p1", "a", "b", link_type);
            let mirror = stored.mirror();

            let duplicate_requests = [
                ("a", "b", link_type),
                ("a", "b", link_type.inverse()),
                ("b", "a", link_type.inverse()),
                ("b", "a", link_type),
            ];
            for (s, t, ty) in duplicate_requests {
                let hit = stored.encodes_same_relationship(s, t, ty)
                    || mirror.encodes_same_relationship(s, t, ty);
                assert!(hit, "type={link_type} request=({s},{t},{ty})");
            }

            // A different type family over the same pair is never equivalent.
            let other = if link_type.is_blocking() {
                LinkType::SplitsTo
            } else {
                LinkType::Blocks
            };
            assert!(!stored.encodes_same_relationship("a", "b", other));
            assert!(!mirror.encodes_same_relationship("a", "b", other));
        }
    }
}
