//! Reason-Code Message Catalog
//!
//! The graph core only ever produces stable machine reason codes; turning a
//! code into user-facing text is the presentation layer's job. This module
//! defines that seam as a trait plus the built-in English catalog, so the
//! transport layer can plug in its own localization backend without the core
//! knowing about locales beyond a string tag.

use std::collections::HashMap;

use crate::validation::reason;

/// Translates a stable reason code into a localized message.
///
/// `args` carries code-specific interpolation values (task ids, caps);
/// unknown codes must fall back to something displayable rather than
/// failing, since a stale client may see codes added after it shipped.
pub trait MessageCatalog: Send + Sync {
    fn translate(&self, code: &str, args: &HashMap<String, String>, locale: &str) -> String;
}

/// Built-in English catalog covering every code the core emits.
pub struct EnglishCatalog;

impl EnglishCatalog {
    fn arg<'a>(args: &'a HashMap<String, String>, key: &str) -> &'a str {
        args.get(key).map(String::as_str).unwrap_or("?")
    }
}

impl MessageCatalog for EnglishCatalog {
    fn translate(&self, code: &str, args: &HashMap<String, String>, _locale: &str) -> String {
        match code {
            reason::TASK_NOT_FOUND => {
                format!("Task {} was not found in this project", Self::arg(args, "taskId"))
            }
            reason::LINK_NOT_FOUND => "The task link was not found".to_string(),
            reason::LINK_ALREADY_EXISTS => {
                "These tasks are already linked by an equivalent relationship".to_string()
            }
            reason::LINK_LIMIT_REACHED => format!(
                "Task {} has reached the maximum of {} links",
                Self::arg(args, "taskId"),
                Self::arg(args, "cap")
            ),
            reason::LINK_CROSS_PROJECT => {
                "Tasks can only be linked within the same project".to_string()
            }
            reason::LINK_SELF => "A task cannot be linked to itself".to_string(),
            reason::LINK_CIRCULAR => {
                "This link would create a circular blocking dependency".to_string()
            }
            reason::LINK_HIERARCHY_CONFLICT => {
                "These tasks already hold a parent/child relationship".to_string()
            }
            reason::LINK_DUPLICATE_TARGET => {
                "This task already duplicates another task".to_string()
            }
            reason::LINK_PAIR_TAKEN => "These tasks are already related".to_string(),
            reason::HIERARCHY_SELF => "A task cannot be its own parent".to_string(),
            reason::HIERARCHY_MULTIPLE_PARENTS => {
                "This task already has a parent".to_string()
            }
            reason::HIERARCHY_CIRCULAR => {
                "This edge would create a circular hierarchy".to_string()
            }
            reason::HIERARCHY_DEPTH => format!(
                "The hierarchy cannot be deeper than {} levels",
                Self::arg(args, "maxDepth")
            ),
            reason::HIERARCHY_LINK_CONFLICT => {
                "These tasks already hold a link that conflicts with a parent/child relationship"
                    .to_string()
            }
            reason::HIERARCHY_NOT_FOUND => "The hierarchy relationship was not found".to_string(),
            // Unknown code: show it verbatim rather than failing.
            other => other.to_string(),
        }
    }
}
