use std::fmt;

use serde::Serialize;

use crate::Grammar;

/// Something a grammar rewrite did, kept apart from how it is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum TransformEvent {
    /// Two alternatives of `non_terminal` shared `prefix`; their suffixes moved to `fresh`.
    Factored {
        non_terminal: String,
        prefix: Vec<String>,
        fresh: String,
    },
    /// Alternatives of `non_terminal` starting with `replaced` were expanded in place.
    Substituted {
        non_terminal: String,
        replaced: String,
    },
    /// Direct left recursion of `non_terminal` moved into `fresh`.
    DirectRecursionRemoved { non_terminal: String, fresh: String },
    /// An alternative `A -> A` was dropped.
    DroppedCycle { non_terminal: String },
}

impl fmt::Display for TransformEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformEvent::Factored {
                non_terminal,
                prefix,
                fresh,
            } => write!(
                f,
                "factored prefix `{}` of {} into {}",
                prefix.join(" "),
                non_terminal,
                fresh
            ),
            TransformEvent::Substituted {
                non_terminal,
                replaced,
            } => write!(f, "substituted {} into {}", replaced, non_terminal),
            TransformEvent::DirectRecursionRemoved {
                non_terminal,
                fresh,
            } => write!(
                f,
                "removed direct left recursion of {} via {}",
                non_terminal, fresh
            ),
            TransformEvent::DroppedCycle { non_terminal } => {
                write!(f, "dropped {} -> {}", non_terminal, non_terminal)
            }
        }
    }
}

/// Result of a grammar rewrite: a new grammar, whether anything changed, and what did.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub grammar: Grammar,
    pub changed: bool,
    pub events: Vec<TransformEvent>,
}
