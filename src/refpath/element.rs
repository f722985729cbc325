//! Single-hop path elements

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the relationship holds the id references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathElementKind {
    /// The source holds a slot naming target ids: `A(slot)>B`
    Active,
    /// The target holds a slot naming the source id: `A<(slot)B`
    Passive,
}

/// One hop of a reference path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathElement {
    pub kind: PathElementKind,
    pub source: String,
    pub slot: String,
    pub target: String,
}

impl PathElement {
    pub fn active(
        source: impl Into<String>,
        slot: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            kind: PathElementKind::Active,
            source: source.into(),
            slot: slot.into(),
            target: target.into(),
        }
    }

    pub fn passive(
        source: impl Into<String>,
        slot: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            kind: PathElementKind::Passive,
            source: source.into(),
            slot: slot.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PathElementKind::Active => {
                write!(f, "{}({})>{}", self.source, self.slot, self.target)
            }
            PathElementKind::Passive => {
                write!(f, "{}<({}){}", self.source, self.slot, self.target)
            }
        }
    }
}
