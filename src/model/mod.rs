//! Core data model: resources, diffing tags, anchor points

mod anchor;
mod index;
mod resource;

pub use anchor::{AnchorPoint, AnchorSet};
pub use index::ResourceIndex;
pub use resource::{ArtifactTag, Resource, ResourceId, ResourceTag};

use thiserror::Error;

/// Errors raised while decomposing or indexing instance data
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no anchor point declared for class '{0}'")]
    MissingAnchor(String),

    #[error("root slot '{slot}' for class '{class}' is missing from the document")]
    MissingRootSlot { class: String, slot: String },

    #[error("root slot '{slot}' for class '{class}' is not a list")]
    RootSlotNotList { class: String, slot: String },

    #[error("instance of class '{class}' has no identifier in slot '{slot}'")]
    MissingIdentifier { class: String, slot: String },

    #[error("identifier in slot '{slot}' of class '{class}' is not a string")]
    NonStringIdentifier { class: String, slot: String },
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;
