//! Reference path language: parsing and resolution
//!
//! A reference path describes a multi-hop relationship between schema
//! classes, e.g. `Experiment(samples)>Sample<(files)File`. Each hop is
//! traversed forward (the source holds the ids, `(slot)>`) or backward
//! (the target holds the ids, `<(slot)`).

mod element;
mod parse;
mod resolve;

pub use element::{PathElement, PathElementKind};
pub use parse::ReferencePath;
pub use resolve::{resolve, EmptyMatchPolicy};

use crate::model::ModelError;
use thiserror::Error;

/// Errors raised while parsing or resolving reference paths
#[derive(Debug, Error)]
pub enum PathError {
    #[error("invalid character '{found}' in path '{path}'")]
    InvalidCharacter { path: String, found: char },

    #[error("path '{path}' does not match the path grammar: {reason}")]
    Format { path: String, reason: String },

    #[error("malformed path element at '{fragment}': {reason}")]
    Element { fragment: String, reason: String },

    #[error("cannot read foreign ids from slot '{slot}' of {class} '{id}': {reason}")]
    ForeignIdLookup {
        class: String,
        slot: String,
        id: String,
        reason: String,
    },

    #[error("reference to '{id}' cannot be resolved to an instance of '{class}'")]
    Resolution { class: String, id: String },

    #[error("path element '{element}' matched no instances")]
    NoMatches { element: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result type for path operations
pub type PathResult<T> = Result<T, PathError>;
