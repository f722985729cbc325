//! Built-in transformations
//!
//! One file per transformation kind, each implementing the four-part
//! contract from [`crate::pipeline::Transformation`].

mod aggregate;
mod delete_slots;
mod infer_references;

pub use aggregate::AggregateTransformation;
pub use delete_slots::DeleteSlots;
pub use infer_references::InferReferences;
