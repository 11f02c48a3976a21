//! Window hierarchy snapshots
//!
//! A snapshot is a tree of [`HierarchyNode`]s built fresh for every request.
//! `uiautomator` turns a raw `uiautomator dump` into that tree and
//! `serializer` turns the tree into the JSON document sent to clients.

pub mod serializer;
pub mod types;
pub mod uiautomator;

pub use serializer::{from_document, to_document};
pub use types::{Attributes, HierarchyNode};

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("Empty window hierarchy dump")]
    EmptyDump,

    #[error("Unexpected closing tag </{found}> (expected </{expected}>)")]
    MismatchedTag { expected: String, found: String },

    #[error("Unclosed tag <{0}>")]
    UnclosedTag(String),

    #[error("More than one root element")]
    MultipleRoots,

    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}
