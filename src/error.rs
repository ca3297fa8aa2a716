use thiserror::Error;

use crate::tree::NodeId;

/// Errors reported by [`GanttTree`](crate::GanttTree) mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The node is not (or no longer) part of the tree.
    #[error("node {0} is not in the tree")]
    UnknownNode(NodeId),
}

/// A date-like value that could not be turned into a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("empty date string")]
    Empty,
    #[error("unrecognized date format: {0:?}")]
    Unrecognized(String),
    #[error("timestamp is not a finite number")]
    NonFinite,
}
