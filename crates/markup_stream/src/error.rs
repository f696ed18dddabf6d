//! Error types for the tree and the stream driver.

use crate::types::NodeId;
use std::fmt;

/// Engine invariant violation: a bug in event handling, not bad markup.
///
/// Malformed markup never produces one of these; it is absorbed by the builder
/// and reported as a [`crate::Diagnostic`] instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    /// The handle does not belong to this tree.
    UnknownNode(NodeId),
    /// Content mutation attempted on a closed node.
    ClosedNode(NodeId),
    /// Text appended to something other than a text node.
    NotText(NodeId),
    /// Child appended to a text node.
    NotContainer(NodeId),
    /// `mark_closed` called twice on the same node.
    AlreadyClosed(NodeId),
    /// Pop attempted while the cursor is on the root.
    PopRoot,
    /// The node arena cannot hold another node.
    ArenaFull,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::UnknownNode(id) => write!(f, "node {id} does not belong to this tree"),
            TreeError::ClosedNode(id) => write!(f, "node {id} is closed and cannot be mutated"),
            TreeError::NotText(id) => write!(f, "node {id} is not a text node"),
            TreeError::NotContainer(id) => write!(f, "node {id} cannot have children"),
            TreeError::AlreadyClosed(id) => write!(f, "node {id} was already closed"),
            TreeError::PopRoot => f.write_str("cannot pop the root node"),
            TreeError::ArenaFull => f.write_str("node arena is full"),
        }
    }
}

impl std::error::Error for TreeError {}

/// Error returned by the stream driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamError {
    /// `begin_stream` called while a stream is already active.
    AlreadyStarted,
    /// Operation requires `begin_stream` first.
    NotStarted,
    /// The stream was ended or aborted.
    Closed,
    /// Tree invariant violated while handling an event.
    Invariant(TreeError),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::AlreadyStarted => f.write_str("stream already started"),
            StreamError::NotStarted => f.write_str("stream not started"),
            StreamError::Closed => f.write_str("stream is closed"),
            StreamError::Invariant(err) => write!(f, "tree invariant violated: {err}"),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Invariant(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TreeError> for StreamError {
    fn from(err: TreeError) -> Self {
        StreamError::Invariant(err)
    }
}
