//! Observer hooks fired by the tree builder.
//!
//! Every hook has a no-op default, so an observer only implements the events
//! it cares about. Hooks receive a read-only view of the tree; they cannot
//! mutate it and must not assume anything outlives the builder.

use crate::tree::Tree;
use crate::types::NodeId;

pub trait TreeDelegate {
    /// A new stream began; `tree` holds only the root.
    fn on_start(&mut self, _tree: &Tree) {}

    /// `node` was created and became the cursor.
    fn on_push_node(&mut self, _tree: &Tree, _node: NodeId) {}

    /// `node` was closed and the cursor moved back to its parent.
    fn on_pop_node(&mut self, _tree: &Tree, _node: NodeId) {}

    /// The stream ended; trailing text has been closed.
    fn on_end(&mut self, _tree: &Tree) {}
}

/// No-op delegate.
impl TreeDelegate for () {}

/// Lets a builder borrow a delegate owned elsewhere.
impl<D: TreeDelegate + ?Sized> TreeDelegate for &mut D {
    fn on_start(&mut self, tree: &Tree) {
        (**self).on_start(tree);
    }

    fn on_push_node(&mut self, tree: &Tree, node: NodeId) {
        (**self).on_push_node(tree, node);
    }

    fn on_pop_node(&mut self, tree: &Tree, node: NodeId) {
        (**self).on_pop_node(tree, node);
    }

    fn on_end(&mut self, tree: &Tree) {
        (**self).on_end(tree);
    }
}

impl<D: TreeDelegate + ?Sized> TreeDelegate for Box<D> {
    fn on_start(&mut self, tree: &Tree) {
        (**self).on_start(tree);
    }

    fn on_push_node(&mut self, tree: &Tree, node: NodeId) {
        (**self).on_push_node(tree, node);
    }

    fn on_pop_node(&mut self, tree: &Tree, node: NodeId) {
        (**self).on_pop_node(tree, node);
    }

    fn on_end(&mut self, tree: &Tree) {
        (**self).on_end(tree);
    }
}

/// Builder lifecycle event, as recorded by [`EventLog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeEvent {
    Start,
    Push(NodeId),
    Pop(NodeId),
    End,
}

/// Delegate that records every event in order.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<TreeEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[TreeEvent] {
        &self.events
    }

    pub fn take(&mut self) -> Vec<TreeEvent> {
        std::mem::take(&mut self.events)
    }

    /// Nodes popped so far, in pop order.
    pub fn popped(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.events.iter().filter_map(|event| match event {
            TreeEvent::Pop(id) => Some(*id),
            _ => None,
        })
    }
}

impl TreeDelegate for EventLog {
    fn on_start(&mut self, _tree: &Tree) {
        self.events.push(TreeEvent::Start);
    }

    fn on_push_node(&mut self, _tree: &Tree, node: NodeId) {
        self.events.push(TreeEvent::Push(node));
    }

    fn on_pop_node(&mut self, _tree: &Tree, node: NodeId) {
        self.events.push(TreeEvent::Pop(node));
    }

    fn on_end(&mut self, _tree: &Tree) {
        self.events.push(TreeEvent::End);
    }
}
