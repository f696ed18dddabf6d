//! Tree builder: turns tokenizer events into tree mutations.
//!
//! The builder owns the tree and a cursor (the node currently receiving
//! children or text). Open-tag and text events push new nodes; close-tag and
//! end-of-stream events pop them. Nodes only close through a pop, so a closed
//! node is never the cursor.
//!
//! Malformed input is absorbed: a close tag that does not match the cursor is
//! reported as a [`Diagnostic`] and otherwise ignored (unless a recovery
//! policy is configured). Only handler bugs surface as [`TreeError`].

use crate::delegate::TreeDelegate;
use crate::error::TreeError;
use crate::tokenizer::TokenSink;
use crate::tree::{NodeData, Tree};
use crate::types::{Attributes, NodeId};

/// What to do with a close tag whose name does not match the cursor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CloseTagRecovery {
    /// Leave the cursor untouched and drop the event.
    #[default]
    Ignore,
    /// Close every open element up to and including the nearest ancestor with
    /// a matching name. Falls back to `Ignore` when no ancestor matches.
    CloseToMatchingAncestor,
}

#[derive(Clone, Debug, Default)]
pub struct TreeBuilderConfig {
    pub close_tag_recovery: CloseTagRecovery,
}

/// Non-fatal anomaly observed while building.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// Close tag ignored; `open` is the cursor's element name (`None` at root).
    MismatchedCloseTag { found: String, open: Option<String> },
    /// Close tag matched an ancestor; `closed` lists the elements closed on the
    /// way, innermost first, excluding the matched one.
    ImplicitlyClosed { found: String, closed: Vec<String> },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderCounters {
    pub elements_created: u64,
    pub texts_created: u64,
    pub texts_merged: u64,
    pub pops: u64,
    pub mismatched_close_tags: u64,
}

pub struct TreeBuilder<D = ()> {
    config: TreeBuilderConfig,
    tree: Tree,
    current: NodeId,
    delegate: D,
    counters: BuilderCounters,
    diagnostics: Vec<Diagnostic>,
}

impl<D: TreeDelegate> TreeBuilder<D> {
    pub fn new(config: TreeBuilderConfig, delegate: D) -> Self {
        let tree = Tree::new();
        let current = tree.root();
        Self {
            config,
            tree,
            current,
            delegate,
            counters: BuilderCounters::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Start a fresh tree: new root, cursor on root, counters cleared.
    pub fn begin(&mut self) {
        self.tree = Tree::new();
        self.current = self.tree.root();
        self.counters = BuilderCounters::default();
        self.diagnostics.clear();
        log::debug!(target: "markup_stream.tree_builder", "begin");
        self.delegate.on_start(&self.tree);
    }

    /// Notify the delegate that the stream is over. The root stays open.
    pub fn finish(&mut self) {
        log::debug!(
            target: "markup_stream.tree_builder",
            "finish: nodes={} counters={:?}",
            self.tree.node_count(),
            self.counters
        );
        self.delegate.on_end(&self.tree);
    }
}

impl<D> TreeBuilder<D> {
    pub fn config(&self) -> &TreeBuilderConfig {
        &self.config
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.delegate
    }

    pub fn into_delegate(self) -> D {
        self.delegate
    }

    pub fn counters(&self) -> BuilderCounters {
        self.counters
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Serialization of the whole tree so far.
    pub fn serialization(&self) -> String {
        self.tree.serialize(self.tree.root())
    }
}

impl<D: TreeDelegate> TreeBuilder<D> {
    fn current_node(&self) -> Result<&NodeData, TreeError> {
        self.tree
            .get(self.current)
            .ok_or(TreeError::UnknownNode(self.current))
    }

    fn push(&mut self, node: NodeId) {
        log::trace!(
            target: "markup_stream.tree_builder",
            "push {node} under {}",
            self.current
        );
        self.current = node;
        self.delegate.on_push_node(&self.tree, node);
    }

    /// Close the cursor and move it to its parent. Returns the closed node.
    fn pop(&mut self) -> Result<NodeId, TreeError> {
        let closing = self.current;
        let parent = self.tree.parent(closing).ok_or(TreeError::PopRoot)?;
        self.tree.mark_closed(closing)?;
        self.current = parent;
        self.counters.pops += 1;
        log::trace!(target: "markup_stream.tree_builder", "pop {closing} to {parent}");
        self.delegate.on_pop_node(&self.tree, closing);
        Ok(closing)
    }

    /// A tag boundary or end of stream terminates trailing text.
    fn close_open_text(&mut self) -> Result<(), TreeError> {
        let node = self.current_node()?;
        if node.is_text() && node.is_open() {
            self.pop()?;
        }
        Ok(())
    }

    fn handle_open_tag(&mut self, name: &str, attributes: Attributes) -> Result<(), TreeError> {
        self.close_open_text()?;
        let parent = self.current;
        let node = self.current_node()?;
        if node.is_text() {
            return Err(TreeError::NotContainer(parent));
        }
        if !node.is_open() {
            return Err(TreeError::ClosedNode(parent));
        }
        let element = self.tree.append_element(parent, name, attributes)?;
        self.counters.elements_created += 1;
        self.push(element);
        Ok(())
    }

    fn handle_text(&mut self, text: &str) -> Result<(), TreeError> {
        if text.is_empty() {
            return Ok(());
        }
        if self.current_node()?.is_text() {
            self.tree.append_text(self.current, text)?;
            self.counters.texts_merged += 1;
            return Ok(());
        }
        let node = self.tree.append_text_node(self.current, text)?;
        self.counters.texts_created += 1;
        self.push(node);
        Ok(())
    }

    fn handle_close_tag(&mut self, name: &str) -> Result<(), TreeError> {
        self.close_open_text()?;
        let open = self.current_node()?.name();
        if open == Some(name) {
            self.pop()?;
            return Ok(());
        }

        let open = open.map(str::to_string);
        self.counters.mismatched_close_tags += 1;
        if self.config.close_tag_recovery == CloseTagRecovery::CloseToMatchingAncestor
            && let Some(target) = self.find_open_ancestor(name)
        {
            let mut closed = Vec::new();
            while self.current != target {
                let node = self.pop()?;
                if let Some(element) = self.tree.get(node).and_then(NodeData::name) {
                    closed.push(element.to_string());
                }
            }
            self.pop()?;
            log::warn!(
                target: "markup_stream.tree_builder",
                "</{name}> closed {} unclosed element(s): {closed:?}",
                closed.len()
            );
            self.diagnostics.push(Diagnostic::ImplicitlyClosed {
                found: name.to_string(),
                closed,
            });
            return Ok(());
        }

        log::warn!(
            target: "markup_stream.tree_builder",
            "ignoring </{name}>: open element is {}",
            open.as_deref().unwrap_or("#root")
        );
        self.diagnostics.push(Diagnostic::MismatchedCloseTag {
            found: name.to_string(),
            open,
        });
        Ok(())
    }

    fn find_open_ancestor(&self, name: &str) -> Option<NodeId> {
        let mut cursor = Some(self.current);
        while let Some(id) = cursor {
            let node = self.tree.get(id)?;
            if node.name() == Some(name) {
                return Some(id);
            }
            cursor = node.parent();
        }
        None
    }

    fn handle_end_of_stream(&mut self) -> Result<(), TreeError> {
        self.close_open_text()
    }
}

impl<D: TreeDelegate> TokenSink for TreeBuilder<D> {
    type Error = TreeError;

    fn open_tag(&mut self, name: &str, attributes: Attributes) -> Result<(), TreeError> {
        self.handle_open_tag(name, attributes)
    }

    fn text(&mut self, text: &str) -> Result<(), TreeError> {
        self.handle_text(text)
    }

    fn close_tag(&mut self, name: &str) -> Result<(), TreeError> {
        self.handle_close_tag(name)
    }

    fn end_of_stream(&mut self) -> Result<(), TreeError> {
        self.handle_end_of_stream()
    }
}
