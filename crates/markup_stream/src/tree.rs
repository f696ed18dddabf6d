//! Arena-backed node tree with as-is serialization.
//!
//! Serialization contract: an open element is written without its closing tag,
//! and content only ever grows by appending. Two serializations of the same node
//! taken at different times therefore form a prefix chain.

use crate::error::TreeError;
use crate::types::{Attributes, NodeId, NodeState};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// The root container. It has no tag representation and is never closed.
    Document { children: Vec<NodeId> },
    Element {
        name: String,
        attributes: Attributes,
        children: Vec<NodeId>,
    },
    Text { text: String },
}

#[derive(Clone, Debug)]
pub struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    state: NodeState,
}

impl NodeData {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == NodeState::Open
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text { .. })
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    /// Tag name for elements, `None` for the root and text nodes.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        match &self.kind {
            NodeKind::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Document { children } | NodeKind::Element { children, .. } => children,
            NodeKind::Text { .. } => &[],
        }
    }
}

/// Node arena. Index 0 is always the root.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<NodeData>,
    node_limit: usize,
}

/// Node ids are `u32`.
const MAX_NODES: usize = u32::MAX as usize;

impl Tree {
    pub(crate) fn new() -> Self {
        Self::with_node_limit(MAX_NODES)
    }

    pub(crate) fn with_node_limit(node_limit: usize) -> Self {
        Self {
            node_limit: node_limit.min(MAX_NODES),
            nodes: vec![NodeData {
                kind: NodeKind::Document {
                    children: Vec::new(),
                },
                parent: None,
                state: NodeState::Open,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(NodeData::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(NodeData::children).unwrap_or(&[])
    }

    pub fn state(&self, id: NodeId) -> Option<NodeState> {
        self.get(id).map(NodeData::state)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, TreeError> {
        self.nodes
            .get_mut(id.index())
            .ok_or(TreeError::UnknownNode(id))
    }

    fn add_child(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId, TreeError> {
        if self.nodes.len() >= self.node_limit {
            return Err(TreeError::ArenaFull);
        }
        let child = NodeId::from_index(self.nodes.len());
        let parent_node = self.node_mut(parent)?;
        if parent_node.state == NodeState::Closed {
            return Err(TreeError::ClosedNode(parent));
        }
        match &mut parent_node.kind {
            NodeKind::Document { children } | NodeKind::Element { children, .. } => {
                children.push(child);
            }
            NodeKind::Text { .. } => return Err(TreeError::NotContainer(parent)),
        }
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            state: NodeState::Open,
        });
        Ok(child)
    }

    pub(crate) fn append_element(
        &mut self,
        parent: NodeId,
        name: &str,
        attributes: Attributes,
    ) -> Result<NodeId, TreeError> {
        self.add_child(
            parent,
            NodeKind::Element {
                name: name.to_string(),
                attributes,
                children: Vec::new(),
            },
        )
    }

    pub(crate) fn append_text_node(
        &mut self,
        parent: NodeId,
        text: &str,
    ) -> Result<NodeId, TreeError> {
        self.add_child(
            parent,
            NodeKind::Text {
                text: text.to_string(),
            },
        )
    }

    /// Append to the buffer of an open text node.
    pub(crate) fn append_text(&mut self, id: NodeId, s: &str) -> Result<(), TreeError> {
        let node = self.node_mut(id)?;
        let NodeKind::Text { text } = &mut node.kind else {
            return Err(TreeError::NotText(id));
        };
        if node.state == NodeState::Closed {
            return Err(TreeError::ClosedNode(id));
        }
        text.push_str(s);
        Ok(())
    }

    pub(crate) fn mark_closed(&mut self, id: NodeId) -> Result<(), TreeError> {
        let node = self.node_mut(id)?;
        if node.state == NodeState::Closed {
            return Err(TreeError::AlreadyClosed(id));
        }
        node.state = NodeState::Closed;
        Ok(())
    }

    /// Serialize the current content of `id`.
    ///
    /// Unknown handles serialize to the empty string.
    pub fn serialize(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.serialize_into(id, &mut out);
        out
    }

    /// Append the serialization of `id` to `out`.
    ///
    /// Iterative so that deeply nested input cannot exhaust the call stack.
    pub fn serialize_into(&self, id: NodeId, out: &mut String) {
        enum Step {
            Enter(NodeId),
            Exit(NodeId),
        }

        let mut stack = vec![Step::Enter(id)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(node_id) => {
                    let Some(node) = self.get(node_id) else {
                        continue;
                    };
                    match &node.kind {
                        NodeKind::Text { text } => out.push_str(text),
                        NodeKind::Document { .. } => {}
                        NodeKind::Element {
                            name, attributes, ..
                        } => {
                            push_start_tag(out, name, attributes);
                            // The closing tag is only ever written for closed
                            // elements; never fabricated for open ones.
                            if node.state == NodeState::Closed {
                                stack.push(Step::Exit(node_id));
                            }
                        }
                    }
                    for &child in node.children().iter().rev() {
                        stack.push(Step::Enter(child));
                    }
                }
                Step::Exit(node_id) => {
                    if let Some(name) = self.get(node_id).and_then(NodeData::name) {
                        out.push_str("</");
                        out.push_str(name);
                        out.push('>');
                    }
                }
            }
        }
    }

    /// Concatenated text of all descendant text nodes, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node_id in self.descendants(id) {
            if let Some(text) = self.get(node_id).and_then(NodeData::text) {
                out.push_str(text);
            }
        }
        out
    }

    /// Pre-order traversal starting at (and including) `id`.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = if self.get(id).is_some() {
            vec![id]
        } else {
            Vec::new()
        };
        Descendants { tree: self, stack }
    }
}

fn push_start_tag(out: &mut String, name: &str, attributes: &Attributes) {
    out.push('<');
    out.push_str(name);
    for (key, value) in attributes.iter() {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        push_attribute_value(out, value);
        out.push('"');
    }
    out.push('>');
}

fn push_attribute_value(out: &mut String, value: &str) {
    let mut rest = value;
    while let Some(idx) = rest.find('"') {
        out.push_str(&rest[..idx]);
        out.push_str("&quot;");
        rest = &rest[idx + 1..];
    }
    out.push_str(rest);
}

pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
