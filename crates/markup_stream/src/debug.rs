use crate::tree::{NodeKind, Tree};
use crate::types::NodeId;
use std::fmt::Write;

const INDENT_STEP: &str = "  ";
const PREVIEW_CHARS: usize = 40;

/// Indented one-line-per-node dump of the subtree at `node`, at most `cap`
/// lines. Open nodes are marked with `…` so a partially streamed tree is easy
/// to tell apart from a finished one.
pub fn outline(tree: &Tree, node: NodeId, cap: usize) -> Vec<String> {
    fn push_preview(out: &mut String, s: &str) {
        for (i, ch) in s.chars().enumerate() {
            if i == PREVIEW_CHARS {
                out.push('…');
                break;
            }
            out.push(if ch == '\n' { ' ' } else { ch });
        }
    }

    let mut out = Vec::new();
    let mut stack = vec![(node, 0usize)];
    while let Some((id, depth)) = stack.pop() {
        if out.len() == cap {
            break;
        }
        let Some(data) = tree.get(id) else {
            continue;
        };
        let mut line = INDENT_STEP.repeat(depth);
        match data.kind() {
            NodeKind::Document { .. } => line.push_str("#document"),
            NodeKind::Element {
                name, attributes, ..
            } => {
                line.push('<');
                line.push_str(name);
                for (key, value) in attributes.iter() {
                    let _ = write!(&mut line, r#" {key}="{value}""#);
                }
                line.push('>');
                if data.is_open() {
                    line.push_str(" …");
                }
            }
            NodeKind::Text { text } => {
                line.push('"');
                push_preview(&mut line, text);
                line.push('"');
                if data.is_open() {
                    line.push_str(" …");
                }
            }
        }
        out.push(line);
        for &child in data.children().iter().rev() {
            stack.push((child, depth + 1));
        }
    }
    out
}
