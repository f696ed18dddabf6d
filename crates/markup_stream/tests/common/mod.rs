#![allow(dead_code)]

use markup_stream::{HtmlStream, NodeData, NodeId, StreamConfig, Tree, TreeDelegate};

/// Records lifecycle counts and the flattened text of every top-level element
/// at the moment it is popped.
#[derive(Debug, Default)]
pub struct PopRecorder {
    pub starts: usize,
    pub ends: usize,
    pub pushes: usize,
    pub pops: usize,
    pub top_level: Vec<(String, String)>,
}

impl TreeDelegate for PopRecorder {
    fn on_start(&mut self, _tree: &Tree) {
        self.starts += 1;
    }

    fn on_push_node(&mut self, _tree: &Tree, _node: NodeId) {
        self.pushes += 1;
    }

    fn on_pop_node(&mut self, tree: &Tree, node: NodeId) {
        self.pops += 1;
        if tree.parent(node) == Some(tree.root())
            && let Some(name) = tree.get(node).and_then(NodeData::name)
        {
            self.top_level.push((name.to_string(), tree.text_content(node)));
        }
    }

    fn on_end(&mut self, _tree: &Tree) {
        self.ends += 1;
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct RunResult {
    pub serialization: String,
    pub outline: Vec<String>,
    pub diagnostics: usize,
    pub top_level: Vec<(String, String)>,
}

pub fn started(config: StreamConfig) -> HtmlStream<PopRecorder> {
    let mut stream = HtmlStream::new(config, PopRecorder::default());
    stream.begin_stream().unwrap();
    stream
}

fn finish(mut stream: HtmlStream<PopRecorder>) -> RunResult {
    stream.end_stream().unwrap();
    let tree = stream.tree();
    RunResult {
        serialization: stream.current_serialization(),
        outline: markup_stream::debug::outline(tree, tree.root(), usize::MAX),
        diagnostics: stream.diagnostics().len(),
        top_level: std::mem::take(&mut stream.delegate_mut().top_level),
    }
}

fn assert_prefix_growth(previous: &mut String, current: String, context: &str) {
    assert!(
        current.starts_with(previous.as_str()),
        "serialization shrank or was rewritten ({context})\n  before: {}\n   after: {}\n  diverged at byte {:?}",
        markup_test_support::escape_text(previous),
        markup_test_support::escape_text(&current),
        markup_test_support::first_divergence(previous, &current)
    );
    *previous = current;
}

/// Stream `chunks` through `write_chunk`, checking that every intermediate
/// serialization extends the previous one.
pub fn run_str_chunks(chunks: &[&str], config: StreamConfig) -> RunResult {
    let mut stream = started(config);
    let mut previous = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        stream.write_chunk(chunk).unwrap();
        assert_prefix_growth(
            &mut previous,
            stream.current_serialization(),
            &format!("after chunk {i}"),
        );
    }
    finish(stream)
}

pub fn run_byte_chunks(chunks: &[&[u8]], config: StreamConfig) -> RunResult {
    let mut stream = started(config);
    let mut previous = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        stream.write_bytes(chunk).unwrap();
        assert_prefix_growth(
            &mut previous,
            stream.current_serialization(),
            &format!("after byte chunk {i}"),
        );
    }
    finish(stream)
}

pub fn run_whole(input: &str, config: StreamConfig) -> RunResult {
    run_str_chunks(&[input], config)
}
