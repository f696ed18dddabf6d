//! Public streaming surface: begin / write / end / abort.
//!
//! `HtmlStream` owns the tree builder and, while a stream is active, a
//! tokenizer. Every write runs the tokenizer to completion against the
//! builder, so the tree reflects all complete tokens when the call returns.

use crate::delegate::TreeDelegate;
use crate::error::{StreamError, TreeError};
use crate::tokenizer::{StreamTokenizer, Tokenizer, TokenizerConfig};
use crate::tree::Tree;
use crate::tree_builder::{Diagnostic, TreeBuilder, TreeBuilderConfig};
use tools::utf8::Utf8Decoder;

#[derive(Clone, Debug, Default)]
pub struct StreamConfig {
    pub tokenizer: TokenizerConfig,
    pub builder: TreeBuilderConfig,
}

#[derive(Debug)]
enum Phase<T> {
    Idle,
    Streaming(T),
    Ended,
    Aborted,
}

impl<T> Phase<T> {
    fn active(&mut self) -> Result<&mut T, StreamError> {
        match self {
            Phase::Streaming(tokenizer) => Ok(tokenizer),
            Phase::Idle => Err(StreamError::NotStarted),
            Phase::Ended | Phase::Aborted => Err(StreamError::Closed),
        }
    }
}

pub struct HtmlStream<D = (), T = StreamTokenizer> {
    builder: TreeBuilder<D>,
    /// Cloned into a fresh tokenizer on every `begin_stream`.
    template: T,
    phase: Phase<T>,
    utf8: Utf8Decoder,
}

impl<D: TreeDelegate> HtmlStream<D> {
    pub fn new(config: StreamConfig, delegate: D) -> Self {
        Self::with_tokenizer(
            config.builder,
            delegate,
            StreamTokenizer::new(config.tokenizer),
        )
    }
}

impl Default for HtmlStream {
    fn default() -> Self {
        Self::new(StreamConfig::default(), ())
    }
}

impl<D: TreeDelegate, T: Tokenizer + Clone> HtmlStream<D, T> {
    pub fn with_tokenizer(builder_config: TreeBuilderConfig, delegate: D, tokenizer: T) -> Self {
        Self {
            builder: TreeBuilder::new(builder_config, delegate),
            template: tokenizer,
            phase: Phase::Idle,
            utf8: Utf8Decoder::new(),
        }
    }

    /// Start a new document. The previous tree (if any) is discarded.
    pub fn begin_stream(&mut self) -> Result<(), StreamError> {
        if matches!(self.phase, Phase::Streaming(_)) {
            return Err(StreamError::AlreadyStarted);
        }
        log::debug!(target: "markup_stream.stream", "begin stream");
        self.utf8 = Utf8Decoder::new();
        self.phase = Phase::Streaming(self.template.clone());
        self.builder.begin();
        Ok(())
    }

    /// Feed a chunk of markup. All complete tokens are applied before return;
    /// a trailing partial token is buffered for the next call.
    pub fn write_chunk(&mut self, chunk: &str) -> Result<(), StreamError> {
        let tokenizer = self.phase.active()?;
        log::trace!(target: "markup_stream.stream", "write_chunk len={}", chunk.len());
        let mut result = Ok(());
        if self.utf8.pending() > 0 {
            // A byte write left half a character behind; it can no longer
            // complete, so flush it as U+FFFD ahead of the text.
            let mut flushed = String::new();
            self.utf8.finish(&mut flushed);
            result = tokenizer.write(&flushed, &mut self.builder);
        }
        if result.is_ok() {
            result = tokenizer.write(chunk, &mut self.builder);
        }
        self.settle(result)
    }

    /// Feed raw UTF-8 bytes. Characters split across calls are reassembled;
    /// invalid sequences become U+FFFD.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        let tokenizer = self.phase.active()?;
        log::trace!(target: "markup_stream.stream", "write_bytes len={}", bytes.len());
        let mut text = String::with_capacity(bytes.len());
        self.utf8.push(bytes, &mut text);
        if text.is_empty() {
            return Ok(());
        }
        let result = tokenizer.write(&text, &mut self.builder);
        self.settle(result)
    }

    /// Flush the tokenizer, close trailing text and notify `on_end`.
    /// The root stays open and the tree remains readable.
    pub fn end_stream(&mut self) -> Result<(), StreamError> {
        self.phase.active()?;
        let Phase::Streaming(mut tokenizer) = std::mem::replace(&mut self.phase, Phase::Ended)
        else {
            return Err(StreamError::NotStarted);
        };

        let mut tail = String::new();
        self.utf8.finish(&mut tail);
        let mut result = Ok(());
        if !tail.is_empty() {
            result = tokenizer.write(&tail, &mut self.builder);
        }
        if result.is_ok() {
            result = tokenizer.end(&mut self.builder);
        }
        if let Err(err) = result {
            return Err(self.fail(err.into()));
        }

        log::debug!(
            target: "markup_stream.stream",
            "end stream: nodes={} diagnostics={}",
            self.builder.tree().node_count(),
            self.builder.diagnostics().len()
        );
        self.builder.finish();
        Ok(())
    }

    /// Drop the tokenizer without finishing the document. Later writes fail
    /// with [`StreamError::Closed`] until `begin_stream` is called again.
    pub fn abort(&mut self) {
        if matches!(self.phase, Phase::Streaming(_)) {
            log::debug!(target: "markup_stream.stream", "abort");
        }
        self.phase = Phase::Aborted;
        self.utf8 = Utf8Decoder::new();
    }

    pub fn shutdown(&mut self) {
        self.abort();
    }

    fn settle(&mut self, result: Result<(), TreeError>) -> Result<(), StreamError> {
        result.map_err(|err| self.fail(err.into()))
    }

    /// A tree invariant broke; the stream cannot continue.
    fn fail(&mut self, err: StreamError) -> StreamError {
        log::error!(target: "markup_stream.stream", "aborting stream: {err}");
        self.phase = Phase::Aborted;
        err
    }
}

impl<D, T> HtmlStream<D, T> {
    /// Serialization of the whole document so far. Open elements have no
    /// closing tag, so successive results form a prefix chain.
    pub fn current_serialization(&self) -> String {
        let tree = self.builder.tree();
        tree.serialize(tree.root())
    }

    pub fn tree(&self) -> &Tree {
        self.builder.tree()
    }

    pub fn builder(&self) -> &TreeBuilder<D> {
        &self.builder
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.builder.diagnostics()
    }

    pub fn delegate(&self) -> &D {
        self.builder.delegate()
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        self.builder.delegate_mut()
    }

    pub fn into_delegate(self) -> D {
        self.builder.into_delegate()
    }

    /// Tokenizer of the active stream.
    pub fn tokenizer(&self) -> Option<&T> {
        match &self.phase {
            Phase::Streaming(tokenizer) => Some(tokenizer),
            _ => None,
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.phase, Phase::Streaming(_))
    }
}
