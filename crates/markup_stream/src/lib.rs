//! Streaming markup-to-tree builder.
//!
//! Markup arrives in arbitrary chunks; complete tokens are applied to an arena
//! tree immediately, and the tree can be serialized at any point. Open
//! elements serialize without a closing tag, so successive serializations of
//! the same node only ever grow by appending.
//!
//! ```
//! use markup_stream::{HtmlStream, StreamConfig};
//!
//! let mut stream = HtmlStream::new(StreamConfig::default(), ());
//! stream.begin_stream()?;
//! stream.write_chunk("<p class=\"intro\">Hello, wo")?;
//! assert_eq!(stream.current_serialization(), "<p class=\"intro\">Hello, wo");
//! stream.write_chunk("rld</p>")?;
//! stream.end_stream()?;
//! assert_eq!(stream.current_serialization(), "<p class=\"intro\">Hello, world</p>");
//! # Ok::<(), markup_stream::StreamError>(())
//! ```

pub mod debug;
pub mod delegate;
pub mod error;
pub mod stream;
pub mod tokenizer;
pub mod tree;
pub mod tree_builder;

mod entities;
mod types;

pub use delegate::{EventLog, TreeDelegate, TreeEvent};
pub use error::{StreamError, TreeError};
pub use stream::{HtmlStream, StreamConfig};
pub use tokenizer::{StreamTokenizer, TokenSink, Tokenizer, TokenizerConfig, TokenizerStats};
pub use tree::{Descendants, NodeData, NodeKind, Tree};
pub use tree_builder::{
    BuilderCounters, CloseTagRecovery, Diagnostic, TreeBuilder, TreeBuilderConfig,
};
pub use types::{Attributes, NodeId, NodeState};
