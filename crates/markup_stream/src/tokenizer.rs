//! Tokenizer collaborator interface and a chunk-resumable reference tokenizer.
//!
//! Supported tag-name characters (ASCII only): `[A-Za-z0-9:_-]`, starting with
//! a letter. Attribute names use the same class. Tag and attribute names are
//! ASCII-lowercased.
//!
//! This is not an HTML5 tokenizer: there is no rawtext handling for
//! `script`/`style`, and comments, doctypes and processing instructions are
//! consumed without emitting events.
//!
//! Invariant (chunk equivalence): feeding input in one chunk or many yields the
//! same event sequence once adjacent text events are merged.

use crate::entities::{decode_entities, incomplete_reference_len};
use crate::types::Attributes;
use memchr::{memchr, memmem};

/// Receiver of tokenizer events. Events arrive in document order.
pub trait TokenSink {
    type Error;

    fn open_tag(&mut self, name: &str, attributes: Attributes) -> Result<(), Self::Error>;

    /// Already entity-decoded text.
    fn text(&mut self, text: &str) -> Result<(), Self::Error>;

    fn close_tag(&mut self, name: &str) -> Result<(), Self::Error>;

    fn end_of_stream(&mut self) -> Result<(), Self::Error>;
}

/// A tokenizer that accepts arbitrarily split chunks of markup.
///
/// `write` invokes the sink synchronously for every complete token and buffers
/// any trailing partial token. `end` flushes what is left and then calls
/// [`TokenSink::end_of_stream`].
pub trait Tokenizer {
    fn write<S: TokenSink>(&mut self, chunk: &str, sink: &mut S) -> Result<(), S::Error>;

    fn end<S: TokenSink>(&mut self, sink: &mut S) -> Result<(), S::Error>;
}

#[derive(Clone, Debug)]
pub struct TokenizerConfig {
    /// Decode character references in text and attribute values.
    pub decode_entities: bool,
    /// Emit a close event right after the open event of void elements
    /// (`br`, `img`, ...), as if they were written `<br/>`.
    pub self_close_void_elements: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            decode_entities: true,
            self_close_void_elements: true,
        }
    }
}

/// Minimal tokenizer instrumentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenizerStats {
    pub chunks: u64,
    pub bytes_consumed: u64,
    pub events_emitted: u64,
    pub markup_skipped: u64,
    /// Writes that left stalled markup unscanned because no terminator arrived.
    pub stalled_writes: u64,
}

#[derive(Clone, Debug, Default)]
pub struct StreamTokenizer {
    config: TokenizerConfig,
    pending: String,
    /// Length of `pending` when the markup at its head last lexed as
    /// incomplete; 0 when nothing is stalled.
    stalled: usize,
    ended: bool,
    stats: TokenizerStats,
}

impl StreamTokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        Self {
            config,
            pending: String::new(),
            stalled: 0,
            ended: false,
            stats: TokenizerStats::default(),
        }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    pub fn stats(&self) -> TokenizerStats {
        self.stats
    }

    /// Bytes buffered while waiting for the rest of a token.
    pub fn buffered(&self) -> &str {
        &self.pending
    }

    /// Whether the stalled markup at the head of `pending` is still unable to
    /// complete. Every incomplete tag, declaration or comment longer than its
    /// `<` needs a terminator beyond what was already scanned.
    fn still_stalled(&self) -> bool {
        const COMMENT_START: &str = "<!--";
        if self.stalled < 2 {
            return false;
        }
        let bytes = self.pending.as_bytes();
        if self.pending.starts_with(COMMENT_START) {
            let from = self.stalled.saturating_sub(2).max(COMMENT_START.len());
            return memmem::find(&bytes[from..], b"-->").is_none();
        }
        memchr(b'>', &bytes[self.stalled..]).is_none()
    }

    fn pump<S: TokenSink>(&mut self, sink: &mut S, at_eof: bool) -> Result<(), S::Error> {
        if !at_eof && self.still_stalled() {
            self.stats.stalled_writes += 1;
            self.stalled = self.pending.len();
            return Ok(());
        }
        let mut pos = 0;
        let mut scanner = Scanner {
            input: &self.pending,
            config: &self.config,
            stats: &mut self.stats,
            at_eof,
        };
        let result = scanner.run(&mut pos, sink);
        self.stats.bytes_consumed += pos as u64;
        self.pending.drain(..pos);
        self.stalled = if result.is_ok() && self.pending.starts_with('<') {
            self.pending.len()
        } else {
            0
        };
        result
    }
}

impl Tokenizer for StreamTokenizer {
    fn write<S: TokenSink>(&mut self, chunk: &str, sink: &mut S) -> Result<(), S::Error> {
        debug_assert!(!self.ended, "StreamTokenizer::write called after end()");
        self.stats.chunks += 1;
        self.pending.push_str(chunk);
        self.pump(sink, false)
    }

    fn end<S: TokenSink>(&mut self, sink: &mut S) -> Result<(), S::Error> {
        debug_assert!(!self.ended, "StreamTokenizer::end called twice");
        self.pump(sink, true)?;
        if !self.pending.is_empty() {
            log::debug!(
                target: "markup_stream.tokenizer",
                "discarding unterminated markup at end of input: {:?}",
                self.pending
            );
            self.pending.clear();
        }
        self.ended = true;
        self.stats.events_emitted += 1;
        sink.end_of_stream()
    }
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Result of lexing markup that starts at a `<`.
#[derive(Debug, PartialEq, Eq)]
enum Markup {
    /// Not enough input to decide; wait for more.
    Incomplete,
    /// The `<` is plain text.
    Literal,
    /// Comment, declaration or processing instruction of the given length.
    Skip(usize),
    Open {
        name: String,
        attributes: Attributes,
        self_closing: bool,
        len: usize,
    },
    Close {
        name: String,
        len: usize,
    },
}

struct Scanner<'a> {
    input: &'a str,
    config: &'a TokenizerConfig,
    stats: &'a mut TokenizerStats,
    at_eof: bool,
}

impl Scanner<'_> {
    /// Emit every complete token in `input`, advancing `pos` past each one
    /// before it is handed to the sink.
    fn run<S: TokenSink>(&mut self, pos: &mut usize, sink: &mut S) -> Result<(), S::Error> {
        let input = self.input;
        let bytes = input.as_bytes();
        // Slices are only cut at ASCII structural bytes, so every endpoint is
        // a UTF-8 boundary.
        while *pos < bytes.len() {
            if bytes[*pos] != b'<' {
                let end = memchr(b'<', &bytes[*pos..]).map_or(bytes.len(), |rel| *pos + rel);
                let run = &input[*pos..end];
                let held = if end == bytes.len() && !self.at_eof && self.config.decode_entities {
                    incomplete_reference_len(run)
                } else {
                    0
                };
                let ready = &run[..run.len() - held];
                *pos += ready.len();
                if !ready.is_empty() {
                    self.emit_text(ready, sink)?;
                }
                if held > 0 {
                    return Ok(());
                }
                continue;
            }

            debug_assert!(input.is_char_boundary(*pos));
            match self.lex_markup(&input[*pos..]) {
                Markup::Incomplete => return Ok(()),
                Markup::Literal => {
                    *pos += 1;
                    self.emit_text("<", sink)?;
                }
                Markup::Skip(len) => {
                    *pos += len;
                    self.stats.markup_skipped += 1;
                }
                Markup::Open {
                    name,
                    attributes,
                    self_closing,
                    len,
                } => {
                    *pos += len;
                    log::trace!(target: "markup_stream.tokenizer", "open <{name}>");
                    self.stats.events_emitted += 1;
                    sink.open_tag(&name, attributes)?;
                    let void = self.config.self_close_void_elements && is_void_element(&name);
                    if self_closing || void {
                        self.emit_close(&name, sink)?;
                    }
                }
                Markup::Close { name, len } => {
                    *pos += len;
                    self.emit_close(&name, sink)?;
                }
            }
        }
        Ok(())
    }

    fn emit_text<S: TokenSink>(&mut self, raw: &str, sink: &mut S) -> Result<(), S::Error> {
        self.stats.events_emitted += 1;
        if self.config.decode_entities {
            sink.text(&decode_entities(raw))
        } else {
            sink.text(raw)
        }
    }

    fn emit_close<S: TokenSink>(&mut self, name: &str, sink: &mut S) -> Result<(), S::Error> {
        log::trace!(target: "markup_stream.tokenizer", "close </{name}>");
        self.stats.events_emitted += 1;
        sink.close_tag(name)
    }

    fn lex_markup(&self, rest: &str) -> Markup {
        let bytes = rest.as_bytes();
        debug_assert_eq!(bytes.first(), Some(&b'<'));
        let Some(&next) = bytes.get(1) else {
            return if self.at_eof {
                Markup::Literal
            } else {
                Markup::Incomplete
            };
        };
        match next {
            b'!' => self.lex_declaration(rest),
            b'?' => match memchr(b'>', bytes) {
                Some(end) => Markup::Skip(end + 1),
                None => Markup::Incomplete,
            },
            b'/' => self.lex_end_tag(rest),
            b if b.is_ascii_alphabetic() => self.lex_start_tag(rest),
            _ => Markup::Literal,
        }
    }

    fn lex_declaration(&self, rest: &str) -> Markup {
        const COMMENT_START: &str = "<!--";
        const COMMENT_END: &str = "-->";
        if rest.len() < COMMENT_START.len() && COMMENT_START.starts_with(rest) {
            return Markup::Incomplete;
        }
        if rest.starts_with(COMMENT_START) {
            return match rest[COMMENT_START.len()..].find(COMMENT_END) {
                Some(end) => Markup::Skip(COMMENT_START.len() + end + COMMENT_END.len()),
                None => Markup::Incomplete,
            };
        }
        match memchr(b'>', rest.as_bytes()) {
            Some(end) => Markup::Skip(end + 1),
            None => Markup::Incomplete,
        }
    }

    fn lex_end_tag(&self, rest: &str) -> Markup {
        let bytes = rest.as_bytes();
        let mut j = 2;
        while j < bytes.len() && is_name_char(bytes[j]) {
            j += 1;
        }
        let name = rest[2..j].to_ascii_lowercase();
        let Some(gt) = memchr(b'>', &bytes[j..]) else {
            return Markup::Incomplete;
        };
        let len = j + gt + 1;
        if name.is_empty() {
            return Markup::Skip(len);
        }
        Markup::Close { name, len }
    }

    fn lex_start_tag(&self, rest: &str) -> Markup {
        let bytes = rest.as_bytes();
        let len = bytes.len();
        let mut k = 1;
        while k < len && is_name_char(bytes[k]) {
            k += 1;
        }
        let name = rest[1..k].to_ascii_lowercase();
        let mut attributes = Attributes::new();
        let mut self_closing = false;

        let skip_whitespace = |k: &mut usize| {
            while *k < len && bytes[*k].is_ascii_whitespace() {
                *k += 1;
            }
        };

        loop {
            skip_whitespace(&mut k);
            if k >= len {
                return Markup::Incomplete;
            }
            match bytes[k] {
                b'>' => {
                    k += 1;
                    break;
                }
                b'/' => {
                    if k + 1 >= len {
                        return Markup::Incomplete;
                    }
                    if bytes[k + 1] == b'>' {
                        self_closing = true;
                        k += 2;
                        break;
                    }
                    k += 1;
                    continue;
                }
                _ => {}
            }

            let name_start = k;
            while k < len && is_name_char(bytes[k]) {
                k += 1;
            }
            if name_start == k {
                // Stray byte such as a quote or `=`; skip it. `>` and `/` were
                // handled above, so this is always ASCII or a UTF-8 lead byte.
                k += rest[k..].chars().next().map_or(1, char::len_utf8);
                continue;
            }
            let attribute_name = rest[name_start..k].to_ascii_lowercase();

            skip_whitespace(&mut k);
            if k >= len {
                return Markup::Incomplete;
            }
            let value = if bytes[k] == b'=' {
                k += 1;
                skip_whitespace(&mut k);
                if k >= len {
                    return Markup::Incomplete;
                }
                if bytes[k] == b'"' || bytes[k] == b'\'' {
                    let quote = bytes[k];
                    let start = k + 1;
                    let Some(rel) = memchr(quote, &bytes[start..]) else {
                        return Markup::Incomplete;
                    };
                    k = start + rel + 1;
                    &rest[start..start + rel]
                } else {
                    let start = k;
                    while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                        if bytes[k] == b'/' {
                            match bytes.get(k + 1) {
                                None => return Markup::Incomplete,
                                Some(b'>') => break,
                                Some(_) => {}
                            }
                        }
                        k += 1;
                    }
                    if k >= len {
                        return Markup::Incomplete;
                    }
                    &rest[start..k]
                }
            } else {
                ""
            };

            let value = if self.config.decode_entities {
                decode_entities(value).into_owned()
            } else {
                value.to_string()
            };
            if !attributes.insert(attribute_name, value) {
                log::trace!(
                    target: "markup_stream.tokenizer",
                    "dropping duplicate attribute on <{name}>"
                );
            }
        }

        Markup::Open {
            name,
            attributes,
            self_closing,
            len: k,
        }
    }
}
