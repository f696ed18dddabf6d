//! Incremental UTF-8 decoding for streaming byte sources.
//!
//! Multi-byte characters split across chunk boundaries are carried to the next
//! chunk. Invalid byte sequences are replaced with U+FFFD so decoding always
//! makes forward progress.

const REPLACEMENT: char = '\u{FFFD}';

/// Stateful decoder holding at most one incomplete UTF-8 suffix between calls.
#[derive(Clone, Debug, Default)]
pub struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes held back waiting for the rest of a character.
    pub fn pending(&self) -> usize {
        self.carry.len()
    }

    /// Decode `bytes` and append the result to `out`.
    pub fn push(&mut self, bytes: &[u8], out: &mut String) {
        let mut remaining = bytes;

        // The carry is an incomplete sequence (at most 3 bytes). Complete it by
        // borrowing just enough bytes from the new chunk, then decode the rest
        // of the chunk in place.
        while !self.carry.is_empty() && !remaining.is_empty() {
            let expected = sequence_len(self.carry[0]);
            if expected == 0 {
                out.push(REPLACEMENT);
                self.carry.clear();
                break;
            }
            let held = self.carry.len();
            debug_assert!(held < expected, "carry must be an incomplete sequence");
            let needed = expected - held;
            if remaining.len() < needed {
                self.carry.extend_from_slice(remaining);
                return;
            }

            let mut scratch = [0u8; 4];
            scratch[..held].copy_from_slice(&self.carry);
            scratch[held..expected].copy_from_slice(&remaining[..needed]);
            self.carry.clear();
            decode_into(out, &mut self.carry, &scratch[..expected]);
            remaining = &remaining[needed..];
        }

        if !remaining.is_empty() {
            decode_into(out, &mut self.carry, remaining);
        }
    }

    /// Flush a dangling partial sequence (lossily) so the stream is never
    /// silently truncated.
    pub fn finish(&mut self, out: &mut String) {
        if self.carry.is_empty() {
            return;
        }
        out.push_str(&String::from_utf8_lossy(&self.carry));
        self.carry.clear();
    }
}

fn sequence_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

fn decode_into(out: &mut String, carry: &mut Vec<u8>, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        match std::str::from_utf8(bytes) {
            Ok(s) => {
                out.push_str(s);
                return;
            }
            Err(err) => {
                let (valid, rest) = bytes.split_at(err.valid_up_to());
                if let Ok(prefix) = std::str::from_utf8(valid) {
                    out.push_str(prefix);
                }
                match err.error_len() {
                    Some(len) => {
                        out.push(REPLACEMENT);
                        bytes = &rest[len..];
                    }
                    None => {
                        carry.extend_from_slice(rest);
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(chunks: &[&[u8]]) -> String {
        let mut decoder = Utf8Decoder::new();
        let mut out = String::new();
        for chunk in chunks {
            decoder.push(chunk, &mut out);
        }
        decoder.finish(&mut out);
        out
    }

    #[test]
    fn split_multibyte_across_chunks() {
        let mut decoder = Utf8Decoder::new();
        let mut out = String::new();

        decoder.push(&[0xC3], &mut out);
        assert_eq!(out, "");
        assert_eq!(decoder.pending(), 1);

        decoder.push(&[0x97], &mut out);
        assert_eq!(out, "×");
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn completes_carry_then_decodes_rest_of_chunk() {
        // U+1F600 is F0 9F 98 80.
        assert_eq!(decode_all(&[&[0xF0, 0x9F], &[0x98, 0x80, b'!']]), "😀!");
    }

    #[test]
    fn carry_survives_single_byte_chunks() {
        assert_eq!(decode_all(&[&[0xF0], &[0x9F], &[0x98], &[0x80]]), "😀");
    }

    #[test]
    fn new_incomplete_suffix_replaces_old_carry() {
        let mut decoder = Utf8Decoder::new();
        let mut out = String::new();

        // E2 82 AC is the euro sign.
        decoder.push(&[0xE2], &mut out);
        decoder.push(&[0x82, 0xAC, 0xE2], &mut out);
        assert_eq!(out, "€");
        assert_eq!(decoder.pending(), 1);
    }

    #[test]
    fn invalid_bytes_make_progress() {
        assert_eq!(decode_all(&[&[0xFF, b'f']]), "\u{FFFD}f");
    }

    #[test]
    fn broken_continuation_is_replaced() {
        assert_eq!(decode_all(&[&[0xE2], &[b'a', b'b']]), "\u{FFFD}ab");
    }

    #[test]
    fn incomplete_suffix_is_flushed_on_finish() {
        assert_eq!(decode_all(&[&[b'x', 0xE2, 0x82]]), "x\u{FFFD}");
    }
}
