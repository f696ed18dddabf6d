//! Character reference decoding for a small, fixed subset of HTML entities.
//!
//! Contract:
//! - Named references: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`.
//! - Numeric references only when semicolon-terminated: `&#215;`, `&#xD7;`.
//! - Only valid Unicode scalar values decode.
//! - Everything else (unknown names, missing `;`, malformed or overlong
//!   numerics) passes through unchanged.

use memchr::memchr;
use std::borrow::Cow;

/// Longest decodable reference, `&#x10FFFF;` / `&#1114111;`, in bytes.
pub(crate) const MAX_REFERENCE_LEN: usize = 10;

const MAX_HEX_DIGITS: usize = 6;
const MAX_DEC_DIGITS: usize = 7;

const NAMED: &[(&[u8], char)] = &[
    (b"&amp;", '&'),
    (b"&lt;", '<'),
    (b"&gt;", '>'),
    (b"&quot;", '"'),
    (b"&apos;", '\''),
    (b"&nbsp;", '\u{00A0}'),
];

enum Reference {
    Char(char, usize),
    Verbatim(usize),
}

pub(crate) fn decode_entities(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let Some(first) = memchr(b'&', bytes) else {
        return Cow::Borrowed(s);
    };

    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut i = first;
    while i < bytes.len() {
        debug_assert_eq!(bytes[i], b'&');
        i += match decode_reference(&bytes[i..]) {
            Reference::Char(ch, len) => {
                out.push(ch);
                len
            }
            Reference::Verbatim(len) => {
                out.push_str(&s[i..i + len]);
                len
            }
        };
        let next = memchr(b'&', &bytes[i..]).map_or(bytes.len(), |rel| i + rel);
        out.push_str(&s[i..next]);
        i = next;
    }
    Cow::Owned(out)
}

/// Length of the suffix of `text` that might still grow into a reference once
/// more input arrives. Zero when the text can be decoded as-is.
pub(crate) fn incomplete_reference_len(text: &str) -> usize {
    let Some(amp) = text.rfind('&') else {
        return 0;
    };
    let tail = &text.as_bytes()[amp..];
    let could_grow = tail.len() < MAX_REFERENCE_LEN
        && tail[1..]
            .iter()
            .all(|&b| b.is_ascii_alphanumeric() || b == b'#');
    if could_grow { tail.len() } else { 0 }
}

fn decode_reference(rest: &[u8]) -> Reference {
    for &(pattern, ch) in NAMED {
        if rest.starts_with(pattern) {
            return Reference::Char(ch, pattern.len());
        }
    }
    if rest.starts_with(b"&#x") || rest.starts_with(b"&#X") {
        decode_numeric(rest, 3, 16, MAX_HEX_DIGITS)
    } else if rest.starts_with(b"&#") {
        decode_numeric(rest, 2, 10, MAX_DEC_DIGITS)
    } else {
        Reference::Verbatim(1)
    }
}

fn decode_numeric(rest: &[u8], start: usize, radix: u32, max_digits: usize) -> Reference {
    // Bounded scan so adversarial digit runs stay linear.
    let mut end = None;
    for (offset, &b) in rest[start..].iter().enumerate() {
        if b == b';' {
            if offset > 0 {
                end = Some(start + offset);
            }
            break;
        }
        if offset == max_digits || !(b as char).is_digit(radix) {
            break;
        }
    }
    let Some(end) = end else {
        return Reference::Verbatim(malformed_len(rest));
    };

    // Digits are ASCII, so the slice is valid UTF-8.
    let digits = std::str::from_utf8(&rest[start..end]).unwrap_or_default();
    match u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
    {
        Some(ch) => Reference::Char(ch, end + 1),
        None => Reference::Verbatim(end + 1),
    }
}

/// Malformed references are copied up to `;` (inclusive), or up to the next
/// `&` or whitespace (exclusive), so they never swallow a following reference.
fn malformed_len(rest: &[u8]) -> usize {
    for (j, &b) in rest.iter().enumerate().skip(1) {
        if b == b';' {
            return j + 1;
        }
        if b == b'&' || b.is_ascii_whitespace() {
            return j;
        }
    }
    rest.len()
}
