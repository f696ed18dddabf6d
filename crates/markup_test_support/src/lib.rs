pub mod chunker;
pub mod fixtures;

/// Escape control characters and quotes so a failing assertion shows the exact
/// text on one line.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Human-readable report of the first mismatching line, with two lines of
/// context on each side.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    use std::fmt::Write;

    const MISSING: &str = "<missing>";
    let line = |lines: &[String], idx: usize| -> String {
        lines
            .get(idx)
            .map_or_else(|| MISSING.to_string(), |l| escape_text(l))
    };

    let max = expected.len().max(actual.len());
    let mismatch = (0..max).find(|&i| expected.get(i) != actual.get(i));
    let mut out = String::new();
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            &mut out,
            "first mismatch at line {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for idx in start..end {
            let marker = if idx == i { ">" } else { " " };
            let _ = writeln!(
                &mut out,
                "{marker} {:>4}  expected: {}",
                idx + 1,
                line(expected, idx)
            );
            let _ = writeln!(&mut out, "{marker} {:>4}    actual: {}", idx + 1, line(actual, idx));
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

/// Byte offset of the first difference between two strings, if any.
pub fn first_divergence(a: &str, b: &str) -> Option<usize> {
    let common = a
        .bytes()
        .zip(b.bytes())
        .position(|(x, y)| x != y)
        .unwrap_or(a.len().min(b.len()));
    (common < a.len().max(b.len())).then_some(common)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_text_shows_control_characters() {
        assert_eq!(escape_text("a\"b\n\u{1}"), "a\\\"b\\n\\u{01}");
    }

    #[test]
    fn diff_lines_points_at_first_mismatch() {
        let expected = vec!["a".to_string(), "b".to_string()];
        let actual = vec!["a".to_string(), "c".to_string(), "d".to_string()];
        let report = diff_lines(&expected, &actual);
        assert!(report.starts_with("first mismatch at line 2"), "{report}");
        assert!(report.contains(">    2    actual: c"), "{report}");
        assert!(report.contains("     3  expected: <missing>"), "{report}");
    }

    #[test]
    fn first_divergence_reports_offset() {
        assert_eq!(first_divergence("abc", "abc"), None);
        assert_eq!(first_divergence("abc", "abd"), Some(2));
        assert_eq!(first_divergence("ab", "abc"), Some(2));
    }
}
