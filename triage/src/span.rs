//! Source locations for rule definition diagnostics
//!
//! `Span` points into the text a rule set was loaded from, so load-time
//! errors can be rendered with the offending snippet.

/// Span representing a location in a rule source document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub col: usize,
}

impl Span {
    /// Build a span from a 1-based line/column pair, as reported by serde_json.
    ///
    /// The span covers a single character. Out-of-range positions are clamped
    /// to the end of the text.
    pub fn from_line_col(text: &str, line: usize, col: usize) -> Self {
        let mut offset = 0;
        for (index, content) in text.split_inclusive('\n').enumerate() {
            if index + 1 == line {
                let within = col.saturating_sub(1).min(content.len());
                offset += within;
                break;
            }
            offset += content.len();
        }
        let start = floor_char_boundary(text, offset.min(text.len()));
        let end = text[start..]
            .chars()
            .next()
            .map_or(start, |c| start + c.len_utf8());
        Self {
            start,
            end,
            line: line.max(1),
            col: col.max(1),
        }
    }

    /// Span of the first occurrence of `needle` in `text`
    pub fn locate(text: &str, needle: &str) -> Option<Self> {
        let start = text.find(needle)?;
        let before = &text[..start];
        let line = before.matches('\n').count() + 1;
        let col = before
            .rfind('\n')
            .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
            + 1;
        Some(Self {
            start,
            end: start + needle.len(),
            line,
            col,
        })
    }
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_line_col_second_line() {
        let text = "{\n  \"id\": 1\n}";
        let span = Span::from_line_col(text, 2, 3);
        assert_eq!(span.line, 2);
        assert_eq!(&text[span.start..span.end], "\"");
    }

    #[test]
    fn test_locate_reports_line_and_column() {
        let text = "{\n  \"id\": \"04-01\"\n}";
        let span = Span::locate(text, "\"04-01\"").unwrap();
        assert_eq!(span.line, 2);
        assert_eq!(span.col, 9);
        assert_eq!(&text[span.start..span.end], "\"04-01\"");
    }

    #[test]
    fn test_from_line_col_past_end_is_clamped() {
        let text = "[]";
        let span = Span::from_line_col(text, 9, 9);
        assert!(span.start <= text.len());
    }
}
