//! Minimal inline markdown formatter.
//!
//! Supports `**bold**`, `*italic*` / `_italic_` and `` `code` ``. Markers
//! are consumed rather than echoed, and any marker still open at the end of
//! the input is closed there. A prefix of a message therefore always yields
//! well-formed output, which is what the progressive reveal relies on.

/// Style flags of a span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

/// Formatted text as a sequence of styled spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    spans: Vec<Span>,
}

impl RichText {
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Text with all markup removed.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    fn push(&mut self, text: &mut String, style: SpanStyle) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.spans.push(Span {
                text: text.clone(),
                style,
            }),
        }
        text.clear();
    }
}

/// Formats `source` into styled spans.
pub fn format_rich(source: &str) -> RichText {
    let mut rich = RichText::default();
    let mut style = SpanStyle::default();
    let mut buffer = String::new();
    let mut chars = source.chars().peekable();
    let mut previous: Option<char> = None;

    while let Some(c) = chars.next() {
        match c {
            '`' => {
                rich.push(&mut buffer, style);
                style.code = !style.code;
            }
            _ if style.code => buffer.push(c),
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                rich.push(&mut buffer, style);
                style.bold = !style.bold;
            }
            '*' => {
                rich.push(&mut buffer, style);
                style.italic = !style.italic;
            }
            // Underscores inside words (snake_case names) stay literal.
            '_' if previous.is_some_and(|p| p.is_alphanumeric())
                && chars.peek().is_some_and(|n| n.is_alphanumeric()) =>
            {
                buffer.push(c)
            }
            '_' => {
                rich.push(&mut buffer, style);
                style.italic = !style.italic;
            }
            _ => buffer.push(c),
        }
        previous = Some(c);
    }
    rich.push(&mut buffer, style);

    rich
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> SpanStyle {
        SpanStyle {
            bold: true,
            ..SpanStyle::default()
        }
    }

    #[test]
    fn test_bold_and_plain() {
        let rich = format_rich("Open **Regions** now");
        assert_eq!(rich.spans().len(), 3);
        assert_eq!(rich.spans()[1].text, "Regions");
        assert_eq!(rich.spans()[1].style, bold());
        assert_eq!(rich.plain_text(), "Open Regions now");
    }

    #[test]
    fn test_unclosed_marker_is_closed_at_end() {
        let rich = format_rich("Open **Reg");
        assert_eq!(rich.plain_text(), "Open Reg");
        assert_eq!(rich.spans()[1].style, bold());
    }

    #[test]
    fn test_every_prefix_is_well_formed() {
        let source = "Click **Add** then `Save` and _confirm_.";
        let chars: Vec<char> = source.chars().collect();
        for end in 0..=chars.len() {
            let prefix: String = chars[..end].iter().collect();
            let plain = format_rich(&prefix).plain_text();
            assert!(!plain.contains('*'), "marker leaked at {end}: {plain}");
            assert!(!plain.contains('`'), "marker leaked at {end}: {plain}");
        }
        assert_eq!(format_rich(source).plain_text(), "Click Add then Save and confirm.");
    }

    #[test]
    fn test_code_ignores_inner_markers() {
        let rich = format_rich("`a*b*c`");
        assert_eq!(rich.spans().len(), 1);
        assert_eq!(rich.spans()[0].text, "a*b*c");
        assert!(rich.spans()[0].style.code);
    }

    #[test]
    fn test_snake_case_underscores_stay_literal() {
        assert_eq!(format_rich("user_id field").plain_text(), "user_id field");
    }
}
