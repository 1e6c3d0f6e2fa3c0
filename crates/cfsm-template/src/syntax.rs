//! Splits template text into literal runs and `{{ ... }}` tags.
//!
//! A `-` just inside the braces trims the surrounding line: `{{-` drops
//! spaces and tabs before the tag, `-}}` drops spaces and tabs after it
//! plus one line break. Everything else outside tags is kept verbatim.

use cfsm_types::Span;

use crate::error::{TemplateError, TemplateResult};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A tag with its delimiters and trim markers removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tag<'t> {
    pub body: &'t str,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'t> {
    Text(&'t str),
    Tag(Tag<'t>),
}

/// 1-based line/column tracking across scanned text.
struct Cursor {
    line: u32,
    col: u32,
}

impl Cursor {
    fn skip(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }
}

pub(crate) fn scan(text: &str) -> TemplateResult<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut cursor = Cursor { line: 1, col: 1 };
    let mut rest = text;
    let mut trim_next = false;

    loop {
        let Some(open) = rest.find(OPEN) else {
            let literal = if trim_next { trim_line_start(rest) } else { rest };
            if !literal.is_empty() {
                segments.push(Segment::Text(literal));
            }
            return Ok(segments);
        };

        let mut literal = &rest[..open];
        if trim_next {
            literal = trim_line_start(literal);
        }
        cursor.skip(&rest[..open]);
        let (start_line, start_col) = (cursor.line, cursor.col);

        let after_open = &rest[open + OPEN.len()..];
        let Some(close) = after_open.find(CLOSE) else {
            return Err(TemplateError::syntax(
                "unterminated '{{' directive",
                Span::point(start_line, start_col),
            ));
        };
        let whole = &rest[open..open + OPEN.len() + close + CLOSE.len()];
        cursor.skip(whole);

        let mut body = &after_open[..close];
        if let Some(b) = body.strip_prefix('-') {
            body = b;
            literal = literal.trim_end_matches([' ', '\t']);
        }
        trim_next = false;
        if let Some(b) = body.strip_suffix('-') {
            body = b;
            trim_next = true;
        }

        if !literal.is_empty() {
            segments.push(Segment::Text(literal));
        }
        segments.push(Segment::Tag(Tag {
            body: body.trim(),
            span: Span::new(start_line, start_col, cursor.line, cursor.col.saturating_sub(1)),
        }));
        rest = &rest[open + whole.len()..];
    }
}

/// Drop leading spaces and tabs and at most one line break.
fn trim_line_start(text: &str) -> &str {
    let text = text.trim_start_matches([' ', '\t']);
    text.strip_prefix("\r\n")
        .or_else(|| text.strip_prefix('\n'))
        .unwrap_or(text)
}
