//! Core parser infrastructure: token cursor, error reporting, helpers.

use cfsm_lexer::token::{Token, TokenKind};
use cfsm_types::ast::{Description, Ident};
use cfsm_types::{CfsmError, CompileErrors, ErrorCode, SourceFile, Span};

/// Recursive-descent parser over a lexed description.
///
/// Collects errors and resynchronizes at the next `;`, `}` or top-level
/// keyword, so several mistakes surface in one run.
pub struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source_file: &'src SourceFile,
    errors: CompileErrors,
}

pub struct ParseResult {
    pub description: Option<Description>,
    pub errors: CompileErrors,
}

impl<'src> Parser<'src> {
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: CompileErrors::empty(),
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    pub(crate) fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(&TokenKind::Eof, |t| &t.kind)
    }

    pub(crate) fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or_else(|| self.source_file.end_span(), |t| t.span)
    }

    pub(crate) fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(t) => t.span,
            None => Span::point(1, 1),
        }
    }

    pub(crate) fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn at_end(&self) -> bool {
        *self.peek() == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Span> {
        if self.check(expected) {
            let span = self.current_span();
            self.advance();
            Some(span)
        } else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected '{}', got '{}'", expected, self.peek()),
            );
            None
        }
    }

    /// Any non-keyword word, hyphens allowed (option keys).
    pub(crate) fn expect_word(&mut self) -> Option<Ident> {
        match self.peek().clone() {
            TokenKind::Identifier(name) => {
                let span = self.current_span();
                self.advance();
                Some(Ident::new(name, span))
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected identifier, got '{other}'"),
                );
                None
            }
        }
    }

    /// A word that will be emitted as a C identifier.
    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        let ident = self.expect_word()?;
        if !is_c_identifier(&ident.name) {
            self.error_at(
                ErrorCode::INVALID_IDENTIFIER,
                format!("'{}' is not a valid identifier", ident.name),
                ident.span,
            );
            return None;
        }
        Some(ident)
    }

    /// `IDENT ("," IDENT)*`
    pub(crate) fn identifier_list(&mut self) -> Option<Vec<Ident>> {
        let mut idents = vec![self.expect_identifier()?];
        while self.eat(&TokenKind::Comma) {
            idents.push(self.expect_identifier()?);
        }
        Some(idents)
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        self.errors.push_error(CfsmError::new(
            &self.source_file.name,
            code,
            message,
            span,
            source_line,
        ));
    }

    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.is_full()
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip to just past the next `;`, or to the next `}` / item keyword.
    pub(crate) fn synchronize(&mut self) {
        while !self.at_end() {
            match self.peek() {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace
                | TokenKind::Option
                | TokenKind::InitialState
                | TokenKind::Event
                | TokenKind::State => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    pub fn parse(mut self) -> ParseResult {
        let description = self.parse_description();
        ParseResult {
            description,
            errors: self.errors,
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::is_c_identifier;

    #[test]
    fn c_identifiers() {
        assert!(is_c_identifier("GROUND_STATE"));
        assert!(is_c_identifier("_x1"));
        assert!(!is_c_identifier("1st"));
        assert!(!is_c_identifier("state-enum"));
        assert!(!is_c_identifier(""));
    }
}
