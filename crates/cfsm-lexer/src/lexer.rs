//! Description lexer: source text to a token stream.
//!
//! Comments (`#` or `//` to end of line) and whitespace are dropped.
//! Errors are collected rather than returned; scanning continues after an
//! invalid character so one run reports as much as possible.

use cfsm_types::{CfsmError, CompileErrors, ErrorCode, SourceFile, Span};

use crate::token::{Token, TokenKind};

pub struct Lexer<'src> {
    source: &'src [u8],
    source_file: &'src SourceFile,
    pos: usize,
    line: u32,
    col: u32,
    errors: CompileErrors,
}

/// Tokens (always terminated by [`TokenKind::Eof`]) plus diagnostics.
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: CompileErrors,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.source.as_bytes(),
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            errors: CompileErrors::empty(),
        }
    }

    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();
        loop {
            if self.errors.is_full() {
                tokens.push(Token::new(TokenKind::Eof, self.current_span()));
                break;
            }
            let Some(token) = self.scan() else {
                continue;
            };
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else if ch & 0xC0 != 0x80 {
            // count characters, not UTF-8 continuation bytes
            self.col += 1;
        }
        Some(ch)
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(start_line, start_col, self.line, self.col.saturating_sub(1).max(1))
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        self.errors.push_error(CfsmError::new(
            &self.source_file.name,
            code,
            message,
            span,
            source_line,
        ));
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.advance();
                }
                Some(b'#') => self.skip_line(),
                Some(b'/') if self.peek_at(1) == Some(b'/') => self.skip_line(),
                _ => return,
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == b'\n' {
                break;
            }
            self.advance();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Scanning
    // ─────────────────────────────────────────────────────────────

    /// Next token, or `None` after reporting an invalid character.
    fn scan(&mut self) -> Option<Token> {
        self.skip_trivia();

        let start_line = self.line;
        let start_col = self.col;
        let Some(ch) = self.advance() else {
            return Some(Token::new(TokenKind::Eof, self.current_span()));
        };

        let kind = match ch {
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b';' => TokenKind::Semicolon,
            b',' => TokenKind::Comma,
            b'-' if self.peek() == Some(b'>') => {
                self.advance();
                TokenKind::Arrow
            }
            b'"' => return Some(self.scan_string(start_line, start_col)),
            c if is_word_char(c) => return Some(self.scan_word(start_line, start_col)),
            other => {
                let span = self.span_from(start_line, start_col);
                let shown = if other.is_ascii_graphic() {
                    format!("'{}'", other as char)
                } else {
                    format!("byte 0x{other:02x}")
                };
                self.emit_error(
                    ErrorCode::INVALID_CHARACTER,
                    format!("unexpected character {shown}"),
                    span,
                );
                return None;
            }
        };
        Some(Token::new(kind, self.span_from(start_line, start_col)))
    }

    /// A word continues through `-` only when a word character follows,
    /// so `A->B` lexes as `A`, `->`, `B`.
    fn scan_word(&mut self, start_line: u32, start_col: u32) -> Token {
        let start = self.pos - 1;
        loop {
            match self.peek() {
                Some(c) if is_word_char(c) => {
                    self.advance();
                }
                Some(b'-') if self.peek_at(1).is_some_and(is_word_char) => {
                    self.advance();
                }
                _ => break,
            }
        }
        let word = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        let kind = TokenKind::keyword(&word).unwrap_or(TokenKind::Identifier(word));
        Token::new(kind, self.span_from(start_line, start_col))
    }

    fn scan_string(&mut self, start_line: u32, start_col: u32) -> Token {
        let mut bytes = Vec::new();
        loop {
            match self.advance() {
                None | Some(b'\n') => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_STRING,
                        "unterminated string literal",
                        span,
                    );
                    break;
                }
                Some(b'"') => break,
                Some(b'\\') => match self.advance() {
                    Some(b'n') => bytes.push(b'\n'),
                    Some(b't') => bytes.push(b'\t'),
                    Some(c @ (b'"' | b'\\')) => bytes.push(c),
                    Some(other) => {
                        let span = self.span_from(start_line, start_col);
                        self.emit_error(
                            ErrorCode::INVALID_CHARACTER,
                            format!("unknown escape '\\{}'", other as char),
                            span,
                        );
                    }
                    None => continue,
                },
                Some(c) => bytes.push(c),
            }
        }
        let value = String::from_utf8_lossy(&bytes).into_owned();
        Token::new(
            TokenKind::StringLiteral(value),
            self.span_from(start_line, start_col),
        )
    }
}

fn is_word_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}
