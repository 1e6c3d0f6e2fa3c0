//! Token types for the description lexer.

use cfsm_types::Span;
use std::fmt;

/// Reserved words of the description language.
///
/// Hyphenated keywords are single tokens; they cannot collide with C
/// identifiers because `-` is not an identifier character.
pub const ALL_KEYWORDS: &[&str] = &[
    "option",
    "initial-state",
    "initial",
    "event",
    "state",
    "precondition",
    "callback",
    "entry-precondition",
    "exit-precondition",
    "on-enter",
    "on-exit",
    "next-state",
    "on",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // ── Literals ──
    /// A word that is not a keyword. May contain `-` (option keys).
    Identifier(String),
    /// `"..."` with escapes resolved.
    StringLiteral(String),

    // ── Keywords ──
    Option,
    InitialState,
    Initial,
    Event,
    State,
    Precondition,
    Callback,
    EntryPrecondition,
    ExitPrecondition,
    OnEnter,
    OnExit,
    NextState,
    On,

    // ── Punctuation ──
    LBrace,
    RBrace,
    Semicolon,
    Comma,
    Arrow,

    Eof,
}

impl TokenKind {
    /// Keyword token for a word, if it is reserved.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        Some(match word {
            "option" => TokenKind::Option,
            "initial-state" => TokenKind::InitialState,
            "initial" => TokenKind::Initial,
            "event" => TokenKind::Event,
            "state" => TokenKind::State,
            "precondition" => TokenKind::Precondition,
            "callback" => TokenKind::Callback,
            "entry-precondition" => TokenKind::EntryPrecondition,
            "exit-precondition" => TokenKind::ExitPrecondition,
            "on-enter" => TokenKind::OnEnter,
            "on-exit" => TokenKind::OnExit,
            "next-state" => TokenKind::NextState,
            "on" => TokenKind::On,
            _ => return None,
        })
    }

    pub fn is_keyword(&self) -> bool {
        !matches!(
            self,
            TokenKind::Identifier(_)
                | TokenKind::StringLiteral(_)
                | TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::Semicolon
                | TokenKind::Comma
                | TokenKind::Arrow
                | TokenKind::Eof
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(name) => write!(f, "{name}"),
            TokenKind::StringLiteral(s) => write!(f, "\"{s}\""),
            TokenKind::Option => f.write_str("option"),
            TokenKind::InitialState => f.write_str("initial-state"),
            TokenKind::Initial => f.write_str("initial"),
            TokenKind::Event => f.write_str("event"),
            TokenKind::State => f.write_str("state"),
            TokenKind::Precondition => f.write_str("precondition"),
            TokenKind::Callback => f.write_str("callback"),
            TokenKind::EntryPrecondition => f.write_str("entry-precondition"),
            TokenKind::ExitPrecondition => f.write_str("exit-precondition"),
            TokenKind::OnEnter => f.write_str("on-enter"),
            TokenKind::OnExit => f.write_str("on-exit"),
            TokenKind::NextState => f.write_str("next-state"),
            TokenKind::On => f.write_str("on"),
            TokenKind::LBrace => f.write_str("{"),
            TokenKind::RBrace => f.write_str("}"),
            TokenKind::Semicolon => f.write_str(";"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Arrow => f.write_str("->"),
            TokenKind::Eof => f.write_str("end of file"),
        }
    }
}
