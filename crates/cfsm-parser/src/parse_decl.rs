//! Item parsing: options, initial states, events and state blocks.

use cfsm_lexer::token::TokenKind;
use cfsm_types::ast::*;
use cfsm_types::ErrorCode;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Description
    // ══════════════════════════════════════════════════════════════════════════

    pub(crate) fn parse_description(&mut self) -> Option<Description> {
        let start = self.current_span();
        let mut items = Vec::new();

        while !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            let item = match self.peek() {
                TokenKind::Option => self.parse_option().map(Item::Option),
                TokenKind::InitialState => self.parse_initial().map(Item::Initial),
                TokenKind::Event => self.parse_event().map(Item::Event),
                TokenKind::State => self.parse_state().map(Item::State),
                other => {
                    let msg = format!(
                        "expected 'state', 'event', 'initial-state' or 'option', got '{other}'"
                    );
                    self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, msg);
                    None
                }
            };
            match item {
                Some(item) => items.push(item),
                None => self.recover_item(),
            }
        }

        let span = start.to(self.previous_span());
        Some(Description { items, span })
    }

    /// After a failed item: skip to the next top-level keyword, discarding
    /// whatever remains of a broken block.
    fn recover_item(&mut self) {
        self.synchronize();
        while !self.at_end()
            && !matches!(
                self.peek(),
                TokenKind::Option | TokenKind::InitialState | TokenKind::Event | TokenKind::State
            )
        {
            self.advance();
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Simple items
    // ══════════════════════════════════════════════════════════════════════════

    /// `option KEY (STRING | WORD) ;`
    fn parse_option(&mut self) -> Option<OptionDecl> {
        let start = self.expect(&TokenKind::Option)?;
        let key = self.expect_word()?;
        let value = match self.peek().clone() {
            TokenKind::StringLiteral(s) | TokenKind::Identifier(s) => {
                self.advance();
                s
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected option value, got '{other}'"),
                );
                return None;
            }
        };
        self.expect(&TokenKind::Semicolon)?;
        Some(OptionDecl {
            key,
            value,
            span: start.to(self.previous_span()),
        })
    }

    /// `initial-state A, B ;`
    fn parse_initial(&mut self) -> Option<InitialDecl> {
        let start = self.expect(&TokenKind::InitialState)?;
        let states = self.identifier_list()?;
        self.expect(&TokenKind::Semicolon)?;
        Some(InitialDecl {
            states,
            span: start.to(self.previous_span()),
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Events
    // ══════════════════════════════════════════════════════════════════════════

    /// `event NAME ;` or `event NAME { (precondition|callback) idents ; ... }`
    fn parse_event(&mut self) -> Option<EventDecl> {
        let start = self.expect(&TokenKind::Event)?;
        let name = self.expect_identifier()?;
        let mut preconditions = Vec::new();
        let mut callbacks = Vec::new();

        if !self.eat(&TokenKind::Semicolon) {
            self.expect(&TokenKind::LBrace)?;
            while !self.check(&TokenKind::RBrace) && !self.at_end() {
                if self.too_many_errors() {
                    return None;
                }
                let parsed = match self.peek() {
                    TokenKind::Precondition => {
                        self.advance();
                        self.hook_list().map(|ids| preconditions.extend(ids))
                    }
                    TokenKind::Callback => {
                        self.advance();
                        self.hook_list().map(|ids| callbacks.extend(ids))
                    }
                    other => {
                        let msg = format!("expected 'precondition' or 'callback', got '{other}'");
                        self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, msg);
                        None
                    }
                };
                if parsed.is_none() {
                    self.synchronize();
                }
            }
            self.expect(&TokenKind::RBrace)?;
        }

        Some(EventDecl {
            name,
            preconditions,
            callbacks,
            span: start.to(self.previous_span()),
        })
    }

    /// `idents ;`
    fn hook_list(&mut self) -> Option<Vec<Ident>> {
        let idents = self.identifier_list()?;
        self.expect(&TokenKind::Semicolon)?;
        Some(idents)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // States
    // ══════════════════════════════════════════════════════════════════════════

    /// `state NAME [initial] ;` or `state NAME [initial] { state_item* }`
    fn parse_state(&mut self) -> Option<StateDecl> {
        let start = self.expect(&TokenKind::State)?;
        let name = self.expect_identifier()?;
        let initial = self.eat(&TokenKind::Initial);
        let mut body = Vec::new();

        if !self.eat(&TokenKind::Semicolon) {
            self.expect(&TokenKind::LBrace)?;
            while !self.check(&TokenKind::RBrace) && !self.at_end() {
                if self.too_many_errors() {
                    return None;
                }
                match self.parse_state_item() {
                    Some(item) => body.push(item),
                    None => self.synchronize(),
                }
            }
            self.expect(&TokenKind::RBrace)?;
        }

        Some(StateDecl {
            name,
            initial,
            body,
            span: start.to(self.previous_span()),
        })
    }

    fn parse_state_item(&mut self) -> Option<StateItem> {
        let keyword = self.peek().clone();
        match keyword {
            TokenKind::EntryPrecondition
            | TokenKind::ExitPrecondition
            | TokenKind::OnEnter
            | TokenKind::OnExit => {
                self.advance();
                let hooks = self.hook_list()?;
                Some(match keyword {
                    TokenKind::EntryPrecondition => StateItem::EntryPrecondition(hooks),
                    TokenKind::ExitPrecondition => StateItem::ExitPrecondition(hooks),
                    TokenKind::OnEnter => StateItem::OnEnter(hooks),
                    _ => StateItem::OnExit(hooks),
                })
            }
            TokenKind::NextState => {
                let start = self.current_span();
                self.advance();
                let targets = self.identifier_list()?;
                let preconditions = self.edge_tail()?;
                Some(StateItem::NextState(Edges {
                    targets,
                    preconditions,
                    span: start.to(self.previous_span()),
                }))
            }
            TokenKind::On => {
                let start = self.current_span();
                self.advance();
                let event = self.expect_identifier()?;
                self.expect(&TokenKind::Arrow)?;
                let target = self.expect_identifier()?;
                let preconditions = self.edge_tail()?;
                Some(StateItem::OnEvent {
                    event,
                    edge: Edges {
                        targets: vec![target],
                        preconditions,
                        span: start.to(self.previous_span()),
                    },
                })
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("unexpected '{other}' in state block"),
                );
                None
            }
        }
    }

    /// `;` or `{ (precondition idents ;)* }`; returns the edge guards.
    fn edge_tail(&mut self) -> Option<Vec<Ident>> {
        if self.eat(&TokenKind::Semicolon) {
            return Some(Vec::new());
        }
        self.expect(&TokenKind::LBrace)?;
        let mut preconditions = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            self.expect(&TokenKind::Precondition)?;
            preconditions.extend(self.hook_list()?);
        }
        self.expect(&TokenKind::RBrace)?;
        Some(preconditions)
    }
}
