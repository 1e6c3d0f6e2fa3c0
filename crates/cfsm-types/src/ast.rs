//! AST of a machine description.
//!
//! Every node carries a [`Span`]. Items keep source order; the parser's
//! lowering pass turns them into ordered [`crate::Decl`] events.

use crate::Span;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete description: top-level items in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    pub items: Vec<Item>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Option(OptionDecl),
    Initial(InitialDecl),
    Event(EventDecl),
    State(StateDecl),
}

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Items
// ══════════════════════════════════════════════════════════════════════════════

/// `option state-enum "door_state";`
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDecl {
    /// Key as written (may contain `-`).
    pub key: Ident,
    pub value: String,
    pub span: Span,
}

/// `initial-state CLOSED, LOCKED;`
#[derive(Debug, Clone, PartialEq)]
pub struct InitialDecl {
    pub states: Vec<Ident>,
    pub span: Span,
}

/// `event open { precondition has_key; callback log_open; }`
#[derive(Debug, Clone, PartialEq)]
pub struct EventDecl {
    pub name: Ident,
    pub preconditions: Vec<Ident>,
    pub callbacks: Vec<Ident>,
    pub span: Span,
}

/// `state CLOSED initial { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct StateDecl {
    pub name: Ident,
    pub initial: bool,
    pub body: Vec<StateItem>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateItem {
    EntryPrecondition(Vec<Ident>),
    ExitPrecondition(Vec<Ident>),
    OnEnter(Vec<Ident>),
    OnExit(Vec<Ident>),
    /// `next-state A, B { precondition g; }`
    NextState(Edges),
    /// `on EVENT -> TARGET { precondition g; }`
    OnEvent { event: Ident, edge: Edges },
}

/// One or more edge targets sharing the same edge-specific preconditions.
#[derive(Debug, Clone, PartialEq)]
pub struct Edges {
    pub targets: Vec<Ident>,
    pub preconditions: Vec<Ident>,
    pub span: Span,
}
