//! Declaration events: the front end's output and the model builder's input.

use crate::Span;
use std::fmt;

/// Where a precondition or callback is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookTarget {
    /// Fired when the named state is being entered.
    StateEntry(String),
    /// Fired when the named state is being left.
    StateExit(String),
    /// Fired for every transition triggered by the named event.
    Event(String),
    /// One specific edge: `via` is the event name for event-driven
    /// machines, otherwise the target state name.
    Transition { from: String, via: String },
}

impl fmt::Display for HookTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StateEntry(s) => write!(f, "entry of state '{s}'"),
            Self::StateExit(s) => write!(f, "exit of state '{s}'"),
            Self::Event(e) => write!(f, "event '{e}'"),
            Self::Transition { from, via } => write!(f, "transition '{from}' -> '{via}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    DeclareState {
        name: String,
    },
    DeclareEvent {
        name: String,
    },
    DeclareTransition {
        from: String,
        event: Option<String>,
        to: String,
    },
    DeclareInitial {
        state: String,
    },
    AttachPrecondition {
        target: HookTarget,
        name: String,
    },
    AttachCallback {
        target: HookTarget,
        name: String,
    },
    SetConfig {
        key: String,
        value: String,
    },
}

/// A declaration event with the span of the construct that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decl {
    pub kind: DeclKind,
    pub span: Span,
}

impl Decl {
    pub fn new(kind: DeclKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Declaration without a source location (programmatic construction).
    pub fn synthetic(kind: DeclKind) -> Self {
        Self::new(kind, Span::default())
    }

    pub fn state(name: impl Into<String>) -> Self {
        Self::synthetic(DeclKind::DeclareState { name: name.into() })
    }

    pub fn event(name: impl Into<String>) -> Self {
        Self::synthetic(DeclKind::DeclareEvent { name: name.into() })
    }

    pub fn transition(from: impl Into<String>, event: Option<&str>, to: impl Into<String>) -> Self {
        Self::synthetic(DeclKind::DeclareTransition {
            from: from.into(),
            event: event.map(str::to_string),
            to: to.into(),
        })
    }

    pub fn initial(state: impl Into<String>) -> Self {
        Self::synthetic(DeclKind::DeclareInitial {
            state: state.into(),
        })
    }

    pub fn precondition(target: HookTarget, name: impl Into<String>) -> Self {
        Self::synthetic(DeclKind::AttachPrecondition {
            target,
            name: name.into(),
        })
    }

    pub fn callback(target: HookTarget, name: impl Into<String>) -> Self {
        Self::synthetic(DeclKind::AttachCallback {
            target,
            name: name.into(),
        })
    }

    pub fn config(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::synthetic(DeclKind::SetConfig {
            key: key.into(),
            value: value.into(),
        })
    }
}
