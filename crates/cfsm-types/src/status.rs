//! Run-time contract shared by the model, the templates and the reference machine.

use std::fmt;
use std::str::FromStr;

/// Result of constructing or advancing a generated machine.
///
/// The numeric codes are emitted verbatim into generated headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    /// Construction with a state that is not a declared initial state.
    ErrInvalidState,
    /// No edge from the current state for the request.
    ErrInvalidTransition,
    /// A guard rejected the transition.
    ErrPrecondition,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Ok,
        Status::ErrInvalidState,
        Status::ErrInvalidTransition,
        Status::ErrPrecondition,
    ];

    pub fn code(self) -> i64 {
        match self {
            Status::Ok => 0,
            Status::ErrInvalidState => -1,
            Status::ErrInvalidTransition => -2,
            Status::ErrPrecondition => -3,
        }
    }

    /// Namespace key under which the code is published to templates.
    pub fn namespace_key(self) -> &'static str {
        match self {
            Status::Ok => "status_ok",
            Status::ErrInvalidState => "status_invalid_state",
            Status::ErrInvalidTransition => "status_invalid_transition",
            Status::ErrPrecondition => "status_precondition",
        }
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Ok => "CFSM_OK",
            Status::ErrInvalidState => "CFSM_ERR_INVALID_STATE",
            Status::ErrInvalidTransition => "CFSM_ERR_INVALID_TRANSITION",
            Status::ErrPrecondition => "CFSM_ERR_PRECONDITION",
        })
    }
}

/// Relative order of the event-level and entry callbacks once all guards
/// pass. The exit callback of the current state always fires first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackOrder {
    /// exit, event, entry
    ExitEventEntry,
    /// exit, entry, event
    ExitEntryEvent,
}

impl CallbackOrder {
    pub const DEFAULT: CallbackOrder = CallbackOrder::ExitEventEntry;

    pub fn as_str(self) -> &'static str {
        match self {
            CallbackOrder::ExitEventEntry => "exit-event-entry",
            CallbackOrder::ExitEntryEvent => "exit-entry-event",
        }
    }

    pub fn event_first(self) -> bool {
        self == CallbackOrder::ExitEventEntry
    }
}

impl Default for CallbackOrder {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for CallbackOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallbackOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exit-event-entry" => Ok(CallbackOrder::ExitEventEntry),
            "exit-entry-event" => Ok(CallbackOrder::ExitEntryEvent),
            other => Err(format!(
                "unknown callback order '{other}', expected 'exit-event-entry' or 'exit-entry-event'"
            )),
        }
    }
}
