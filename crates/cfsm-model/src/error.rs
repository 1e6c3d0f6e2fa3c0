use cfsm_types::ErrorCode;
use thiserror::Error;

/// Rejections raised while building or finalizing a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("state '{0}' is already declared")]
    DuplicateState(String),

    #[error("event '{0}' is already declared")]
    DuplicateEvent(String),

    #[error("unknown state '{0}'")]
    UnknownState(String),

    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("duplicate transition '{from}' -> '{via}'")]
    DuplicateTransition { from: String, via: String },

    #[error("cannot mix event-driven and direct transitions ({0})")]
    MixedTransitions(String),

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("invalid value '{value}' for option '{key}'")]
    InvalidOptionValue { key: String, value: String },

    #[error("callbacks cannot be attached to transition '{from}' -> '{via}'")]
    UnsupportedHook { from: String, via: String },

    #[error("state '{0}' is already an initial state")]
    DuplicateInitial(String),

    #[error("no transition '{from}' -> '{via}' to attach '{hook}' to")]
    UnknownTransition {
        from: String,
        via: String,
        hook: String,
    },

    #[error("{kind} '{name}' clashes with the {existing} of the same name")]
    NameConflict {
        name: String,
        kind: &'static str,
        existing: &'static str,
    },

    #[error("'{0}' is used both as a precondition and as a callback")]
    HookKindConflict(String),

    #[error("{kind} name '{name}' is reserved in generated code")]
    ReservedName { name: String, kind: &'static str },

    #[error("no states declared")]
    NoStates,

    #[error("only one state declared; a machine needs at least two")]
    SingleState,

    #[error("no initial state declared")]
    NoInitialState,
}

impl ModelError {
    /// Stable diagnostic code of this error kind.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::DuplicateState(_) => ErrorCode::DUPLICATE_STATE,
            Self::DuplicateEvent(_) => ErrorCode::DUPLICATE_EVENT,
            Self::UnknownState(_) => ErrorCode::UNKNOWN_STATE,
            Self::UnknownEvent(_) => ErrorCode::UNKNOWN_EVENT,
            Self::DuplicateTransition { .. } => ErrorCode::DUPLICATE_TRANSITION,
            Self::MixedTransitions(_) => ErrorCode::MIXED_TRANSITIONS,
            Self::UnknownOption(_) => ErrorCode::UNKNOWN_OPTION,
            Self::InvalidOptionValue { .. } => ErrorCode::INVALID_OPTION_VALUE,
            Self::UnsupportedHook { .. } => ErrorCode::UNSUPPORTED_HOOK,
            Self::DuplicateInitial(_) => ErrorCode::DUPLICATE_INITIAL,
            Self::UnknownTransition { .. } => ErrorCode::UNKNOWN_TRANSITION,
            Self::NameConflict { .. } => ErrorCode::NAME_CONFLICT,
            Self::HookKindConflict(_) => ErrorCode::HOOK_KIND_CONFLICT,
            Self::ReservedName { .. } => ErrorCode::RESERVED_NAME,
            Self::NoStates => ErrorCode::NO_STATES,
            Self::SingleState => ErrorCode::SINGLE_STATE,
            Self::NoInitialState => ErrorCode::NO_INITIAL_STATE,
        }
    }

    /// A short hint for the diagnostic, where one helps.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::UnknownOption(_) => Some(format!(
                "valid options: {}",
                crate::config::option_keys().collect::<Vec<_>>().join(", ")
            )),
            Self::InvalidOptionValue { key, .. } if key == "callback_order" => {
                Some("use 'exit-event-entry' or 'exit-entry-event'".into())
            }
            Self::NoInitialState => {
                Some("mark a state with 'initial' or add an 'initial-state' line".into())
            }
            Self::InvalidOptionValue { key, .. } if crate::config::is_identifier_key(key) => {
                Some("the value must be a C identifier".into())
            }
            Self::InvalidOptionValue { .. } => {
                Some("quotes, backslashes, '*/' and control characters are not allowed".into())
            }
            Self::HookKindConflict(_) => {
                Some("guards return int and callbacks return void; give them distinct names".into())
            }
            Self::MixedTransitions(_) => {
                Some("use either 'on EVENT -> STATE' or 'next-state' throughout".into())
            }
            _ => None,
        }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
