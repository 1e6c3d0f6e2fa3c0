//! Generated-identifier configuration: defaults and option validation.

use cfsm_types::{CallbackOrder, Status, Variant};

use crate::error::{ModelError, ModelResult};

/// Every key an `option` line may set, with its built-in default.
pub const DEFAULTS: &[(&str, &str)] = &[
    ("header_name", "fsm.h"),
    ("header_guard", "_FSM_H"),
    ("state_enum", "fsm_state"),
    ("event_enum", "fsm_event"),
    ("fsm_struct", "fsm"),
    ("init_func", "fsm_init"),
    ("free_func", "fsm_free"),
    ("advance_func", "fsm_advance"),
    ("current_state_func", "fsm_current_state"),
    ("state_ntop_func", "fsm_state_ntop"),
    ("state_ntop_safe_func", "fsm_state_ntop_safe"),
    ("event_ntop_func", "fsm_event_ntop"),
    ("event_ntop_safe_func", "fsm_event_ntop_safe"),
    ("invalid_name", "[INVALID]"),
    ("callback_order", "exit-event-entry"),
];

/// Names the generated C already binds: parameters and locals of the
/// functions state, event and hook names are substituted into, the status
/// and hook-signature macros, the libc calls used, and C keywords.
const RESERVED: &[&str] = &[
    "current", "next", "ev", "ctx", "fsm", "fsmp", "initial_state",
    "HOOK_PARAMS", "HOOK_ARGS", "CFSM_OK", "CFSM_ERR_INVALID_STATE",
    "CFSM_ERR_INVALID_TRANSITION", "CFSM_ERR_PRECONDITION", "NULL", "calloc", "free",
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double",
    "else", "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long",
    "register", "restrict", "return", "short", "signed", "sizeof", "static", "struct",
    "switch", "typedef", "union", "unsigned", "void", "volatile", "while", "_Bool",
    "_Complex", "_Imaginary",
];

/// Options whose value becomes a C identifier in generated code.
const IDENTIFIER_KEYS: &[&str] = &[
    "header_guard",
    "state_enum",
    "event_enum",
    "fsm_struct",
    "init_func",
    "free_func",
    "advance_func",
    "current_state_func",
    "state_ntop_func",
    "state_ntop_safe_func",
    "event_ntop_func",
    "event_ntop_safe_func",
];

pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

pub fn is_identifier_key(key: &str) -> bool {
    IDENTIFIER_KEYS.contains(&key)
}

/// Identifier options naming functions and macros rather than enum or
/// struct tags, which live in their own C namespace.
pub fn ordinary_identifier_keys() -> impl Iterator<Item = &'static str> {
    IDENTIFIER_KEYS
        .iter()
        .copied()
        .filter(|key| !matches!(*key, "state_enum" | "event_enum" | "fsm_struct"))
}

fn is_c_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Text that is safe inside both a C string literal and a block comment.
fn is_literal_text(value: &str) -> bool {
    !value.contains("*/")
        && !value
            .chars()
            .any(|c| c == '"' || c == '\\' || c.is_control())
}

/// `path` made safe for a block comment: `*/` and line breaks are broken up.
pub fn comment_safe(path: &str) -> String {
    path.replace("*/", "*\\/")
        .chars()
        .map(|c| if c.is_control() { '?' } else { c })
        .collect()
}

pub fn option_keys() -> impl Iterator<Item = &'static str> {
    DEFAULTS.iter().map(|(key, _)| *key)
}

pub fn is_option_key(key: &str) -> bool {
    option_keys().any(|k| k == key)
}

/// Check `value` for `key`, returning the scalar to store.
pub fn validate(key: &str, value: &str) -> ModelResult<Variant> {
    if !is_option_key(key) {
        return Err(ModelError::UnknownOption(key.to_string()));
    }
    if key == "callback_order" {
        let order: CallbackOrder = value.parse().map_err(|_| ModelError::InvalidOptionValue {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        return Ok(Variant::from(order.as_str()));
    }
    let valid = if is_identifier_key(key) {
        is_c_identifier(value)
    } else {
        !value.is_empty() && is_literal_text(value)
    };
    if !valid {
        return Err(ModelError::InvalidOptionValue {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(Variant::from(value))
}

/// Status-code scalars, `status_ok` through `status_precondition`.
pub fn status_scalars() -> impl Iterator<Item = (&'static str, Variant)> {
    Status::ALL
        .iter()
        .map(|s| (s.namespace_key(), Variant::Int(s.code())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_keys_follow_defaults() {
        let keys: Vec<_> = option_keys().collect();
        assert_eq!(keys.len(), DEFAULTS.len());
        assert_eq!(keys[0], "header_name");
        assert!(is_option_key("callback_order"));
        assert!(!is_option_key("input_path"));
    }

    #[test]
    fn callback_order_is_normalised() {
        assert_eq!(
            validate("callback_order", "exit-entry-event"),
            Ok(Variant::from("exit-entry-event"))
        );
        assert!(matches!(
            validate("callback_order", "entry-first"),
            Err(ModelError::InvalidOptionValue { .. })
        ));
    }

    #[test]
    fn unknown_and_empty_options() {
        assert_eq!(
            validate("colour", "red"),
            Err(ModelError::UnknownOption("colour".into()))
        );
        assert!(validate("state_enum", "").is_err());
    }

    #[test]
    fn identifier_options_must_be_c_identifiers() {
        assert!(validate("advance_func", "door_advance").is_ok());
        assert!(validate("advance_func", "door advance").is_err());
        assert!(validate("header_guard", "9_H").is_err());
        assert!(validate("fsm_struct", "door-fsm").is_err());
    }

    #[test]
    fn text_options_cannot_break_out_of_literals() {
        assert!(validate("invalid_name", "<bad>").is_ok());
        assert!(validate("invalid_name", "a\"b").is_err());
        assert!(validate("invalid_name", "a\\b").is_err());
        assert!(validate("header_name", "door*/.h").is_err());
        assert!(validate("header_name", "door\n.h").is_err());
    }

    #[test]
    fn comment_safe_paths() {
        assert_eq!(comment_safe("dir/door.fsm"), "dir/door.fsm");
        assert_eq!(comment_safe("a*/b.fsm"), "a*\\/b.fsm");
        assert_eq!(comment_safe("a\nb"), "a?b");
    }

    #[test]
    fn reserved_names() {
        for name in ["current", "next", "ev", "ctx", "int", "CFSM_OK"] {
            assert!(is_reserved(name), "{name}");
        }
        assert!(!is_reserved("OPEN"));
    }
}
